// ==========================================
// 会众管理系统 - 领域类型定义
// ==========================================
// 会员性别 / 会籍状态 / 信仰历程阶段 / 家庭状态
// 输入大小写不敏感，存储统一为小写
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 枚举解析失败（携带允许值列表，供行级错误提示）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub value: String,
    pub allowed: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not one of: {}", self.value, self.allowed.join(", "))
    }
}

impl std::error::Error for UnknownVariant {}

// 为小写枚举生成 as_str / Display / FromStr
macro_rules! lowercase_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// 允许的取值（小写）
            pub const ALLOWED: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        value: s.to_string(),
                        allowed: Self::ALLOWED,
                    }),
                }
            }
        }
    };
}

// ==========================================
// 性别 (Gender)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

lowercase_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

// ==========================================
// 会籍状态 (Membership Status)
// ==========================================
// 缺省值: pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Inactive,
    #[default]
    Pending,
    Transferred,
}

lowercase_enum!(MembershipStatus {
    Active => "active",
    Inactive => "inactive",
    Pending => "pending",
    Transferred => "transferred",
});

// ==========================================
// 信仰历程阶段 (Journey Stage)
// ==========================================
// 缺省值: visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JourneyStage {
    #[default]
    Visitor,
    Regular,
    Committed,
    Leader,
}

lowercase_enum!(JourneyStage {
    Visitor => "visitor",
    Regular => "regular",
    Committed => "committed",
    Leader => "leader",
});

// ==========================================
// 家庭状态 (Family Status)
// ==========================================
// 导入器隐式创建的家庭一律为 active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyStatus {
    #[default]
    Active,
    Inactive,
}

lowercase_enum!(FamilyStatus {
    Active => "active",
    Inactive => "inactive",
});
