// ==========================================
// 会众管理系统 - 会员/家庭领域模型
// ==========================================
// 会员身份键: email（存在时精确匹配，区分大小写）
// 家庭名称: 导入时按小写比较去重
// ==========================================

use crate::domain::types::{FamilyStatus, Gender, JourneyStage, MembershipStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 自定义字段（key 已去掉 `custom_` 前缀）
pub type CustomFields = BTreeMap<String, String>;

// ==========================================
// Member - 会员
// ==========================================
// 对齐: members 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,

    // ===== 姓名 =====
    pub first_name: String,
    pub last_name: String,

    // ===== 联系方式 =====
    pub email: Option<String>,
    pub phone: Option<String>,

    // ===== 个人信息 =====
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,

    // ===== 地址 =====
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,

    // ===== 会籍 =====
    pub membership_status: MembershipStatus,
    pub membership_date: Option<NaiveDate>,
    pub journey_stage: JourneyStage,

    // ===== 关联 =====
    pub family_id: Option<i64>,
    pub custom_fields: Option<CustomFields>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// MemberAttributes - 会员写入属性集
// ==========================================
// 用途: 导入管道产出，仓储层 create/update 的入参
// custom_fields 为 None 时更新不触碰已有自定义字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberAttributes {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub membership_status: MembershipStatus,
    pub membership_date: Option<NaiveDate>,
    pub journey_stage: JourneyStage,
    pub family_id: Option<i64>,
    pub custom_fields: Option<CustomFields>,
}

// ==========================================
// Family - 家庭
// ==========================================
// 对齐: families 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: i64,
    pub name: String,
    pub status: FamilyStatus,
    pub created_at: DateTime<Utc>,
}

/// 新建家庭入参
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFamily {
    pub name: String,
    pub status: FamilyStatus,
}

impl Member {
    /// 全名（first + last）
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
