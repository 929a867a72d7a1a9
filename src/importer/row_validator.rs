// ==========================================
// 会众管理系统 - 行级校验器
// ==========================================
// 校验失败即拒绝该行（记为 failed），不向调用方抛出
// 校验顺序: first_name → last_name → email → gender → membership_status → journey_stage
// ==========================================

use crate::domain::{ImportRow, UnknownVariant};
use crate::importer::error::RowError;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

/// 邮箱语法校验正则（local@domain.tld）
fn get_email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("Invalid email regex")
    })
}

pub struct RowValidator;

impl RowValidator {
    /// 必填字段（非空白）
    pub fn require<'a>(&self, row: &'a ImportRow, field: &'static str) -> Result<&'a str, RowError> {
        row.value(field).ok_or(RowError::Required { field })
    }

    /// 邮箱语法校验
    pub fn is_valid_email(&self, value: &str) -> bool {
        let local_part_ok = value
            .split('@')
            .next()
            .map(|local| !local.starts_with('.') && !local.ends_with('.') && !local.contains(".."))
            .unwrap_or(false);
        local_part_ok && get_email_regex().is_match(value)
    }

    /// 可选邮箱字段
    pub fn validate_email(&self, field: &'static str, value: &str) -> Result<(), RowError> {
        if self.is_valid_email(value) {
            Ok(())
        } else {
            Err(RowError::InvalidEmail {
                field,
                value: value.to_string(),
            })
        }
    }

    /// 可选枚举字段（大小写不敏感）
    pub fn parse_choice<T>(&self, field: &'static str, value: &str) -> Result<T, RowError>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        value.parse::<T>().map_err(|e| RowError::InvalidChoice {
            field,
            value: e.value,
            allowed: e.allowed.join(", "),
        })
    }
}
