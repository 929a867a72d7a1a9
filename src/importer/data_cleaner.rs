// ==========================================
// 会众管理系统 - 数据清洗器
// ==========================================
// 职责: TRIM / 大小写归一 / NULL 标准化 / 电子表格日期换算
// ==========================================

use chrono::{Days, NaiveDate, NaiveDateTime};

/// 电子表格序列号上限（9999-12-31）
const MAX_SPREADSHEET_SERIAL: f64 = 2_958_465.0;

/// 1900 日期系统中虚构的 1900-02-29 对应的序列号
const FICTITIOUS_LEAP_DAY_SERIAL: f64 = 60.0;

const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM，可选转小写）
    pub fn clean_text(&self, value: &str, lowercase: bool) -> String {
        let trimmed = value.trim();
        if lowercase {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    }

    /// 标准化 NULL 值（空字符串/空白 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 解析日期（电子表格序列号 / 文本日期 / ISO 日期时间）
    ///
    /// # 返回
    /// - Some(NaiveDate): 解析成功
    /// - None: 无法识别
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        // 8 位纯数字优先按 YYYYMMDD 解释（作为序列号会落在 9999 年之后）
        let all_digits = value.bytes().all(|b| b.is_ascii_digit());
        if all_digits && value.len() == 8 {
            return NaiveDate::parse_from_str(value, "%Y%m%d").ok();
        }

        if let Ok(serial) = value.parse::<f64>() {
            return self.spreadsheet_serial_to_date(serial);
        }

        TEXT_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
            .or_else(|| {
                TEXT_DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                    .map(|dt| dt.date())
            })
            .or_else(|| {
                chrono::DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }

    /// 电子表格序列号 → 日历日期（1900 日期系统，小数部分为时间，忽略）
    ///
    /// 序列号 1 = 1900-01-01；1900 日期系统把 1900 年当作闰年，
    /// 60 之前以 1899-12-31 为基准，之后以 1899-12-30 为基准
    pub fn spreadsheet_serial_to_date(&self, serial: f64) -> Option<NaiveDate> {
        if !serial.is_finite() || serial < 1.0 || serial > MAX_SPREADSHEET_SERIAL {
            return None;
        }

        let days = serial.floor();
        let base = if days < FICTITIOUS_LEAP_DAY_SERIAL {
            NaiveDate::from_ymd_opt(1899, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(1899, 12, 30)?
        };

        base.checked_add_days(Days::new(days as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  ")), None);
        assert_eq!(cleaner.normalize_null(None), None);
        assert_eq!(cleaner.normalize_null(Some(" x ")), Some("x".to_string()));
    }

    #[test]
    fn test_clean_text_lowercase() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  Female ", true), "female");
        assert_eq!(cleaner.clean_text("  Doe ", false), "Doe");
    }

    #[test]
    fn test_spreadsheet_serial() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_date("1"), ymd(1900, 1, 1));
        assert_eq!(cleaner.parse_date("59"), ymd(1900, 2, 28));
        assert_eq!(cleaner.parse_date("61"), ymd(1900, 3, 1));
        assert_eq!(cleaner.parse_date("32874"), ymd(1990, 1, 1));
        assert_eq!(cleaner.parse_date("45306"), ymd(2024, 1, 15));
        // 小数部分是时间
        assert_eq!(cleaner.parse_date("45306.75"), ymd(2024, 1, 15));
    }

    #[test]
    fn test_spreadsheet_serial_out_of_range() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_date("0"), None);
        assert_eq!(cleaner.parse_date("-5"), None);
        assert_eq!(cleaner.parse_date("3000000"), None);
    }

    #[test]
    fn test_text_dates() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_date("1990-05-17"), ymd(1990, 5, 17));
        assert_eq!(cleaner.parse_date("1990/05/17"), ymd(1990, 5, 17));
        assert_eq!(cleaner.parse_date("05/17/1990"), ymd(1990, 5, 17));
        assert_eq!(cleaner.parse_date("19900517"), ymd(1990, 5, 17));
        assert_eq!(cleaner.parse_date("2024-01-15T10:30:00"), ymd(2024, 1, 15));
        assert_eq!(cleaner.parse_date("2024-01-15 10:30:00"), ymd(2024, 1, 15));
        assert_eq!(cleaner.parse_date("2024-01-15T10:30:00+02:00"), ymd(2024, 1, 15));
    }

    #[test]
    fn test_unparseable_dates() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_date("not a date"), None);
        assert_eq!(cleaner.parse_date("1990-13-01"), None);
        assert_eq!(cleaner.parse_date(""), None);
    }
}
