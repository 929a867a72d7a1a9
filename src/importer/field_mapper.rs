// ==========================================
// 会众管理系统 - 字段映射器
// ==========================================
// 职责: 输入列 → MemberAttributes（校验 + 归一 + 自定义字段收集）
// family_id 不在此处解析，由行处理器在校验通过后经家庭缓存填入
// ==========================================

use crate::domain::{
    CustomFields, Gender, ImportRow, JourneyStage, MemberAttributes, MembershipStatus,
};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::RowError;
use crate::importer::row_validator::RowValidator;
use chrono::NaiveDate;

// ==========================================
// 列名常量（区分大小写）
// ==========================================
pub mod columns {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const GENDER: &str = "gender";
    pub const DATE_OF_BIRTH: &str = "date_of_birth";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const POSTAL_CODE: &str = "postal_code";
    pub const COUNTRY: &str = "country";
    pub const MEMBERSHIP_STATUS: &str = "membership_status";
    pub const MEMBERSHIP_DATE: &str = "membership_date";
    pub const JOURNEY_STAGE: &str = "journey_stage";
    pub const FAMILY_NAME: &str = "family_name";

    /// 自定义字段列前缀
    pub const CUSTOM_PREFIX: &str = "custom_";

    /// 识别的标准列（模板表头顺序）
    pub const STANDARD: &[&str] = &[
        FIRST_NAME,
        LAST_NAME,
        EMAIL,
        PHONE,
        GENDER,
        DATE_OF_BIRTH,
        ADDRESS,
        CITY,
        STATE,
        POSTAL_CODE,
        COUNTRY,
        MEMBERSHIP_STATUS,
        MEMBERSHIP_DATE,
        JOURNEY_STAGE,
        FAMILY_NAME,
    ];
}

pub struct FieldMapper {
    cleaner: DataCleaner,
    validator: RowValidator,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
            validator: RowValidator,
        }
    }

    /// 将输入行映射为会员属性集
    ///
    /// # 返回
    /// - Ok(MemberAttributes): family_id 恒为 None
    /// - Err(RowError): 第一个未通过的校验
    pub fn map_row(&self, row: &ImportRow) -> Result<MemberAttributes, RowError> {
        if let Some(column) = row.decode_error() {
            return Err(RowError::Encoding {
                column: column.to_string(),
            });
        }

        let first_name = self.validator.require(row, columns::FIRST_NAME)?.to_string();
        let last_name = self.validator.require(row, columns::LAST_NAME)?.to_string();

        let email = self.optional_text(row, columns::EMAIL);
        if let Some(value) = &email {
            self.validator.validate_email(columns::EMAIL, value)?;
        }

        let gender = self
            .optional_lowercase(row, columns::GENDER)
            .map(|v| self.validator.parse_choice::<Gender>(columns::GENDER, &v))
            .transpose()?;

        let membership_status = self
            .optional_lowercase(row, columns::MEMBERSHIP_STATUS)
            .map(|v| {
                self.validator
                    .parse_choice::<MembershipStatus>(columns::MEMBERSHIP_STATUS, &v)
            })
            .transpose()?
            .unwrap_or_default();

        let journey_stage = self
            .optional_lowercase(row, columns::JOURNEY_STAGE)
            .map(|v| {
                self.validator
                    .parse_choice::<JourneyStage>(columns::JOURNEY_STAGE, &v)
            })
            .transpose()?
            .unwrap_or_default();

        let date_of_birth = self.optional_date(row, columns::DATE_OF_BIRTH)?;
        let membership_date = self.optional_date(row, columns::MEMBERSHIP_DATE)?;

        Ok(MemberAttributes {
            first_name,
            last_name,
            email,
            phone: self.optional_text(row, columns::PHONE),
            gender,
            date_of_birth,
            address: self.optional_text(row, columns::ADDRESS),
            city: self.optional_text(row, columns::CITY),
            state: self.optional_text(row, columns::STATE),
            postal_code: self.optional_text(row, columns::POSTAL_CODE),
            country: self.optional_text(row, columns::COUNTRY),
            membership_status,
            membership_date,
            journey_stage,
            family_id: None,
            custom_fields: self.collect_custom_fields(row),
        })
    }

    /// 收集 `custom_*` 列（去前缀，跳过空白值）；无任何值时返回 None
    pub fn collect_custom_fields(&self, row: &ImportRow) -> Option<CustomFields> {
        let fields: CustomFields = row
            .with_prefix(columns::CUSTOM_PREFIX)
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(key, value)| {
                self.cleaner
                    .normalize_null(Some(value))
                    .map(|v| (key.to_string(), v))
            })
            .collect();

        if fields.is_empty() {
            None
        } else {
            Some(fields)
        }
    }

    fn optional_text(&self, row: &ImportRow, column: &str) -> Option<String> {
        self.cleaner.normalize_null(row.get(column))
    }

    fn optional_lowercase(&self, row: &ImportRow, column: &str) -> Option<String> {
        self.optional_text(row, column)
            .map(|v| self.cleaner.clean_text(&v, true))
    }

    fn optional_date(
        &self,
        row: &ImportRow,
        column: &'static str,
    ) -> Result<Option<NaiveDate>, RowError> {
        match self.optional_text(row, column) {
            None => Ok(None),
            Some(value) => self
                .cleaner
                .parse_date(&value)
                .map(Some)
                .ok_or(RowError::InvalidDate {
                    field: column,
                    value,
                }),
        }
    }
}
