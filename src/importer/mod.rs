// ==========================================
// 会众管理系统 - 导入层
// ==========================================
// 职责: 表格数据批量导入会员，按家庭名归并家庭
// 支持: CSV, 电子表格, JSON
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod family_cache;
pub mod field_mapper;
pub mod file_parser;
pub mod import_summary;
pub mod member_importer_impl;
pub mod member_importer_trait;
pub mod row_validator;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult, RowError};
pub use family_cache::FamilyCache;
pub use field_mapper::{columns, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, JsonParser, UniversalFileParser};
pub use import_summary::ImportAccumulator;
pub use member_importer_impl::MemberImporterImpl;
pub use row_validator::RowValidator;

// 重导出 Trait 接口
pub use member_importer_trait::{FileParser, MemberImporter, RowStream};
