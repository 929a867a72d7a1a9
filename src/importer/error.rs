// ==========================================
// 会众管理系统 - 导入模块错误类型
// ==========================================
// 两级错误:
// - ImportError: 运行级（致命），整次导入中止；读取中途出错时已提交的分块不回滚
// - RowError: 行级，计入 failed 并继续处理后续行
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型（运行级）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls/.ods/.json）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 运行准备错误 =====
    #[error("家庭缓存加载失败: {0}")]
    FamilyCacheLoad(#[source] RepositoryError),

    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// RowError - 行级错误
// ==========================================
// Display 文本即写入结果 errors[].error 的内容
#[derive(Error, Debug)]
pub enum RowError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be a valid email address")]
    InvalidEmail { field: &'static str, value: String },

    #[error("{field} must be one of: {allowed}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("{field} is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("{column} is not valid UTF-8 text")]
    Encoding { column: String },

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}
