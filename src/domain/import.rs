// ==========================================
// 会众管理系统 - 导入领域模型
// ==========================================
// ImportRow: 导入管道中间产物（仅在一次运行内存活）
// ImportSummary: 一次运行的唯一返回值
// ImportBatch: 运行结束后落库的批次台账
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 表头所在行号（数据行从 2 开始）
pub const HEADER_ROW_NUMBER: usize = 1;

// ==========================================
// ImportRow - 原始输入行
// ==========================================
// 列顺序与源文件一致；列名区分大小写
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub row_number: usize, // 原始文件行号（表头 = 1）
    fields: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decode_error: Option<String>, // 首个无法解码的列名
}

impl ImportRow {
    pub fn new(row_number: usize, fields: Vec<(String, String)>) -> Self {
        Self {
            row_number,
            fields,
            decode_error: None,
        }
    }

    /// 标记该行含无法按 UTF-8 解码的单元格（值已按有损方式保留）
    pub fn with_decode_error(mut self, column: impl Into<String>) -> Self {
        self.decode_error = Some(column.into());
        self
    }

    pub fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }

    /// 按数据行序号（0 起）构造，行号自动加上表头偏移
    pub fn from_data_index(index: usize, fields: Vec<(String, String)>) -> Self {
        Self::new(index + HEADER_ROW_NUMBER + 1, fields)
    }

    /// 原始值（未裁剪）；重复列名取第一列
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// 裁剪后的非空值
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    /// 按前缀筛选列（保持列顺序），返回 (去前缀列名, 原始值)
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.fields.iter().filter_map(move |(name, value)| {
            name.strip_prefix(prefix)
                .map(|stripped| (stripped, value.as_str()))
        })
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// 所有值均为空白
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }
}

// ==========================================
// RowFailure - 行级失败记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize,
    pub error: String,
}

// ==========================================
// ImportSummary - 导入结果
// ==========================================
// 不变式: created + updated + failed == total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<RowFailure>,
}

impl ImportSummary {
    pub fn succeeded(&self) -> usize {
        self.created + self.updated
    }
}

// ==========================================
// MemberOutcome - 单行处理结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberOutcome {
    Created { member_id: i64 },
    Updated { member_id: i64 },
}

// ==========================================
// ImportBatch - 导入批次台账
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,             // 批次 ID（UUID）
    pub file_name: Option<String>,    // 源文件名
    pub file_path: Option<String>,    // 源文件路径
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors_json: String,          // 行级失败明细 JSON
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}
