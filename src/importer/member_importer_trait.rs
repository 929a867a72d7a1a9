// ==========================================
// 会众管理系统 - 会员导入 Trait
// ==========================================
// 职责: 定义会员导入接口（不包含实现）
// ==========================================

use crate::domain::{ImportRow, ImportSummary};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// MemberImporter Trait
// ==========================================
// 用途: 会员导入主接口
// 实现者: MemberImporterImpl
#[async_trait]
pub trait MemberImporter: Send + Sync {
    /// 从文件导入会员数据（按扩展名选择解析器）
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入结果（行级失败已包含在 errors 中）
    /// - Err: 运行级错误（文件不可读、家庭缓存加载失败等）；读取中途失败时已处理的分块保留
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 加载家庭缓存
    /// 3. 逐行: 校验 → 查找已有会员 → 解析家庭 → 新建/更新
    /// 4. 汇总结果 + 批次台账落库
    async fn import_from_file(&self, file_path: &Path) -> ImportResult<ImportSummary>;

    /// 导入已解码的行（调用方自行完成解析）
    async fn import_rows(&self, rows: Vec<ImportRow>) -> ImportResult<ImportSummary>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, JsonParser, UniversalFileParser

/// 按文件顺序逐行产出的行流
pub type RowStream = Box<dyn Iterator<Item = ImportResult<ImportRow>> + Send>;

pub trait FileParser: Send + Sync {
    /// 打开文件并返回惰性行流（表头定义列名，完全空白的行被跳过）
    ///
    /// # 返回
    /// - Ok(RowStream): row_number 为原文件行号（表头 = 1）
    /// - Err: 文件不存在、格式不支持、表头不可读
    ///
    /// 行流中的 Err 表示读取中途失败（如 I/O 错误）
    fn open_rows(&self, file_path: &Path) -> ImportResult<RowStream>;

    /// 一次性读取全部行
    fn parse_to_rows(&self, file_path: &Path) -> ImportResult<Vec<ImportRow>> {
        self.open_rows(file_path)?.collect()
    }
}
