// ==========================================
// 会员导入 API
// ==========================================
// 职责: 封装会员导入相关功能（导入 / 批次历史 / 模板表头）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::{ImportBatch, ImportSummary};
use crate::importer::{columns, MemberImporter, MemberImporterImpl};
use crate::repository::{MemberImportRepository, MemberImportRepositoryImpl};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 批次历史单次查询上限
pub const MAX_BATCH_HISTORY_LIMIT: usize = 1_000;

/// 会员导入 API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的 ImportApi 实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 导入会员数据
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv / 电子表格 / .json）
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入结果（行级失败在 errors 中）
    /// - Err(ApiError): 运行级失败（文件不可读、数据库不可用等）
    pub async fn import_members(&self, file_path: &str) -> ApiResult<ImportSummary> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let importer = self.create_importer()?;
        let summary = importer.import_from_file(Path::new(file_path)).await?;

        info!(
            file_path = %file_path,
            total = summary.total,
            succeeded = summary.succeeded(),
            failed = summary.failed,
            "导入请求完成"
        );
        Ok(summary)
    }

    /// 查询最近的导入批次
    ///
    /// # 参数
    /// - limit: 返回条数；None 时使用配置 import/batch_history_limit
    pub async fn list_recent_batches(&self, limit: Option<usize>) -> ApiResult<Vec<ImportBatch>> {
        let conn = self.open_connection()?;
        let repo = MemberImportRepositoryImpl::from_connection(conn.clone());

        let limit = match limit {
            Some(0) => {
                return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
            }
            Some(n) => n,
            None => ConfigManager::from_connection(conn)?
                .get_batch_history_limit()
                .await?,
        };

        Ok(repo
            .get_recent_batches(limit.min(MAX_BATCH_HISTORY_LIMIT))
            .await?)
    }

    /// 导入模板识别的标准列
    pub fn template_columns() -> &'static [&'static str] {
        columns::STANDARD
    }

    /// 导入模板表头（CSV 行）
    pub fn template_csv() -> ApiResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(Self::template_columns())
            .map_err(|e| ApiError::InternalError(format!("模板生成失败: {}", e)))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| ApiError::InternalError(format!("模板生成失败: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| ApiError::InternalError(e.to_string()))
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn open_connection(&self) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    /// 创建导入器（仓储与配置共享同一连接）
    fn create_importer(
        &self,
    ) -> ApiResult<MemberImporterImpl<MemberImportRepositoryImpl, ConfigManager>> {
        let conn = self.open_connection()?;
        let import_repo = MemberImportRepositoryImpl::from_connection(conn.clone());
        let config = ConfigManager::from_connection(conn)?;
        Ok(MemberImporterImpl::new(import_repo, config))
    }
}
