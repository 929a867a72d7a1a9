// ==========================================
// 会众管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取分块大小（行）
    ///
    /// # 默认值
    /// - 500
    ///
    /// # 说明
    /// - 仅用于资源管理，不影响逐行语义与结果顺序
    async fn get_chunk_size(&self) -> RepositoryResult<usize>;

    /// 获取批次历史默认返回条数
    ///
    /// # 默认值
    /// - 20
    async fn get_batch_history_limit(&self) -> RepositoryResult<usize>;
}
