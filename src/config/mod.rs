// ==========================================
// 会众管理系统 - 配置层
// ==========================================
// 职责: 导入配置管理（config_kv 表）与数据库路径解析
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod paths;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_BATCH_HISTORY_LIMIT, DEFAULT_CHUNK_SIZE};
pub use import_config_trait::ImportConfigReader;
pub use paths::{get_default_db_path, DB_PATH_ENV};
