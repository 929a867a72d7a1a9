// ==========================================
// 会众管理系统 - 数据库路径解析
// ==========================================

use std::path::PathBuf;

/// 显式指定 DB 路径的环境变量
pub const DB_PATH_ENV: &str = "CONGREGATION_IMPORT_DB_PATH";

/// 获取默认数据库路径
///
/// 优先级:
/// 1. 环境变量 CONGREGATION_IMPORT_DB_PATH（非空）
/// 2. 用户数据目录/congregation-import/congregation.db
/// 3. ./congregation.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./congregation.db");

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("congregation-import");
        match std::fs::create_dir_all(&app_dir) {
            Ok(()) => path = app_dir.join("congregation.db"),
            Err(e) => {
                tracing::warn!(dir = %app_dir.display(), error = %e, "无法创建数据目录，回退到当前目录");
            }
        }
    }

    path.to_string_lossy().to_string()
}
