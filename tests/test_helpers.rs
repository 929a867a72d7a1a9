// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、导入文件生成等功能
// ==========================================

#![allow(dead_code)]

use congregation_import::config::ConfigManager;
use congregation_import::db::{init_schema, open_sqlite_connection};
use congregation_import::importer::MemberImporterImpl;
use congregation_import::repository::MemberImportRepositoryImpl;
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库共享连接
pub fn open_shared(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 基于测试数据库构造导入器（仓储与配置共享连接）
pub fn create_importer(
    db_path: &str,
) -> Result<MemberImporterImpl<MemberImportRepositoryImpl, ConfigManager>, Box<dyn Error>> {
    let conn = open_shared(db_path)?;
    let repo = MemberImportRepositoryImpl::from_connection(conn.clone());
    let config = ConfigManager::from_connection(conn)?;
    Ok(MemberImporterImpl::new(repo, config))
}

/// 在临时目录中写入导入文件
///
/// # 返回
/// - PathBuf: 文件路径（TempDir 需要保持存活）
pub fn write_import_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("创建导入文件失败");
    file.write_all(content.as_bytes()).expect("写入导入文件失败");
    path
}

/// 在临时目录中写入原始字节（用于非 UTF-8 内容）
pub fn write_import_bytes(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("写入导入文件失败");
    path
}

/// 仓库内置的测试文件
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// 标准测试 CSV（含一行缺少 last_name）
pub const SAMPLE_CSV: &str = "\
first_name,last_name,email,gender,membership_status,journey_stage,family_name,custom_ministry
Jane,Doe,jane@x.com,Female,ACTIVE,Leader,Doe Family,Youth
John,Doe,john@x.com,male,,,doe family,
Bad,,,,,,,
Maria,Garcia,maria@x.com,female,pending,regular,Garcia,Worship
";
