// ==========================================
// 导入 API 端到端测试
// ==========================================
// 模拟宿主服务调用 API 的完整流程

mod test_helpers;

use congregation_import::api::{ApiError, ImportApi};
use congregation_import::config::{config_keys, ConfigManager};
use tempfile::TempDir;
use test_helpers::{create_test_db, write_import_file, SAMPLE_CSV};

#[tokio::test]
async fn test_import_api_full_flow() {
    let (_db_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let dir = TempDir::new().unwrap();
    let csv_path = write_import_file(&dir, "members.csv", SAMPLE_CSV);

    let api = ImportApi::new(db_path.clone());
    let summary = api
        .import_members(csv_path.to_str().unwrap())
        .await
        .expect("导入失败");

    assert_eq!(summary.total, 4);
    assert_eq!(summary.created, 3);
    assert_eq!(summary.failed, 1);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["errors"][0]["row"], 4);
    assert_eq!(json["errors"][0]["error"], "last_name is required");

    let batches = api.list_recent_batches(None).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].total, 4);
}

#[tokio::test]
async fn test_history_newest_first_and_limited() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let first = write_import_file(&dir, "first.csv", "first_name,last_name\nA,B\n");
    let second = write_import_file(&dir, "second.csv", "first_name,last_name\nC,D\nE,F\n");

    let api = ImportApi::new(db_path.clone());
    api.import_members(first.to_str().unwrap()).await.unwrap();
    api.import_members(second.to_str().unwrap()).await.unwrap();

    let batches = api.list_recent_batches(Some(10)).await.unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].file_name.as_deref(), Some("second.csv"));
    assert_eq!(batches[1].file_name.as_deref(), Some("first.csv"));

    let limited = api.list_recent_batches(Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].total, 2);
}

#[tokio::test]
async fn test_history_default_limit_from_config() {
    let (_db_file, db_path) = create_test_db().unwrap();
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::IMPORT_BATCH_HISTORY_LIMIT, "1")
        .unwrap();

    let dir = TempDir::new().unwrap();
    let file = write_import_file(&dir, "members.csv", "first_name,last_name\nA,B\n");

    let api = ImportApi::new(db_path);
    api.import_members(file.to_str().unwrap()).await.unwrap();
    api.import_members(file.to_str().unwrap()).await.unwrap();

    assert_eq!(api.list_recent_batches(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_file_maps_to_not_found() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let result = api.import_members("/nonexistent/members.csv").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let result = api.import_members("/nonexistent/members.txt").await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_template_columns() {
    let columns = ImportApi::template_columns();
    assert_eq!(columns.first(), Some(&"first_name"));
    assert!(columns.contains(&"family_name"));
    assert!(!columns.iter().any(|c| c.starts_with("custom_")));
}
