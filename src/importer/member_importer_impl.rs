// ==========================================
// 会众管理系统 - 会员导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 加载家庭缓存 → 逐行(校验 → 查找 → 解析家庭 → 新建/更新) → 汇总 → 批次台账
// 约束: 逐行严格按输入顺序串行处理；单行失败不影响其他行，不回滚已提交的行
// ==========================================

use crate::config::{config_keys, ImportConfigReader};
use crate::domain::{ImportBatch, ImportRow, ImportSummary, MemberOutcome};
use crate::importer::error::{ImportError, ImportResult, RowError};
use crate::importer::family_cache::FamilyCache;
use crate::importer::field_mapper::{columns, FieldMapper};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::import_summary::ImportAccumulator;
use crate::importer::member_importer_trait::{FileParser, MemberImporter};
use crate::repository::MemberImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// MemberImporterImpl - 会员导入器实现
// ==========================================
pub struct MemberImporterImpl<R, C>
where
    R: MemberImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: FieldMapper,
}

impl<R, C> MemberImporterImpl<R, C>
where
    R: MemberImportRepository,
    C: ImportConfigReader,
{
    /// 创建导入器（按扩展名自动选择解析器）
    pub fn new(import_repo: R, config: C) -> Self {
        Self::with_parser(import_repo, config, Box::new(UniversalFileParser))
    }

    /// 创建导入器并指定文件解析器
    pub fn with_parser(import_repo: R, config: C, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            import_repo,
            config,
            file_parser,
            field_mapper: FieldMapper::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.import_repo
    }

    /// 处理单行
    ///
    /// 校验在任何存储调用之前完成，被拒绝的行不会新建家庭
    async fn process_row(
        &self,
        row: &ImportRow,
        families: &mut FamilyCache<'_, R>,
    ) -> Result<MemberOutcome, RowError> {
        let mut attrs = self.field_mapper.map_row(row)?;

        let existing = match attrs.email.as_deref() {
            Some(email) => self.import_repo.find_member_by_email(email).await?,
            None => None,
        };

        if let Some(family_name) = row.value(columns::FAMILY_NAME) {
            attrs.family_id = Some(families.resolve(family_name).await?);
        }

        match existing {
            Some(member) => {
                let updated = self.import_repo.update_member(member.id, &attrs).await?;
                debug!(
                    row_number = row.row_number,
                    member_id = updated.id,
                    name = %updated.full_name(),
                    "更新会员"
                );
                Ok(MemberOutcome::Updated {
                    member_id: updated.id,
                })
            }
            None => {
                let created = self.import_repo.create_member(&attrs).await?;
                debug!(
                    row_number = row.row_number,
                    member_id = created.id,
                    name = %created.full_name(),
                    "新建会员"
                );
                Ok(MemberOutcome::Created {
                    member_id: created.id,
                })
            }
        }
    }

    /// 执行一次导入运行
    ///
    /// 行流按 chunk_size 分块拉取，内存中最多保留一个分块；
    /// 行流中途报错时整次运行失败，已处理的分块不回滚
    async fn run<I>(&self, mut rows: I, source: Option<&Path>) -> ImportResult<ImportSummary>
    where
        I: Iterator<Item = ImportResult<ImportRow>> + Send,
    {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(batch_id = %batch_id, "开始导入会员数据");

        // === 步骤 1: 读取配置 ===
        let chunk_size = self
            .config
            .get_chunk_size()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: config_keys::IMPORT_CHUNK_SIZE.to_string(),
                message: e.to_string(),
            })?
            .max(1);

        // === 步骤 2: 加载家庭缓存（每次运行一个实例） ===
        let mut families = FamilyCache::load(&self.import_repo).await.map_err(|e| {
            error!(error = %e, "家庭缓存加载失败");
            ImportError::FamilyCacheLoad(e)
        })?;

        // === 步骤 3: 分块拉取并逐行处理 ===
        let mut acc = ImportAccumulator::new();
        let mut chunk: Vec<ImportRow> = Vec::new();
        let mut chunk_idx = 0usize;
        loop {
            chunk.clear();
            for next in rows.by_ref().take(chunk_size) {
                let row = next.map_err(|e| {
                    error!(error = %e, processed = acc.total(), "读取输入中断");
                    e
                })?;
                chunk.push(row);
            }
            if chunk.is_empty() {
                break;
            }

            chunk_idx += 1;
            debug!(chunk = chunk_idx, rows = chunk.len(), "处理分块");

            for row in &chunk {
                let result = self.process_row(row, &mut families).await;
                if let Err(e) = &result {
                    warn!(row_number = row.row_number, error = %e, "行导入失败");
                }
                acc.record(row.row_number, result);
            }
        }
        let summary = acc.finish();

        // === 步骤 4: 批次台账 ===
        let elapsed_ms = start_time.elapsed().as_millis() as i64;
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            file_name: source
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            file_path: source.map(|p| p.display().to_string()),
            total: summary.total,
            created: summary.created,
            updated: summary.updated,
            failed: summary.failed,
            errors_json: serde_json::to_string(&summary.errors)
                .unwrap_or_else(|_| "[]".to_string()),
            imported_at: Utc::now(),
            elapsed_ms,
        };
        if let Err(e) = self.import_repo.insert_batch(&batch).await {
            // 台账写入失败不影响已完成的导入结果
            warn!(batch_id = %batch_id, error = %e, "批次台账写入失败");
        }

        info!(
            batch_id = %batch_id,
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            families_created = families.created_count(),
            elapsed_ms = elapsed_ms,
            "会员导入完成"
        );

        Ok(summary)
    }
}

#[async_trait]
impl<R, C> MemberImporter for MemberImporterImpl<R, C>
where
    R: MemberImportRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_from_file(&self, file_path: &Path) -> ImportResult<ImportSummary> {
        debug!(file_path = %file_path.display(), "打开文件");
        let rows = self.file_parser.open_rows(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;

        self.run(rows, Some(file_path)).await
    }

    #[instrument(skip(self, rows), fields(batch_id))]
    async fn import_rows(&self, rows: Vec<ImportRow>) -> ImportResult<ImportSummary> {
        self.run(rows.into_iter().map(Ok::<_, ImportError>), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::domain::{
        Family, FamilyStatus, JourneyStage, Member, MemberAttributes, MembershipStatus, NewFamily,
    };
    use crate::repository::{
        MemberImportRepositoryImpl, RepositoryError, RepositoryResult,
    };
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn shared_conn() -> Arc<Mutex<Connection>> {
        let conn = crate::db::open_sqlite_connection(":memory:").unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn importer() -> MemberImporterImpl<MemberImportRepositoryImpl, ConfigManager> {
        let conn = shared_conn();
        MemberImporterImpl::new(
            MemberImportRepositoryImpl::from_connection(conn.clone()),
            ConfigManager::from_connection(conn).unwrap(),
        )
    }

    fn row(index: usize, fields: &[(&str, &str)]) -> ImportRow {
        ImportRow::from_data_index(
            index,
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_jane_and_bad_row() {
        let importer = importer();
        let rows = vec![
            row(
                0,
                &[
                    ("first_name", "Jane"),
                    ("last_name", "Doe"),
                    ("email", "jane@x.com"),
                    ("family_name", "Doe Family"),
                ],
            ),
            row(1, &[("first_name", "Bad")]),
        ];

        let summary = importer.import_rows(rows).await.unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 3);
        assert_eq!(summary.errors[0].error, "last_name is required");

        let repo = importer.repository();
        let families = repo.list_families().await.unwrap();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].name, "Doe Family");

        let jane = repo.find_member_by_email("jane@x.com").await.unwrap().unwrap();
        assert_eq!(jane.family_id, Some(families[0].id));
        assert_eq!(jane.membership_status, MembershipStatus::Pending);
        assert_eq!(jane.journey_stage, JourneyStage::Visitor);
    }

    #[tokio::test]
    async fn test_rerun_updates_instead_of_creating() {
        let importer = importer();
        let make_rows = || {
            vec![
                row(0, &[("first_name", "Jane"), ("last_name", "Doe"), ("email", "jane@x.com")]),
                row(1, &[("first_name", "John"), ("last_name", "Doe"), ("email", "john@x.com")]),
            ]
        };

        let first = importer.import_rows(make_rows()).await.unwrap();
        assert_eq!((first.created, first.updated), (2, 0));

        let second = importer.import_rows(make_rows()).await.unwrap();
        assert_eq!((second.created, second.updated), (0, 2));

        assert_eq!(importer.repository().count_members().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_family_reused_across_case_variants() {
        let importer = importer();
        let rows = vec![
            row(0, &[("first_name", "A"), ("last_name", "Lee"), ("family_name", "Lee Family")]),
            row(1, &[("first_name", "B"), ("last_name", "Lee"), ("family_name", "LEE FAMILY")]),
            row(2, &[("first_name", "C"), ("last_name", "Lee"), ("family_name", " lee family ")]),
        ];

        let summary = importer.import_rows(rows).await.unwrap();
        assert_eq!(summary.created, 3);

        let repo = importer.repository();
        assert_eq!(repo.count_families().await.unwrap(), 1);
        let members = repo.list_members().await.unwrap();
        let family_id = members[0].family_id;
        assert!(family_id.is_some());
        assert!(members.iter().all(|m| m.family_id == family_id));
    }

    #[tokio::test]
    async fn test_rejected_row_creates_no_family() {
        let importer = importer();
        let rows = vec![row(
            0,
            &[("first_name", "X"), ("family_name", "Ghost Family")],
        )];

        let summary = importer.import_rows(rows).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(importer.repository().count_families().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_custom_fields_when_absent() {
        let importer = importer();
        importer
            .import_rows(vec![row(
                0,
                &[
                    ("first_name", "Jane"),
                    ("last_name", "Doe"),
                    ("email", "jane@x.com"),
                    ("custom_ministry", "Youth"),
                ],
            )])
            .await
            .unwrap();

        importer
            .import_rows(vec![row(
                0,
                &[
                    ("first_name", "Janet"),
                    ("last_name", "Doe"),
                    ("email", "jane@x.com"),
                ],
            )])
            .await
            .unwrap();

        let jane = importer
            .repository()
            .find_member_by_email("jane@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(jane.first_name, "Janet");
        let custom = jane.custom_fields.unwrap();
        assert_eq!(custom.get("ministry").map(String::as_str), Some("Youth"));
    }

    #[tokio::test]
    async fn test_chunking_preserves_order_and_counts() {
        let conn = shared_conn();
        let config = ConfigManager::from_connection(conn.clone()).unwrap();
        config
            .set_global_config_value(config_keys::IMPORT_CHUNK_SIZE, "2")
            .unwrap();
        let importer =
            MemberImporterImpl::new(MemberImportRepositoryImpl::from_connection(conn), config);

        let rows: Vec<ImportRow> = (0..5)
            .map(|i| {
                if i % 2 == 0 {
                    row(i, &[("first_name", "Only")])
                } else {
                    row(i, &[("first_name", "Ok"), ("last_name", "Row")])
                }
            })
            .collect();

        let summary = importer.import_rows(rows).await.unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.failed, 3);
        let failed_rows: Vec<usize> = summary.errors.iter().map(|e| e.row).collect();
        assert_eq!(failed_rows, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_batch_ledger_written() {
        let importer = importer();
        importer
            .import_rows(vec![row(0, &[("first_name", "A"), ("last_name", "B")])])
            .await
            .unwrap();

        let batches = importer.repository().get_recent_batches(10).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].total, 1);
        assert_eq!(batches[0].created, 1);
        assert_eq!(batches[0].file_name, None);
        assert_eq!(batches[0].errors_json, "[]");
    }

    // ===== 存储失败模拟 =====

    /// 对指定 email 的新建请求返回唯一约束错误，其余委托给真实仓储
    ///
    /// 每次新建会员时记下行流已被拉取的行数
    struct FailingRepo {
        inner: MemberImportRepositoryImpl,
        fail_email: &'static str,
        fail_list_families: bool,
        pulled: Arc<AtomicUsize>,
        pulled_at_create: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl MemberImportRepository for FailingRepo {
        async fn find_member_by_email(&self, email: &str) -> RepositoryResult<Option<Member>> {
            self.inner.find_member_by_email(email).await
        }

        async fn create_member(&self, attrs: &MemberAttributes) -> RepositoryResult<Member> {
            self.pulled_at_create
                .lock()
                .unwrap()
                .push(self.pulled.load(Ordering::SeqCst));
            if attrs.email.as_deref() == Some(self.fail_email) {
                return Err(RepositoryError::UniqueConstraintViolation(
                    "members.email".to_string(),
                ));
            }
            self.inner.create_member(attrs).await
        }

        async fn update_member(
            &self,
            id: i64,
            attrs: &MemberAttributes,
        ) -> RepositoryResult<Member> {
            self.inner.update_member(id, attrs).await
        }

        async fn list_families(&self) -> RepositoryResult<Vec<Family>> {
            if self.fail_list_families {
                return Err(RepositoryError::DatabaseQueryError("no such table".to_string()));
            }
            self.inner.list_families().await
        }

        async fn create_family(&self, family: &NewFamily) -> RepositoryResult<Family> {
            self.inner.create_family(family).await
        }

        async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
            self.inner.insert_batch(batch).await
        }

        async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
            self.inner.get_recent_batches(limit).await
        }

        async fn list_members(&self) -> RepositoryResult<Vec<Member>> {
            self.inner.list_members().await
        }

        async fn count_members(&self) -> RepositoryResult<usize> {
            self.inner.count_members().await
        }

        async fn count_families(&self) -> RepositoryResult<usize> {
            self.inner.count_families().await
        }
    }

    fn failing_importer(fail_list_families: bool) -> MemberImporterImpl<FailingRepo, ConfigManager> {
        failing_importer_with_chunk(fail_list_families, None)
    }

    fn failing_importer_with_chunk(
        fail_list_families: bool,
        chunk_size: Option<&str>,
    ) -> MemberImporterImpl<FailingRepo, ConfigManager> {
        let conn = shared_conn();
        let config = ConfigManager::from_connection(conn.clone()).unwrap();
        if let Some(size) = chunk_size {
            config
                .set_global_config_value(config_keys::IMPORT_CHUNK_SIZE, size)
                .unwrap();
        }
        MemberImporterImpl::new(
            FailingRepo {
                inner: MemberImportRepositoryImpl::from_connection(conn),
                fail_email: "broken@x.com",
                fail_list_families,
                pulled: Arc::new(AtomicUsize::new(0)),
                pulled_at_create: Mutex::new(Vec::new()),
            },
            config,
        )
    }

    /// 逐行产出并计数的行流
    struct CountingRows {
        rows: std::vec::IntoIter<ImportResult<ImportRow>>,
        pulled: Arc<AtomicUsize>,
    }

    impl Iterator for CountingRows {
        type Item = ImportResult<ImportRow>;

        fn next(&mut self) -> Option<Self::Item> {
            let next = self.rows.next();
            if next.is_some() {
                self.pulled.fetch_add(1, Ordering::SeqCst);
            }
            next
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_row_scoped() {
        let importer = failing_importer(false);
        let rows = vec![
            row(0, &[("first_name", "A"), ("last_name", "One"), ("email", "a@x.com")]),
            row(1, &[("first_name", "B"), ("last_name", "Two"), ("email", "broken@x.com")]),
            row(2, &[("first_name", "C"), ("last_name", "Three"), ("email", "c@x.com")]),
        ];

        let summary = importer.import_rows(rows).await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].row, 3);
        assert!(summary.errors[0].error.starts_with("storage error:"));
        assert_eq!(importer.repository().count_members().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_family_cache_load_failure_is_fatal() {
        let importer = failing_importer(true);
        let rows = vec![row(0, &[("first_name", "A"), ("last_name", "B")])];

        let result = importer.import_rows(rows).await;
        assert!(matches!(result, Err(ImportError::FamilyCacheLoad(_))));
        assert_eq!(importer.repository().count_members().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rows_pulled_one_chunk_at_a_time() {
        let importer = failing_importer_with_chunk(false, Some("2"));
        let pulled = importer.repository().pulled.clone();
        let rows = CountingRows {
            rows: (0..5)
                .map(|i| Ok(row(i, &[("first_name", "Ok"), ("last_name", "Row")])))
                .collect::<Vec<_>>()
                .into_iter(),
            pulled: pulled.clone(),
        };

        let summary = importer.run(rows, None).await.unwrap();
        assert_eq!(summary.created, 5);

        let seen = importer.repository().pulled_at_create.lock().unwrap().clone();
        assert_eq!(seen, vec![2, 2, 4, 4, 5]);
        assert_eq!(pulled.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_read_failure_mid_stream_keeps_earlier_chunks() {
        let importer = failing_importer_with_chunk(false, Some("1"));
        let rows = CountingRows {
            rows: vec![
                Ok(row(0, &[("first_name", "A"), ("last_name", "One")])),
                Err(ImportError::FileReadError("disk gone".to_string())),
                Ok(row(2, &[("first_name", "C"), ("last_name", "Three")])),
            ]
            .into_iter(),
            pulled: importer.repository().pulled.clone(),
        };

        let result = importer.run(rows, None).await;
        assert!(matches!(result, Err(ImportError::FileReadError(_))));
        assert_eq!(importer.repository().count_members().await.unwrap(), 1);
        assert!(importer.repository().get_recent_batches(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_families_created_active() {
        let importer = importer();
        importer
            .repository()
            .create_family(&NewFamily {
                name: "Old Family".to_string(),
                status: FamilyStatus::Inactive,
            })
            .await
            .unwrap();

        importer
            .import_rows(vec![row(
                0,
                &[("first_name", "A"), ("last_name", "B"), ("family_name", "B Family")],
            )])
            .await
            .unwrap();

        let families = importer.repository().list_families().await.unwrap();
        let created = families.iter().find(|f| f.name == "B Family").unwrap();
        assert_eq!(created.status, FamilyStatus::Active);
    }

    #[tokio::test]
    async fn test_undecodable_row_fails_alone() {
        let importer = importer();
        let rows = vec![
            row(0, &[("first_name", "Jane"), ("last_name", "Doe")]),
            row(1, &[("first_name", "Jos\u{fffd}"), ("last_name", "Garcia")])
                .with_decode_error("first_name"),
            row(2, &[("first_name", "John"), ("last_name", "Roe")]),
        ];

        let summary = importer.import_rows(rows).await.unwrap();
        assert_eq!((summary.created, summary.failed), (2, 1));
        assert_eq!(summary.errors[0].row, 3);
        assert_eq!(summary.errors[0].error, "first_name is not valid UTF-8 text");
    }
}
