// ==========================================
// 会众管理系统 - 会员导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::{CustomFields, Family, ImportBatch, Member, MemberAttributes, NewFamily};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::member_import_repo::MemberImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const MEMBER_COLUMNS: &str = "id, first_name, last_name, email, phone, gender, date_of_birth, \
     address, city, state, postal_code, country, membership_status, membership_date, \
     journey_stage, family_id, custom_fields, created_at, updated_at";

/// 解析文本列为枚举（小写存储）
fn parse_text_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_text_column<T>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    }
}

fn parse_custom_fields(row: &Row, idx: usize) -> rusqlite::Result<Option<CustomFields>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str::<CustomFields>(&raw)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    }
}

fn map_member_row(row: &Row) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        gender: parse_optional_text_column(row, 5)?,
        date_of_birth: row.get(6)?,
        address: row.get(7)?,
        city: row.get(8)?,
        state: row.get(9)?,
        postal_code: row.get(10)?,
        country: row.get(11)?,
        membership_status: parse_text_column(row, 12)?,
        membership_date: row.get(13)?,
        journey_stage: parse_text_column(row, 14)?,
        family_id: row.get(15)?,
        custom_fields: parse_custom_fields(row, 16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn map_family_row(row: &Row) -> rusqlite::Result<Family> {
    Ok(Family {
        id: row.get(0)?,
        name: row.get(1)?,
        status: parse_text_column(row, 2)?,
        created_at: row.get(3)?,
    })
}

fn map_batch_row(row: &Row) -> rusqlite::Result<ImportBatch> {
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        file_name: row.get(1)?,
        file_path: row.get(2)?,
        total: row.get::<_, i64>(3)? as usize,
        created: row.get::<_, i64>(4)? as usize,
        updated: row.get::<_, i64>(5)? as usize,
        failed: row.get::<_, i64>(6)? as usize,
        errors_json: row.get(7)?,
        imported_at: row.get(8)?,
        elapsed_ms: row.get(9)?,
    })
}

fn serialize_custom_fields(fields: Option<&CustomFields>) -> RepositoryResult<Option<String>> {
    fields
        .map(serde_json::to_string)
        .transpose()
        .map_err(RepositoryError::from)
}

// ==========================================
// MemberImportRepositoryImpl
// ==========================================
pub struct MemberImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl MemberImportRepositoryImpl {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn fetch_member(conn: &Connection, id: i64) -> RepositoryResult<Member> {
        let sql = format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS);
        conn.query_row(&sql, params![id], map_member_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Member".to_string(),
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl MemberImportRepository for MemberImportRepositoryImpl {
    async fn find_member_by_email(&self, email: &str) -> RepositoryResult<Option<Member>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM members WHERE email = ?1 LIMIT 1",
            MEMBER_COLUMNS
        );

        let member = conn
            .query_row(&sql, params![email], map_member_row)
            .optional()?;
        Ok(member)
    }

    async fn create_member(&self, attrs: &MemberAttributes) -> RepositoryResult<Member> {
        let conn = self.get_conn()?;
        let now = Utc::now();
        let custom_fields = serialize_custom_fields(attrs.custom_fields.as_ref())?;

        conn.execute(
            r#"
            INSERT INTO members (
                first_name, last_name, email, phone, gender, date_of_birth,
                address, city, state, postal_code, country,
                membership_status, membership_date, journey_stage,
                family_id, custom_fields, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            params![
                attrs.first_name,
                attrs.last_name,
                attrs.email,
                attrs.phone,
                attrs.gender.map(|g| g.as_str()),
                attrs.date_of_birth,
                attrs.address,
                attrs.city,
                attrs.state,
                attrs.postal_code,
                attrs.country,
                attrs.membership_status.as_str(),
                attrs.membership_date,
                attrs.journey_stage.as_str(),
                attrs.family_id,
                custom_fields,
                now,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::fetch_member(&conn, id)
    }

    async fn update_member(&self, id: i64, attrs: &MemberAttributes) -> RepositoryResult<Member> {
        let conn = self.get_conn()?;
        let custom_fields = serialize_custom_fields(attrs.custom_fields.as_ref())?;

        // custom_fields 为 NULL 时保留原值
        let affected = conn.execute(
            r#"
            UPDATE members SET
                first_name = ?1, last_name = ?2, email = ?3, phone = ?4,
                gender = ?5, date_of_birth = ?6,
                address = ?7, city = ?8, state = ?9, postal_code = ?10, country = ?11,
                membership_status = ?12, membership_date = ?13, journey_stage = ?14,
                family_id = ?15,
                custom_fields = COALESCE(?16, custom_fields),
                updated_at = ?17
            WHERE id = ?18
            "#,
            params![
                attrs.first_name,
                attrs.last_name,
                attrs.email,
                attrs.phone,
                attrs.gender.map(|g| g.as_str()),
                attrs.date_of_birth,
                attrs.address,
                attrs.city,
                attrs.state,
                attrs.postal_code,
                attrs.country,
                attrs.membership_status.as_str(),
                attrs.membership_date,
                attrs.journey_stage.as_str(),
                attrs.family_id,
                custom_fields,
                Utc::now(),
                id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Member".to_string(),
                id: id.to_string(),
            });
        }

        Self::fetch_member(&conn, id)
    }

    async fn list_families(&self) -> RepositoryResult<Vec<Family>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, status, created_at FROM families ORDER BY id")?;
        let families = stmt
            .query_map([], map_family_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(families)
    }

    async fn create_family(&self, family: &NewFamily) -> RepositoryResult<Family> {
        let conn = self.get_conn()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO families (name, status, created_at) VALUES (?1, ?2, ?3)",
            params![family.name, family.status.as_str(), now],
        )?;

        let id = conn.last_insert_rowid();
        let created = conn.query_row(
            "SELECT id, name, status, created_at FROM families WHERE id = ?1",
            params![id],
            map_family_row,
        )?;
        Ok(created)
    }

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, file_path, total_rows, created_rows,
                updated_rows, failed_rows, errors_json, imported_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.file_path,
                batch.total as i64,
                batch.created as i64,
                batch.updated as i64,
                batch.failed as i64,
                batch.errors_json,
                batch.imported_at,
                batch.elapsed_ms,
            ],
        )?;

        Ok(())
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, file_name, file_path, total_rows, created_rows,
                   updated_rows, failed_rows, errors_json, imported_at, elapsed_ms
            FROM import_batch
            ORDER BY imported_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let batches = stmt
            .query_map(params![limit as i64], map_batch_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(batches)
    }

    async fn list_members(&self) -> RepositoryResult<Vec<Member>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM members ORDER BY id", MEMBER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let members = stmt
            .query_map([], map_member_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }

    async fn count_members(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn count_families(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM families", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
