// ==========================================
// 会众管理系统 - 家庭缓存
// ==========================================
// 作用域: 单次导入运行；运行开始时从存储加载一次
// 键: 家庭名 TRIM 后转小写（大小写不敏感）
// 同名（忽略大小写）已有多个家庭时，id 最小者胜出
// 导入新建的家庭状态固定为 active
// ==========================================

use crate::domain::{FamilyStatus, NewFamily};
use crate::repository::{MemberImportRepository, RepositoryResult};
use std::collections::HashMap;
use tracing::debug;

pub struct FamilyCache<'a, R>
where
    R: MemberImportRepository + ?Sized,
{
    repo: &'a R,
    ids: HashMap<String, i64>,
    created: usize,
}

impl<'a, R> FamilyCache<'a, R>
where
    R: MemberImportRepository + ?Sized,
{
    /// 加载已有家庭
    pub async fn load(repo: &'a R) -> RepositoryResult<Self> {
        let families = repo.list_families().await?;

        let mut ids = HashMap::with_capacity(families.len());
        for family in families {
            ids.entry(Self::key(&family.name)).or_insert(family.id);
        }
        debug!(families = ids.len(), "家庭缓存加载完成");

        Ok(Self {
            repo,
            ids,
            created: 0,
        })
    }

    /// 按名称解析家庭 id；未命中时新建家庭并写回缓存
    ///
    /// 新建家庭的名称保留首次出现时的写法（仅 TRIM）
    pub async fn resolve(&mut self, name: &str) -> RepositoryResult<i64> {
        let key = Self::key(name);
        if let Some(id) = self.ids.get(&key) {
            return Ok(*id);
        }

        let family = self
            .repo
            .create_family(&NewFamily {
                name: name.trim().to_string(),
                status: FamilyStatus::Active,
            })
            .await?;
        debug!(family_id = family.id, name = %family.name, "新建家庭");

        self.ids.insert(key, family.id);
        self.created += 1;
        Ok(family.id)
    }

    /// 本次运行新建的家庭数
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}
