// ==========================================
// 会众管理系统 - 会员导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{Family, ImportBatch, Member, MemberAttributes, NewFamily};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// MemberImportRepository Trait
// ==========================================
// 用途: 会员导入相关数据访问
// 实现者: MemberImportRepositoryImpl（使用 rusqlite）
// 说明: 每次写入独立提交，不存在跨整次导入的事务
#[async_trait]
pub trait MemberImportRepository: Send + Sync {
    // ===== 会员 =====

    /// 按 email 精确查找会员（区分大小写）
    ///
    /// # 返回
    /// - Ok(Some(Member)): 找到
    /// - Ok(None): 不存在
    async fn find_member_by_email(&self, email: &str) -> RepositoryResult<Option<Member>>;

    /// 新建会员
    async fn create_member(&self, attrs: &MemberAttributes) -> RepositoryResult<Member>;

    /// 原地更新会员
    ///
    /// # 说明
    /// - attrs.custom_fields 为 None 时保留已有自定义字段
    /// - 会员不存在返回 NotFound
    async fn update_member(&self, id: i64, attrs: &MemberAttributes) -> RepositoryResult<Member>;

    // ===== 家庭 =====

    /// 列出全部家庭（按 id 升序）
    async fn list_families(&self) -> RepositoryResult<Vec<Family>>;

    /// 新建家庭
    async fn create_family(&self, family: &NewFamily) -> RepositoryResult<Family>;

    // ===== 批次台账 =====

    /// 插入导入批次记录
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 查询最近的导入批次（按导入时间倒序）
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;

    // ===== 查询 =====

    /// 列出全部会员（按 id 升序）
    async fn list_members(&self) -> RepositoryResult<Vec<Member>>;

    /// 统计 members 表记录数
    async fn count_members(&self) -> RepositoryResult<usize>;

    /// 统计 families 表记录数
    async fn count_families(&self) -> RepositoryResult<usize>;
}
