// ==========================================
// 会众管理系统 - 会员批量导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 职责: 表格 → 会员/家庭记录，按行汇总成功与失败
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入配置与路径
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FamilyStatus, Gender, JourneyStage, MembershipStatus};

// 领域实体
pub use domain::{
    Family, ImportBatch, ImportRow, ImportSummary, Member, MemberAttributes, RowFailure,
};

// 导入器
pub use importer::{ImportError, MemberImporter, MemberImporterImpl};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "congregation-import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "congregation-import");
    }
}
