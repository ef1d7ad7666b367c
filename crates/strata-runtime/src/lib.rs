pub mod db;
pub mod migrations;

pub use db::Database;
pub use migrations::{
    context_key_for, FileScaffolder, MigrationCatalog, MigrationOrchestrator, MigrationRegistry,
    MigrationStatus, ModelDiffer, OrchestratorBuilder, PgAdvisoryLock, PgHistoryStore,
    PgSqlGenerator, PgStatementExecutor, UpgradeReport,
};
