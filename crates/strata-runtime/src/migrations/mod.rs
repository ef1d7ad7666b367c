mod catalog;
mod differ;
mod executor;
mod history;
mod lock;
mod orchestrator;
mod registry;
mod scaffolder;
mod sql;

pub use catalog::{MigrationCatalog, SNAPSHOT_SUFFIX};
pub use differ::ModelDiffer;
pub use executor::PgStatementExecutor;
pub use history::{context_key_for, PgHistoryStore, HISTORY_SCHEMA, HISTORY_TABLE};
pub use lock::{PgAdvisoryLock, MIGRATION_LOCK_ID};
pub use orchestrator::{MigrationOrchestrator, MigrationStatus, OrchestratorBuilder, UpgradeReport};
pub use registry::{MigrationFactory, MigrationRegistry, SnapshotFactory};
pub use scaffolder::FileScaffolder;
pub use sql::{quote_ident, split_sql_statements, PgSqlGenerator};
