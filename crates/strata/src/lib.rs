//! strata - schema migration orchestration and history tracking.
//!
//! Author migrations by diffing a declared model against the last recorded
//! snapshot, and apply them to PostgreSQL with a per-context history table.

#[doc(hidden)]
pub use strata_core;
#[doc(hidden)]
pub use strata_runtime;

pub mod prelude {
    pub use strata_core::error::{Result, StrataError};
    pub use strata_core::migration::{
        ContextKey, DiffEngine, HistoryStore, MigrationLock, MigrationMetadata, MigrationRecord,
        Operation, Scaffolder, SqlTranslator, StatementExecutor,
    };
    pub use strata_core::schema::{ColumnDef, IndexDef, Snapshot, SqlType, TableDef};
    pub use strata_core::StrataConfig;
    pub use strata_runtime::{
        context_key_for, Database, FileScaffolder, MigrationCatalog, MigrationOrchestrator,
        MigrationRegistry, MigrationStatus, ModelDiffer, PgAdvisoryLock, PgSqlGenerator,
        UpgradeReport,
    };
}
