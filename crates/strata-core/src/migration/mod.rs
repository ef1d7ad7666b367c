//! Migration value objects and the seams the orchestrator is built from.

mod context;
mod operation;
mod record;
mod traits;

pub use context::ContextKey;
pub use operation::Operation;
pub use record::{
    is_valid_timestamp, migration_timestamp, HistoryEntry, MigrationMetadata, MigrationRecord,
    TIMESTAMP_LEN,
};
pub use traits::{
    DiffEngine, HistoryStore, MigrationLock, NoopScaffolder, Scaffolder, SqlTranslator,
    StatementExecutor, TableIdentity,
};
