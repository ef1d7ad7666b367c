pub mod config;
pub mod error;
pub mod migration;
pub mod schema;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::StrataConfig;
pub use error::{Result, StrataError};
pub use migration::{
    ContextKey, DiffEngine, HistoryStore, MigrationLock, MigrationMetadata, MigrationRecord,
    Operation, Scaffolder, SqlTranslator, StatementExecutor, TableIdentity,
};
pub use schema::{ColumnDef, IndexDef, Snapshot, SqlType, TableDef};
