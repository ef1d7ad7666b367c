use std::fmt;

use async_trait::async_trait;

use super::context::ContextKey;
use super::operation::Operation;
use super::record::{MigrationMetadata, MigrationRecord};
use crate::error::Result;
use crate::schema::Snapshot;

/// Schema-qualified name of the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIdentity {
    pub name: String,
    pub schema: String,
}

impl TableIdentity {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
        }
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\".\"{}\"", self.schema, self.name)
    }
}

/// Durable ledger of applied migrations, keyed by context.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Where the ledger lives.
    fn table_identity(&self) -> TableIdentity;

    /// Migrations applied for `context_key`, ascending by timestamp.
    ///
    /// A ledger that does not exist yet holds no migrations.
    async fn list_applied(&self, context_key: &ContextKey) -> Result<Vec<MigrationRecord>>;

    /// Append one entry. Fails with `DuplicateMigration` if the
    /// `(name, context_key)` pair is already recorded.
    async fn record_applied(
        &self,
        context_key: &ContextKey,
        migration: &MigrationRecord,
    ) -> Result<()>;
}

/// Computes ordered operation lists between two snapshots.
pub trait DiffEngine: Send + Sync {
    fn diff(&self, source: &Snapshot, target: &Snapshot) -> Vec<Operation>;

    /// Operations creating `target` from a schema with no objects.
    fn diff_from_empty(&self, target: &Snapshot) -> Vec<Operation>;

    /// Operations removing every object of `target`.
    fn diff_to_empty(&self, target: &Snapshot) -> Vec<Operation>;
}

/// Renders operations as SQL that is safe to execute more than once.
pub trait SqlTranslator: Send + Sync {
    fn generate_idempotent_sql(&self, operations: &[Operation]) -> Vec<String>;
}

/// Executes statements against the caller's connection, one at a time,
/// outside of any transaction.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, statements: &[String]) -> Result<()>;
}

/// Persists authored migrations and model snapshots as artifacts.
pub trait Scaffolder: Send + Sync {
    fn emit_migration(&self, migration: &MigrationMetadata) -> Result<()>;

    fn emit_snapshot(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Serializes upgrades across processes.
#[async_trait]
pub trait MigrationLock: Send + Sync {
    /// Block until the lock is held.
    async fn acquire(&self) -> Result<()>;

    async fn release(&self) -> Result<()>;
}

/// Scaffolder that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScaffolder;

impl Scaffolder for NoopScaffolder {
    fn emit_migration(&self, migration: &MigrationMetadata) -> Result<()> {
        tracing::debug!("Discarding scaffolded migration {}", migration.name);
        Ok(())
    }

    fn emit_snapshot(&self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }
}
