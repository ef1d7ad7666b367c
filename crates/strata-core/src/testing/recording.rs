use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, StrataError};
use crate::migration::{MigrationLock, MigrationMetadata, Scaffolder, StatementExecutor};
use crate::schema::Snapshot;

/// Statement executor that records what it runs.
///
/// Statements matching an injected failure pattern fail with a database
/// error; everything before them in the same call has already "run".
pub struct RecordingExecutor {
    executed: RwLock<Vec<String>>,
    failures: RwLock<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            executed: RwLock::new(Vec::new()),
            failures: RwLock::new(Vec::new()),
        }
    }

    /// Fail any statement containing `pattern`.
    pub fn fail_when(&self, pattern: &str) {
        self.failures.write().unwrap().push(pattern.to_string());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.failures.write().unwrap().clear();
    }

    /// Every statement executed successfully, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.read().unwrap().clone()
    }

    /// How many executed statements contain `pattern`.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.executed
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.contains(pattern))
            .count()
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatementExecutor for RecordingExecutor {
    async fn execute(&self, statements: &[String]) -> Result<()> {
        for statement in statements {
            let failing = self
                .failures
                .read()
                .unwrap()
                .iter()
                .any(|p| statement.contains(p.as_str()));
            if failing {
                return Err(StrataError::Database(format!(
                    "statement failed: {}",
                    statement
                )));
            }
            self.executed.write().unwrap().push(statement.clone());
        }
        Ok(())
    }
}

/// Scaffolder that keeps emitted artifacts in memory.
#[derive(Default)]
pub struct RecordingScaffolder {
    migrations: RwLock<Vec<MigrationMetadata>>,
    snapshots: RwLock<Vec<Snapshot>>,
}

impl RecordingScaffolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn migrations(&self) -> Vec<MigrationMetadata> {
        self.migrations.read().unwrap().clone()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.read().unwrap().clone()
    }
}

impl Scaffolder for RecordingScaffolder {
    fn emit_migration(&self, migration: &MigrationMetadata) -> Result<()> {
        self.migrations.write().unwrap().push(migration.clone());
        Ok(())
    }

    fn emit_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.write().unwrap().push(snapshot.clone());
        Ok(())
    }
}

/// Lock that counts acquisitions and releases.
#[derive(Default)]
pub struct RecordingLock {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl RecordingLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether every acquisition has been matched by a release.
    pub fn is_balanced(&self) -> bool {
        self.acquired() == self.released()
    }
}

#[async_trait]
impl MigrationLock for RecordingLock {
    async fn acquire(&self) -> Result<()> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
