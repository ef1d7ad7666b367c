use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, StrataError};
use crate::migration::{ContextKey, HistoryEntry, HistoryStore, MigrationRecord, TableIdentity};

/// In-memory history ledger.
///
/// Starts without a table, like a fresh database; the table appears on the
/// first successful write.
pub struct MemoryHistoryStore {
    rows: RwLock<Option<Vec<HistoryEntry>>>,
    failing_records: RwLock<Vec<String>>,
}

impl MemoryHistoryStore {
    /// Create a store whose table does not exist yet.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(None),
            failing_records: RwLock::new(Vec::new()),
        }
    }

    /// Create a store that already holds `entries` for `context_key`.
    pub fn with_applied(context_key: &ContextKey, entries: &[MigrationRecord]) -> Self {
        let rows = entries
            .iter()
            .map(|m| HistoryEntry::new(context_key, m))
            .collect();
        Self {
            rows: RwLock::new(Some(rows)),
            failing_records: RwLock::new(Vec::new()),
        }
    }

    /// Make `record_applied` fail for this migration name, simulating a crash
    /// between executing a migration and recording it.
    pub fn fail_record_of(&self, name: &str) {
        self.failing_records.write().unwrap().push(name.to_string());
    }

    /// Stop injecting record failures.
    pub fn clear_failures(&self) {
        self.failing_records.write().unwrap().clear();
    }

    /// Whether the history table has been created.
    pub fn table_exists(&self) -> bool {
        self.rows.read().unwrap().is_some()
    }

    /// All rows across every context, in insertion order.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.rows.read().unwrap().clone().unwrap_or_default()
    }

    /// Names applied for `context_key`, in insertion order.
    pub fn applied_names(&self, context_key: &ContextKey) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.context_key == context_key.as_str())
            .map(|e| e.migration_name)
            .collect()
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    fn table_identity(&self) -> TableIdentity {
        TableIdentity::new("__MigrationHistory", "memory")
    }

    async fn list_applied(&self, context_key: &ContextKey) -> Result<Vec<MigrationRecord>> {
        let mut applied: Vec<MigrationRecord> = self
            .entries()
            .iter()
            .filter(|e| e.context_key == context_key.as_str())
            .map(HistoryEntry::to_record)
            .collect();
        applied.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(applied)
    }

    async fn record_applied(
        &self,
        context_key: &ContextKey,
        migration: &MigrationRecord,
    ) -> Result<()> {
        if self
            .failing_records
            .read()
            .unwrap()
            .iter()
            .any(|n| n == &migration.name)
        {
            return Err(StrataError::Database(format!(
                "connection lost while recording '{}'",
                migration.name
            )));
        }

        let mut rows = self.rows.write().unwrap();
        let rows = rows.get_or_insert_with(Vec::new);

        if rows
            .iter()
            .any(|e| e.migration_name == migration.name && e.context_key == context_key.as_str())
        {
            return Err(StrataError::DuplicateMigration {
                name: migration.name.clone(),
                context_key: context_key.to_string(),
            });
        }

        rows.push(HistoryEntry::new(context_key, migration));
        Ok(())
    }
}
