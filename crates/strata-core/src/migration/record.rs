use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::context::ContextKey;
use super::operation::Operation;
use crate::schema::Snapshot;

/// Length of a `yyyyMMddHHmmssf` timestamp.
pub const TIMESTAMP_LEN: usize = 15;

/// Format a migration timestamp as `yyyyMMddHHmmssf` (UTC, tenths of a second).
pub fn migration_timestamp(now: DateTime<Utc>) -> String {
    format!(
        "{}{}",
        now.format("%Y%m%d%H%M%S"),
        now.nanosecond() % 1_000_000_000 / 100_000_000
    )
}

/// Whether `timestamp` has the `yyyyMMddHHmmssf` shape.
pub fn is_valid_timestamp(timestamp: &str) -> bool {
    timestamp.len() == TIMESTAMP_LEN && timestamp.bytes().all(|b| b.is_ascii_digit())
}

/// Identity of a migration: its name and creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub name: String,
    pub timestamp: String,
}

impl MigrationRecord {
    pub fn new(name: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: timestamp.into(),
        }
    }
}

impl fmt::Display for MigrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.timestamp, self.name)
    }
}

/// One row of the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub migration_name: String,
    pub context_key: String,
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn new(context_key: &ContextKey, migration: &MigrationRecord) -> Self {
        Self {
            migration_name: migration.name.clone(),
            context_key: context_key.as_str().to_string(),
            timestamp: migration.timestamp.clone(),
        }
    }

    pub fn to_record(&self) -> MigrationRecord {
        MigrationRecord::new(&self.migration_name, &self.timestamp)
    }
}

/// A migration together with the models and operations it carries.
///
/// Created once when a migration is authored; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationMetadata {
    pub name: String,
    pub timestamp: String,

    /// Schema before the migration. `None` for a migration authored from an empty baseline.
    #[serde(default)]
    pub source_model: Option<Snapshot>,

    /// Schema after the migration.
    pub target_model: Snapshot,

    /// Operations taking `source_model` to `target_model`.
    #[serde(default)]
    pub upgrade_operations: Vec<Operation>,

    /// Operations taking `target_model` back to `source_model`.
    #[serde(default)]
    pub downgrade_operations: Vec<Operation>,
}

impl MigrationMetadata {
    /// A migration with no operations between two identical models.
    pub fn new(name: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: timestamp.into(),
            source_model: None,
            target_model: Snapshot::default(),
            upgrade_operations: Vec::new(),
            downgrade_operations: Vec::new(),
        }
    }

    pub fn with_upgrade(mut self, operations: Vec<Operation>) -> Self {
        self.upgrade_operations = operations;
        self
    }

    pub fn with_downgrade(mut self, operations: Vec<Operation>) -> Self {
        self.downgrade_operations = operations;
        self
    }

    pub fn with_models(mut self, source: Option<Snapshot>, target: Snapshot) -> Self {
        self.source_model = source;
        self.target_model = target;
        self
    }

    /// The name/timestamp pair that goes into the history table.
    pub fn record(&self) -> MigrationRecord {
        MigrationRecord::new(&self.name, &self.timestamp)
    }

    /// Artifact file stem: `<timestamp>_<name>`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.timestamp, self.name)
    }
}
