//! The set of migrations known to this process for one namespace.
//!
//! A catalog is built once, validated, sorted, and then owned by the
//! orchestrator. It never re-reads its source.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use strata_core::error::{Result, StrataError};
use strata_core::migration::{is_valid_timestamp, MigrationMetadata};
use strata_core::schema::Snapshot;
use tracing::debug;

/// Suffix of snapshot artifacts in a migrations directory.
pub const SNAPSHOT_SUFFIX: &str = ".snapshot.json";

/// Immutable, timestamp-ordered list of migrations plus the last recorded snapshot.
#[derive(Debug, Clone)]
pub struct MigrationCatalog {
    namespace: String,
    migrations: Vec<MigrationMetadata>,
    snapshot: Option<Snapshot>,
}

impl MigrationCatalog {
    /// Build a catalog from discovered migrations and snapshot definitions.
    ///
    /// Fails with `Discovery` if there is more than one snapshot, a blank or
    /// duplicated migration name, or a malformed timestamp.
    pub fn new(
        namespace: impl Into<String>,
        mut migrations: Vec<MigrationMetadata>,
        mut snapshots: Vec<Snapshot>,
    ) -> Result<Self> {
        let namespace = namespace.into();

        if snapshots.len() > 1 {
            return Err(StrataError::Discovery(format!(
                "found {} model snapshots for namespace '{}', expected at most one",
                snapshots.len(),
                namespace
            )));
        }

        let mut seen = HashSet::new();
        for migration in &migrations {
            if migration.name.trim().is_empty() {
                return Err(StrataError::Discovery(format!(
                    "migration with timestamp {} in namespace '{}' has a blank name",
                    migration.timestamp, namespace
                )));
            }
            if !is_valid_timestamp(&migration.timestamp) {
                return Err(StrataError::Discovery(format!(
                    "migration '{}' has malformed timestamp '{}'",
                    migration.name, migration.timestamp
                )));
            }
            if !seen.insert(migration.name.as_str()) {
                return Err(StrataError::Discovery(format!(
                    "migration name '{}' appears more than once in namespace '{}'",
                    migration.name, namespace
                )));
            }
        }

        // Stable: equal timestamps keep discovery order.
        migrations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        debug!(
            "Catalog '{}' holds {} migrations (snapshot: {})",
            namespace,
            migrations.len(),
            !snapshots.is_empty()
        );

        Ok(Self {
            namespace,
            migrations,
            snapshot: snapshots.pop(),
        })
    }

    /// A catalog with no migrations and no snapshot.
    pub fn empty(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            migrations: Vec::new(),
            snapshot: None,
        }
    }

    /// Scan a migrations directory.
    ///
    /// Every `*.snapshot.json` file is a snapshot definition; every other
    /// `*.json` file is a migration artifact. A missing directory is an
    /// empty catalog.
    pub fn from_dir(namespace: impl Into<String>, dir: &Path) -> Result<Self> {
        let namespace = namespace.into();

        if !dir.exists() {
            debug!("Migrations directory does not exist: {:?}", dir);
            return Ok(Self::empty(namespace));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.sort();

        let mut migrations = Vec::new();
        let mut snapshots = Vec::new();

        for path in paths {
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            if file_name.ends_with(SNAPSHOT_SUFFIX) {
                snapshots.push(read_artifact::<Snapshot>(&path)?);
            } else if path.extension().map(|e| e == "json").unwrap_or(false) {
                migrations.push(read_artifact::<MigrationMetadata>(&path)?);
            }
        }

        Self::new(namespace, migrations, snapshots)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// All migrations, ascending by timestamp.
    pub fn list_migrations(&self) -> &[MigrationMetadata] {
        &self.migrations
    }

    /// The last recorded model, or `None` when nothing has been recorded yet.
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Whether a migration with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.migrations.iter().any(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        StrataError::Discovery(format!("malformed artifact {}: {}", path.display(), e))
    })
}
