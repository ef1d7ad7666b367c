use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use strata_core::error::{Result, StrataError};
use strata_core::migration::{ContextKey, MigrationMetadata, Scaffolder};
use strata_core::schema::Snapshot;

use super::catalog::SNAPSHOT_SUFFIX;

/// Writes migrations and snapshots as pretty JSON into a migrations directory,
/// in the layout [`MigrationCatalog::from_dir`](super::MigrationCatalog::from_dir) reads.
///
/// Migration files are `<timestamp>_<name>.json` and are never overwritten.
/// The snapshot file is `<context key>.snapshot.json` and is replaced on
/// every emit.
#[derive(Debug, Clone)]
pub struct FileScaffolder {
    directory: PathBuf,
    context_key: ContextKey,
}

impl FileScaffolder {
    pub fn new(directory: impl Into<PathBuf>, context_key: ContextKey) -> Self {
        Self {
            directory: directory.into(),
            context_key,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn migration_path(&self, migration: &MigrationMetadata) -> PathBuf {
        self.directory.join(format!("{}.json", migration.file_stem()))
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.context_key, SNAPSHOT_SUFFIX))
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.directory).map_err(|e| {
            StrataError::Scaffold(format!(
                "Failed to create {}: {}",
                self.directory.display(),
                e
            ))
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

impl Scaffolder for FileScaffolder {
    fn emit_migration(&self, migration: &MigrationMetadata) -> Result<()> {
        self.ensure_dir()?;
        let path = self.migration_path(migration);
        let json = to_json(migration)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StrataError::Scaffold(format!("{}: {}", path.display(), e)))?;
        file.write_all(json.as_bytes())?;

        info!("Created migration file {}", path.display());
        Ok(())
    }

    fn emit_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.ensure_dir()?;
        let path = self.snapshot_path();

        std::fs::write(&path, to_json(snapshot)?)
            .map_err(|e| StrataError::Scaffold(format!("{}: {}", path.display(), e)))?;

        info!("Updated model snapshot {}", path.display());
        Ok(())
    }
}
