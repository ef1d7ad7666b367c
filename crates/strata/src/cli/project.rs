use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use strata_core::migration::ContextKey;
use strata_core::schema::Snapshot;
use strata_core::StrataConfig;
use strata_runtime::{
    Database, FileScaffolder, MigrationCatalog, MigrationOrchestrator, PgAdvisoryLock,
};

/// A loaded `strata.toml` and the directory it lives in.
///
/// Relative paths in the configuration resolve against that directory.
pub struct Project {
    pub config: StrataConfig,
    root: PathBuf,
}

impl Project {
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "Configuration file not found: {}\nCreate a strata.toml or pass --config.",
                config_path.display()
            );
        }

        info!("Loading configuration from {}", config_path.display());
        let config = StrataConfig::from_file(config_path)?;
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self { config, root })
    }

    pub fn context_key(&self) -> Result<ContextKey> {
        Ok(self.config.context_key()?)
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.root.join(&self.config.migrations.directory)
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(&self.config.migrations.model)
    }

    pub fn catalog(&self) -> Result<MigrationCatalog> {
        let key = self.context_key()?;
        Ok(MigrationCatalog::from_dir(key.as_str(), &self.migrations_dir())?)
    }

    /// The live model. Commands that only apply migrations run without one.
    pub fn model(&self, required: bool) -> Result<Snapshot> {
        let path = self.model_path();
        if !path.exists() {
            if required {
                anyhow::bail!("Model file not found: {}", path.display());
            }
            return Ok(Snapshot::new());
        }
        Ok(Snapshot::from_toml_file(&path)?)
    }

    pub fn scaffolder(&self) -> Result<FileScaffolder> {
        Ok(FileScaffolder::new(self.migrations_dir(), self.context_key()?))
    }

    /// Orchestrator writing artifacts to the migrations directory.
    pub fn orchestrator(&self, db: &Database, model: Snapshot) -> Result<MigrationOrchestrator> {
        let mut builder =
            MigrationOrchestrator::postgres(db, self.catalog()?, model, self.context_key()?)
                .scaffolder(Arc::new(self.scaffolder()?));

        if self.config.migrations.advisory_lock {
            debug!("Upgrades are serialized with an advisory lock");
            builder = builder.lock(Arc::new(PgAdvisoryLock::new(db.pool())));
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("strata.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_config_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Project::load(&dir.path().join("strata.toml")).is_err());
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [project]
            name = "blog"

            [database]
            url = "postgres://localhost/blog"

            [migrations]
            directory = "db/migrations"
            "#,
        );

        let project = Project::load(&path).unwrap();
        assert_eq!(project.migrations_dir(), dir.path().join("db/migrations"));
        assert_eq!(project.model_path(), dir.path().join("schema.toml"));
        assert_eq!(project.context_key().unwrap().as_str(), "blog");

        let catalog = project.catalog().unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.namespace(), "blog");
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_load_logs_config_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "[database]\nurl = \"\"\n");

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || Project::load(&path).unwrap());

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Loading configuration from"), "{output}");
        assert!(output.contains("strata.toml"), "{output}");
    }

    #[test]
    fn test_missing_model() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "[database]\nurl = \"\"\n");
        let project = Project::load(&path).unwrap();

        assert!(project.model(true).is_err());
        assert!(project.model(false).unwrap().is_empty());
    }
}
