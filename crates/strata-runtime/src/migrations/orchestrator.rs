//! Pending computation, upgrade and authoring for one context.
//!
//! Upgrades run one migration at a time: translate, execute, record. A
//! failure stops the run without recording the failed migration; everything
//! recorded before it stays recorded. Generated SQL is idempotent, so a
//! migration that executed but was never recorded is safe to run again.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use strata_core::error::{Result, StrataError};
use strata_core::migration::{
    migration_timestamp, ContextKey, DiffEngine, HistoryStore, MigrationLock, MigrationMetadata,
    MigrationRecord, NoopScaffolder, Scaffolder, SqlTranslator, StatementExecutor,
};
use strata_core::schema::Snapshot;

use super::catalog::MigrationCatalog;
use super::differ::ModelDiffer;
use super::executor::PgStatementExecutor;
use super::history::PgHistoryStore;
use super::sql::PgSqlGenerator;
use crate::db::Database;

/// Migrations applied by one `upgrade` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub applied: Vec<MigrationRecord>,
}

impl UpgradeReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Local catalog joined with the history of one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub context_key: ContextKey,
    /// Local migrations already in history, in catalog order.
    pub applied: Vec<MigrationRecord>,
    /// Local migrations not yet in history, in catalog order.
    pub pending: Vec<MigrationRecord>,
    /// History entries with no local migration of the same name.
    pub unknown: Vec<MigrationRecord>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Coordinates the catalog, the history store and the collaborators.
pub struct MigrationOrchestrator {
    catalog: MigrationCatalog,
    model: Snapshot,
    context_key: ContextKey,
    history: Arc<dyn HistoryStore>,
    executor: Arc<dyn StatementExecutor>,
    differ: Arc<dyn DiffEngine>,
    translator: Arc<dyn SqlTranslator>,
    scaffolder: Arc<dyn Scaffolder>,
    lock: Option<Arc<dyn MigrationLock>>,
}

impl MigrationOrchestrator {
    /// Start building an orchestrator from its required parts.
    ///
    /// The differ, translator and scaffolder default to [`ModelDiffer`],
    /// [`PgSqlGenerator`] and [`NoopScaffolder`]; no lock is taken unless one
    /// is supplied.
    pub fn builder(
        catalog: MigrationCatalog,
        model: Snapshot,
        context_key: ContextKey,
        history: Arc<dyn HistoryStore>,
        executor: Arc<dyn StatementExecutor>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            catalog,
            model,
            context_key,
            history,
            executor,
            differ: None,
            translator: None,
            scaffolder: None,
            lock: None,
        }
    }

    /// Builder wired to PostgreSQL history and execution on `db`'s pool.
    pub fn postgres(
        db: &Database,
        catalog: MigrationCatalog,
        model: Snapshot,
        context_key: ContextKey,
    ) -> OrchestratorBuilder {
        Self::builder(
            catalog,
            model,
            context_key,
            Arc::new(PgHistoryStore::new(db.pool().clone())),
            Arc::new(PgStatementExecutor::new(db.pool().clone())),
        )
    }

    pub fn catalog(&self) -> &MigrationCatalog {
        &self.catalog
    }

    pub fn context_key(&self) -> &ContextKey {
        &self.context_key
    }

    /// Author a migration from the catalog snapshot to the live model.
    ///
    /// Hands the result to the scaffolder and returns it. Touches no database.
    pub fn add_migration(&self, name: &str) -> Result<MigrationMetadata> {
        self.add_migration_at(name, Utc::now())
    }

    /// [`add_migration`](Self::add_migration) with an explicit creation time.
    pub fn add_migration_at(&self, name: &str, now: DateTime<Utc>) -> Result<MigrationMetadata> {
        let name = name.trim();
        validate_name(name)?;

        if self.catalog.contains(name) {
            return Err(StrataError::InvalidName(format!(
                "a migration named '{}' already exists in '{}'",
                name,
                self.catalog.namespace()
            )));
        }

        let source = self.catalog.current_snapshot().cloned();
        let target = self.model.clone();

        let (upgrade, downgrade) = match source {
            Some(ref source) => (
                self.differ.diff(source, &target),
                self.differ.diff(&target, source),
            ),
            None => (
                self.differ.diff_from_empty(&target),
                self.differ.diff_to_empty(&target),
            ),
        };

        if upgrade.is_empty() {
            warn!("Migration '{}' has no operations; the model is unchanged", name);
        }

        let migration = MigrationMetadata::new(name, migration_timestamp(now))
            .with_models(source, target)
            .with_upgrade(upgrade)
            .with_downgrade(downgrade);

        self.scaffolder.emit_migration(&migration)?;
        info!(
            "Added migration {} ({} operations)",
            migration.file_stem(),
            migration.upgrade_operations.len()
        );

        Ok(migration)
    }

    /// Every migration in the catalog, ascending by timestamp.
    pub fn local_migrations(&self) -> &[MigrationMetadata] {
        self.catalog.list_migrations()
    }

    /// Migrations recorded in history for this context.
    pub async fn database_migrations(&self) -> Result<Vec<MigrationRecord>> {
        self.history.list_applied(&self.context_key).await
    }

    /// Catalog migrations whose name is not in history, in catalog order.
    pub async fn pending_migrations(&self) -> Result<Vec<&MigrationMetadata>> {
        let applied = self.database_migrations().await?;
        let applied: HashSet<&str> = applied.iter().map(|m| m.name.as_str()).collect();

        Ok(self
            .catalog
            .list_migrations()
            .iter()
            .filter(|m| !applied.contains(m.name.as_str()))
            .collect())
    }

    pub async fn status(&self) -> Result<MigrationStatus> {
        let history = self.database_migrations().await?;
        let recorded: HashSet<&str> = history.iter().map(|m| m.name.as_str()).collect();

        let (applied, pending): (Vec<_>, Vec<_>) = self
            .catalog
            .list_migrations()
            .iter()
            .map(MigrationMetadata::record)
            .partition(|m| recorded.contains(m.name.as_str()));

        let unknown = history
            .iter()
            .filter(|m| !self.catalog.contains(&m.name))
            .cloned()
            .collect();

        Ok(MigrationStatus {
            context_key: self.context_key.clone(),
            applied,
            pending,
            unknown,
        })
    }

    /// Apply every pending migration in order.
    pub async fn upgrade(&self) -> Result<UpgradeReport> {
        if let Some(ref lock) = self.lock {
            lock.acquire().await?;
        }

        let result = self.upgrade_inner().await;

        // Always release lock, even on error
        if let Some(ref lock) = self.lock {
            if let Err(e) = lock.release().await {
                warn!("Failed to release migration lock: {}", e);
            }
        }

        result
    }

    async fn upgrade_inner(&self) -> Result<UpgradeReport> {
        let mut recorded: HashSet<String> = self
            .database_migrations()
            .await?
            .into_iter()
            .map(|m| m.name)
            .collect();

        let pending: Vec<&MigrationMetadata> = self
            .catalog
            .list_migrations()
            .iter()
            .filter(|m| !recorded.contains(&m.name))
            .collect();

        if pending.is_empty() {
            info!("No pending migrations for {}", self.context_key);
            return Ok(UpgradeReport::default());
        }

        debug!(
            "Pending migrations for {}: {:?}",
            self.context_key,
            pending.iter().map(|m| &m.name).collect::<Vec<_>>()
        );

        let mut report = UpgradeReport::default();
        let mut outcome = Ok(());

        for migration in pending {
            if let Err(e) = self.apply_migration(migration).await {
                outcome = Err(e);
                break;
            }
            report.applied.push(migration.record());
            recorded.insert(migration.name.clone());
        }

        // The snapshot follows the newest recorded migration, which is not
        // necessarily the last one applied in this run.
        let newest = self
            .catalog
            .list_migrations()
            .iter()
            .rev()
            .find(|m| recorded.contains(&m.name))
            .filter(|_| !report.is_empty());

        if let Some(migration) = newest {
            let emitted = self.scaffolder.emit_snapshot(&migration.target_model);
            match (&outcome, emitted) {
                (Ok(()), Err(e)) => return Err(e),
                (Err(_), Err(e)) => warn!("Failed to write model snapshot: {}", e),
                _ => {}
            }
        }

        outcome.map(|()| report)
    }

    async fn apply_migration(&self, migration: &MigrationMetadata) -> Result<()> {
        info!("Applying migration: {}", migration.name);

        let statements = self
            .translator
            .generate_idempotent_sql(&migration.upgrade_operations);

        self.executor
            .execute(&statements)
            .await
            .map_err(|e| StrataError::Execution {
                migration: migration.name.clone(),
                source: Box::new(e),
            })?;

        self.history
            .record_applied(&self.context_key, &migration.record())
            .await?;

        info!("Migration applied: {}", migration.name);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StrataError::InvalidName(
            "migration name must not be blank".into(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StrataError::InvalidName(format!(
            "'{}' may only contain ASCII letters, digits, '_' and '-'",
            name
        )));
    }
    Ok(())
}

/// Optional collaborators of a [`MigrationOrchestrator`].
pub struct OrchestratorBuilder {
    catalog: MigrationCatalog,
    model: Snapshot,
    context_key: ContextKey,
    history: Arc<dyn HistoryStore>,
    executor: Arc<dyn StatementExecutor>,
    differ: Option<Arc<dyn DiffEngine>>,
    translator: Option<Arc<dyn SqlTranslator>>,
    scaffolder: Option<Arc<dyn Scaffolder>>,
    lock: Option<Arc<dyn MigrationLock>>,
}

impl OrchestratorBuilder {
    pub fn differ(mut self, differ: Arc<dyn DiffEngine>) -> Self {
        self.differ = Some(differ);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn SqlTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn scaffolder(mut self, scaffolder: Arc<dyn Scaffolder>) -> Self {
        self.scaffolder = Some(scaffolder);
        self
    }

    /// Hold `lock` for the duration of every upgrade.
    pub fn lock(mut self, lock: Arc<dyn MigrationLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn build(self) -> MigrationOrchestrator {
        MigrationOrchestrator {
            catalog: self.catalog,
            model: self.model,
            context_key: self.context_key,
            history: self.history,
            executor: self.executor,
            differ: self.differ.unwrap_or_else(|| Arc::new(ModelDiffer)),
            translator: self.translator.unwrap_or_else(|| Arc::new(PgSqlGenerator)),
            scaffolder: self.scaffolder.unwrap_or_else(|| Arc::new(NoopScaffolder)),
            lock: self.lock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use strata_core::migration::Operation;
    use strata_core::schema::{ColumnDef, IndexDef, SqlType, TableDef};
    use strata_core::testing::{
        MemoryHistoryStore, RecordingExecutor, RecordingLock, RecordingScaffolder,
    };

    fn table(name: &str) -> TableDef {
        TableDef::new(name)
            .column(ColumnDef::new("id", SqlType::BigSerial).not_null())
            .primary_key(["id"])
    }

    /// A migration creating table `t<n>` on top of `t1..t<n-1>`.
    fn create_table_migration(n: u32) -> MigrationMetadata {
        let source = (1..n).fold(Snapshot::new(), |s, i| s.with_table(table(&format!("t{i}"))));
        let target = source.clone().with_table(table(&format!("t{n}")));
        MigrationMetadata::new(format!("M{n}"), format!("2024010{n}0000000"))
            .with_upgrade(ModelDiffer.diff(&source, &target))
            .with_downgrade(ModelDiffer.diff(&target, &source))
            .with_models(Some(source), target)
    }

    fn catalog(count: u32) -> MigrationCatalog {
        MigrationCatalog::new("app", (1..=count).map(create_table_migration).collect(), vec![])
            .unwrap()
    }

    fn key(k: &str) -> ContextKey {
        ContextKey::new(k).unwrap()
    }

    struct Harness {
        history: Arc<MemoryHistoryStore>,
        executor: Arc<RecordingExecutor>,
        scaffolder: Arc<RecordingScaffolder>,
        lock: Arc<RecordingLock>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_history(MemoryHistoryStore::new())
        }

        fn with_history(history: MemoryHistoryStore) -> Self {
            Self {
                history: Arc::new(history),
                executor: Arc::new(RecordingExecutor::new()),
                scaffolder: Arc::new(RecordingScaffolder::new()),
                lock: Arc::new(RecordingLock::new()),
            }
        }

        fn orchestrator(&self, catalog: MigrationCatalog, context: &str) -> MigrationOrchestrator {
            self.orchestrator_with_model(catalog, Snapshot::new(), context)
        }

        fn orchestrator_with_model(
            &self,
            catalog: MigrationCatalog,
            model: Snapshot,
            context: &str,
        ) -> MigrationOrchestrator {
            MigrationOrchestrator::builder(
                catalog,
                model,
                key(context),
                self.history.clone(),
                self.executor.clone(),
            )
            .scaffolder(self.scaffolder.clone())
            .lock(self.lock.clone())
            .build()
        }
    }

    fn names(migrations: &[&MigrationMetadata]) -> Vec<String> {
        migrations.iter().map(|m| m.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_missing_history_table_means_everything_pending() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(catalog(3), "app");

        let pending = orchestrator.pending_migrations().await.unwrap();
        assert_eq!(names(&pending), vec!["M1", "M2", "M3"]);
        assert!(!h.history.table_exists());
    }

    #[tokio::test]
    async fn test_pending_is_deterministic() {
        let h = Harness::with_history(MemoryHistoryStore::with_applied(
            &key("app"),
            &[MigrationRecord::new("M1", "202401010000000")],
        ));
        let orchestrator = h.orchestrator(catalog(3), "app");

        let first = names(&orchestrator.pending_migrations().await.unwrap());
        let second = names(&orchestrator.pending_migrations().await.unwrap());
        assert_eq!(first, second);
        assert_eq!(first, vec!["M2", "M3"]);
    }

    #[tokio::test]
    async fn test_pending_preserves_order_with_gaps() {
        let h = Harness::with_history(MemoryHistoryStore::with_applied(
            &key("app"),
            &[
                MigrationRecord::new("M2", "202401020000000"),
                MigrationRecord::new("Removed", "202312310000000"),
            ],
        ));
        let orchestrator = h.orchestrator(catalog(3), "app");

        let pending = orchestrator.pending_migrations().await.unwrap();
        assert_eq!(names(&pending), vec!["M1", "M3"]);
    }

    #[tokio::test]
    async fn test_nothing_pending_is_noop() {
        let applied: Vec<_> = catalog(2)
            .list_migrations()
            .iter()
            .map(MigrationMetadata::record)
            .collect();
        let h = Harness::with_history(MemoryHistoryStore::with_applied(&key("app"), &applied));
        let orchestrator = h.orchestrator(catalog(2), "app");

        let report = orchestrator.upgrade().await.unwrap();
        assert!(report.is_empty());
        assert!(h.executor.executed().is_empty());
        assert!(h.scaffolder.snapshots().is_empty());
        assert_eq!(h.history.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_upgrade_applies_and_records_in_order() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(catalog(3), "app");

        let report = orchestrator.upgrade().await.unwrap();
        let applied: Vec<_> = report.applied.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(applied, vec!["M1", "M2", "M3"]);
        assert_eq!(h.history.applied_names(&key("app")), vec!["M1", "M2", "M3"]);

        let executed = h.executor.executed();
        assert_eq!(executed.len(), 3);
        assert!(executed[0].contains("\"t1\""));
        assert!(executed[2].contains("\"t3\""));

        assert_eq!(
            h.scaffolder.snapshots(),
            vec![create_table_migration(3).target_model]
        );
        assert!(orchestrator.pending_migrations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_progress() {
        let h = Harness::new();
        h.executor.fail_when("\"t2\"");
        let orchestrator = h.orchestrator(catalog(3), "app");

        let err = orchestrator.upgrade().await.unwrap_err();
        assert_eq!(err.failed_migration(), Some("M2"));
        assert!(matches!(err, StrataError::Execution { .. }));

        assert_eq!(h.history.applied_names(&key("app")), vec!["M1"]);
        assert_eq!(h.executor.count_matching("\"t3\""), 0);
        assert_eq!(
            h.scaffolder.snapshots(),
            vec![create_table_migration(1).target_model]
        );
        assert!(h.lock.is_balanced());
    }

    #[tokio::test]
    async fn test_late_applied_migration_keeps_newest_snapshot() {
        let h = Harness::with_history(MemoryHistoryStore::with_applied(
            &key("app"),
            &[
                MigrationRecord::new("M2", "202401020000000"),
                MigrationRecord::new("M3", "202401030000000"),
            ],
        ));
        let orchestrator = h.orchestrator(catalog(3), "app");

        let report = orchestrator.upgrade().await.unwrap();
        assert_eq!(report.applied, vec![MigrationRecord::new("M1", "202401010000000")]);

        let snapshots = h.scaffolder.snapshots();
        assert_eq!(snapshots, vec![create_table_migration(3).target_model]);
        let tables: Vec<_> = snapshots[0].tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn test_rerun_after_failure_resumes() {
        let h = Harness::new();
        h.executor.fail_when("\"t2\"");
        let orchestrator = h.orchestrator(catalog(3), "app");
        assert!(orchestrator.upgrade().await.is_err());

        h.executor.clear_failures();
        let report = orchestrator.upgrade().await.unwrap();

        let applied: Vec<_> = report.applied.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(applied, vec!["M2", "M3"]);
        assert_eq!(h.history.applied_names(&key("app")), vec!["M1", "M2", "M3"]);
        assert_eq!(h.executor.count_matching("\"t1\""), 1);
        assert_eq!(h.lock.acquired(), 2);
        assert!(h.lock.is_balanced());
    }

    #[tokio::test]
    async fn test_executed_but_unrecorded_runs_again() {
        let h = Harness::new();
        h.history.fail_record_of("M1");
        let orchestrator = h.orchestrator(catalog(1), "app");

        assert!(orchestrator.upgrade().await.is_err());
        assert_eq!(h.executor.count_matching("\"t1\""), 1);
        assert!(h.history.applied_names(&key("app")).is_empty());

        h.history.clear_failures();
        orchestrator.upgrade().await.unwrap();

        // The guarded DDL runs twice; only one history row is written.
        assert_eq!(h.executor.count_matching("CREATE TABLE IF NOT EXISTS \"t1\""), 2);
        assert_eq!(h.history.applied_names(&key("app")), vec!["M1"]);
    }

    #[tokio::test]
    async fn test_contexts_are_isolated() {
        let h = Harness::new();
        let blog = h.orchestrator(catalog(2), "Blog");
        let shop = h.orchestrator(catalog(2), "Shop");

        blog.upgrade().await.unwrap();

        assert!(blog.pending_migrations().await.unwrap().is_empty());
        assert_eq!(
            names(&shop.pending_migrations().await.unwrap()),
            vec!["M1", "M2"]
        );

        shop.upgrade().await.unwrap();
        assert_eq!(h.history.entries().len(), 4);
    }

    #[tokio::test]
    async fn test_status_joins_catalog_and_history() {
        let h = Harness::with_history(MemoryHistoryStore::with_applied(
            &key("app"),
            &[
                MigrationRecord::new("M1", "202401010000000"),
                MigrationRecord::new("Gone", "202312010000000"),
            ],
        ));
        let orchestrator = h.orchestrator(catalog(2), "app");

        let status = orchestrator.status().await.unwrap();
        assert_eq!(status.applied, vec![MigrationRecord::new("M1", "202401010000000")]);
        assert_eq!(status.pending, vec![MigrationRecord::new("M2", "202401020000000")]);
        assert_eq!(status.unknown, vec![MigrationRecord::new("Gone", "202312010000000")]);
        assert!(!status.is_up_to_date());

        assert_eq!(orchestrator.local_migrations().len(), 2);
        assert_eq!(orchestrator.database_migrations().await.unwrap().len(), 2);
    }

    fn blog_model() -> Snapshot {
        Snapshot::new()
            .with_table(
                TableDef::new("posts")
                    .column(ColumnDef::new("id", SqlType::Uuid).not_null())
                    .column(ColumnDef::new("title", SqlType::Varchar(Some(200))).not_null())
                    .primary_key(["id"]),
            )
            .with_index(IndexDef::new("idx_posts_title", "posts", ["title"]))
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_add_migration_from_empty_baseline() {
        let h = Harness::new();
        let orchestrator =
            h.orchestrator_with_model(MigrationCatalog::empty("app"), blog_model(), "app");

        let migration = orchestrator.add_migration_at("Init", at(9)).unwrap();

        assert_eq!(migration.timestamp, "202403010900000");
        assert!(migration.source_model.is_none());
        assert_eq!(migration.target_model, blog_model());
        assert_eq!(
            migration.upgrade_operations,
            ModelDiffer.diff_from_empty(&blog_model())
        );
        assert_eq!(
            migration.downgrade_operations,
            ModelDiffer.diff_to_empty(&blog_model())
        );
        assert_eq!(h.scaffolder.migrations(), vec![migration]);
        assert!(h.executor.executed().is_empty());
    }

    #[tokio::test]
    async fn test_authored_migration_round_trips() {
        let previous = Snapshot::new().with_table(
            TableDef::new("posts")
                .column(ColumnDef::new("id", SqlType::Uuid).not_null())
                .column(ColumnDef::new("body", SqlType::Text))
                .primary_key(["id"]),
        );
        let init = MigrationMetadata::new("Init", "202401010000000")
            .with_models(None, previous.clone());
        let catalog = MigrationCatalog::new("app", vec![init], vec![previous.clone()]).unwrap();

        let h = Harness::new();
        let orchestrator = h.orchestrator_with_model(catalog, blog_model(), "app");
        let migration = orchestrator.add_migration_at("AddTitle", at(10)).unwrap();

        assert_eq!(migration.source_model.as_ref(), Some(&previous));

        let mut model = previous.clone();
        model.apply(&migration.upgrade_operations);
        assert!(ModelDiffer.equivalent(&model, &blog_model()));

        model.apply(&migration.downgrade_operations);
        assert!(ModelDiffer.equivalent(&model, &previous));
    }

    #[tokio::test]
    async fn test_add_migration_rejects_bad_names() {
        let h = Harness::new();
        let orchestrator = h.orchestrator_with_model(catalog(2), blog_model(), "app");

        for name in ["", "   ", "M1", "has space", "../escape"] {
            assert!(
                matches!(
                    orchestrator.add_migration_at(name, at(11)),
                    Err(StrataError::InvalidName(_))
                ),
                "{name:?}"
            );
        }
        assert!(h.scaffolder.migrations().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_record_surfaces() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(catalog(1), "app");
        orchestrator.upgrade().await.unwrap();

        let err = h
            .history
            .record_applied(&key("app"), &MigrationRecord::new("M1", "202401010000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::DuplicateMigration { .. }));
    }

    #[tokio::test]
    async fn test_defaults_without_lock() {
        let history = Arc::new(MemoryHistoryStore::new());
        let executor = Arc::new(RecordingExecutor::new());
        let orchestrator = MigrationOrchestrator::builder(
            catalog(1),
            Snapshot::new(),
            key("app"),
            history.clone(),
            executor.clone(),
        )
        .build();

        orchestrator.upgrade().await.unwrap();
        assert_eq!(
            executor.executed(),
            PgSqlGenerator.generate_idempotent_sql(&create_table_migration(1).upgrade_operations)
        );
        assert_eq!(orchestrator.context_key().as_str(), "app");
        assert_eq!(orchestrator.catalog().len(), 1);
    }
}
