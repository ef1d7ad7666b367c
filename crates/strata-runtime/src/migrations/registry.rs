use strata_core::error::Result;
use strata_core::migration::MigrationMetadata;
use strata_core::schema::Snapshot;

use super::catalog::MigrationCatalog;

/// Constructor of a compiled-in migration.
pub type MigrationFactory = fn() -> MigrationMetadata;

/// Constructor of a compiled-in model snapshot.
pub type SnapshotFactory = fn() -> Snapshot;

/// Explicit registration of migrations and snapshots that live in code.
///
/// # Example
///
/// ```ignore
/// let mut registry = MigrationRegistry::new();
/// registry
///     .register_migration("blog", m202401010000000_init::migration)
///     .register_snapshot("blog", blog_snapshot::model);
///
/// let catalog = registry.catalog("blog")?;
/// ```
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<(String, MigrationFactory)>,
    snapshots: Vec<(String, SnapshotFactory)>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_migration(
        &mut self,
        namespace: impl Into<String>,
        factory: MigrationFactory,
    ) -> &mut Self {
        self.migrations.push((namespace.into(), factory));
        self
    }

    pub fn register_snapshot(
        &mut self,
        namespace: impl Into<String>,
        factory: SnapshotFactory,
    ) -> &mut Self {
        self.snapshots.push((namespace.into(), factory));
        self
    }

    /// Construct everything registered under `namespace` and build its catalog.
    pub fn catalog(&self, namespace: &str) -> Result<MigrationCatalog> {
        let migrations = self
            .migrations
            .iter()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, factory)| factory())
            .collect();

        let snapshots = self
            .snapshots
            .iter()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, factory)| factory())
            .collect();

        MigrationCatalog::new(namespace, migrations, snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::error::StrataError;

    fn init() -> MigrationMetadata {
        MigrationMetadata::new("Init", "202401010000000")
    }

    fn add_posts() -> MigrationMetadata {
        MigrationMetadata::new("AddPosts", "202401020000000")
    }

    fn other() -> MigrationMetadata {
        MigrationMetadata::new("Other", "202401015000000")
    }

    #[test]
    fn test_catalog_filters_by_namespace() {
        let mut registry = MigrationRegistry::new();
        registry
            .register_migration("blog", add_posts)
            .register_migration("shop", other)
            .register_migration("blog", init)
            .register_snapshot("blog", Snapshot::new);

        let catalog = registry.catalog("blog").unwrap();
        let names: Vec<_> = catalog.list_migrations().iter().map(|m| &m.name).collect();
        assert_eq!(names, vec!["Init", "AddPosts"]);
        assert!(catalog.current_snapshot().is_some());

        let shop = registry.catalog("shop").unwrap();
        assert_eq!(shop.len(), 1);
        assert!(shop.current_snapshot().is_none());
    }

    #[test]
    fn test_two_snapshots_in_namespace_is_discovery_error() {
        let mut registry = MigrationRegistry::new();
        registry
            .register_snapshot("blog", Snapshot::new)
            .register_snapshot("blog", Snapshot::default);

        assert!(matches!(
            registry.catalog("blog"),
            Err(StrataError::Discovery(_))
        ));
        // Other namespaces are unaffected.
        assert!(registry.catalog("shop").unwrap().is_empty());
    }
}
