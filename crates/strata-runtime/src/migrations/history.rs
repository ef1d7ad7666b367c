//! The `__MigrationHistory` table.
//!
//! One row per applied migration per context key. The table is created the
//! first time something is recorded; until then every context has an empty
//! history.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use strata_core::error::{Result, StrataError};
use strata_core::migration::{ContextKey, HistoryStore, MigrationRecord, TableIdentity};

pub const HISTORY_TABLE: &str = "__MigrationHistory";
pub const HISTORY_SCHEMA: &str = "public";

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "public"."__MigrationHistory" (
    "MigrationName" VARCHAR(150) NOT NULL,
    "ContextKey" VARCHAR(300) NOT NULL,
    "Timestamp" VARCHAR(15) NOT NULL,
    PRIMARY KEY ("MigrationName", "ContextKey")
)
"#;

const TABLE_EXISTS_SQL: &str = r#"SELECT to_regclass('"public"."__MigrationHistory"') IS NOT NULL"#;

const SELECT_APPLIED_SQL: &str = r#"
SELECT "MigrationName", "Timestamp"
FROM "public"."__MigrationHistory"
WHERE "ContextKey" = $1
ORDER BY "Timestamp", "MigrationName"
"#;

const INSERT_SQL: &str = r#"
INSERT INTO "public"."__MigrationHistory" ("MigrationName", "ContextKey", "Timestamp")
VALUES ($1, $2, $3)
"#;

/// Context key derived from a consumer type's name.
///
/// `context_key_for::<my_app::BlogContext>()` is `BlogContext`.
pub fn context_key_for<T: ?Sized>() -> ContextKey {
    ContextKey::of::<T>()
}

/// History store backed by the migrated database itself.
pub struct PgHistoryStore {
    pool: PgPool,
    ensured: AtomicBool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ensured: AtomicBool::new(false),
        }
    }

    async fn table_exists(&self) -> Result<bool> {
        if self.ensured.load(Ordering::Acquire) {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar(TABLE_EXISTS_SQL)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to inspect history table: {}", e)))?;

        if exists {
            self.ensured.store(true, Ordering::Release);
        }
        Ok(exists)
    }

    async fn ensure_table(&self) -> Result<()> {
        if self.ensured.load(Ordering::Acquire) {
            return Ok(());
        }

        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to create history table: {}", e)))?;

        debug!("History table {} is present", self.table_identity());
        self.ensured.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    fn table_identity(&self) -> TableIdentity {
        TableIdentity::new(HISTORY_TABLE, HISTORY_SCHEMA)
    }

    async fn list_applied(&self, context_key: &ContextKey) -> Result<Vec<MigrationRecord>> {
        if !self.table_exists().await? {
            debug!("History table does not exist yet; nothing applied");
            return Ok(Vec::new());
        }

        let rows: Vec<(String, String)> = sqlx::query_as(SELECT_APPLIED_SQL)
            .bind(context_key.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to read history: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(name, timestamp)| MigrationRecord::new(name, timestamp))
            .collect())
    }

    async fn record_applied(
        &self,
        context_key: &ContextKey,
        migration: &MigrationRecord,
    ) -> Result<()> {
        self.ensure_table().await?;

        sqlx::query(INSERT_SQL)
            .bind(&migration.name)
            .bind(context_key.as_str())
            .bind(&migration.timestamp)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StrataError::DuplicateMigration {
                        name: migration.name.clone(),
                        context_key: context_key.to_string(),
                    }
                }
                other => StrataError::Database(format!(
                    "Failed to record migration '{}': {}",
                    migration.name, other
                )),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn test_sql_targets_identity() {
        let identity = TableIdentity::new(HISTORY_TABLE, HISTORY_SCHEMA).to_string();
        for sql in [CREATE_TABLE_SQL, TABLE_EXISTS_SQL, SELECT_APPLIED_SQL, INSERT_SQL] {
            assert!(sql.contains(&identity), "{sql}");
        }
    }

    #[test]
    fn test_primary_key_is_name_and_context() {
        assert!(CREATE_TABLE_SQL.contains(r#"PRIMARY KEY ("MigrationName", "ContextKey")"#));
    }

    struct BlogContext;

    #[test]
    fn test_context_key_for_type() {
        assert_eq!(context_key_for::<BlogContext>().as_str(), "BlogContext");
    }

    #[tokio::test]
    async fn test_table_identity() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        let store = PgHistoryStore::new(pool);
        assert_eq!(
            store.table_identity(),
            TableIdentity::new("__MigrationHistory", "public")
        );
    }

    /// Requires TEST_DATABASE_URL pointing at a scratch database.
    #[tokio::test]
    #[ignore]
    async fn test_round_trip_against_postgres() {
        let url = std::env::var("TEST_DATABASE_URL").unwrap();
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        sqlx::query(r#"DROP TABLE IF EXISTS "public"."__MigrationHistory""#)
            .execute(&pool)
            .await
            .unwrap();

        let store = PgHistoryStore::new(pool);
        let blog = ContextKey::new("Blog").unwrap();
        let shop = ContextKey::new("Shop").unwrap();
        let init = MigrationRecord::new("Init", "202401010000000");

        assert!(store.list_applied(&blog).await.unwrap().is_empty());

        store.record_applied(&blog, &init).await.unwrap();
        store.record_applied(&shop, &init).await.unwrap();

        assert_eq!(store.list_applied(&blog).await.unwrap(), vec![init.clone()]);
        assert!(matches!(
            store.record_applied(&blog, &init).await,
            Err(StrataError::DuplicateMigration { .. })
        ));
    }
}
