//! Cross-process upgrade serialization.
//!
//! PostgreSQL advisory locks belong to a session. The lock opens its own
//! connection with the pool's connect options and keeps it until release,
//! so the pool stays fully available to the upgrade it guards.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, PgPool};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use strata_core::error::{Result, StrataError};
use strata_core::migration::MigrationLock;

/// Lock ID for the migration advisory lock ("STRATA" in hex).
pub const MIGRATION_LOCK_ID: i64 = 0x535452415441;

/// Session-level `pg_advisory_lock` held on a connection outside the pool.
pub struct PgAdvisoryLock {
    options: PgConnectOptions,
    lock_id: i64,
    held: Mutex<Option<PgConnection>>,
}

impl PgAdvisoryLock {
    /// Lock on the database `pool` connects to.
    pub fn new(pool: &PgPool) -> Self {
        Self::with_options((*pool.connect_options()).clone(), MIGRATION_LOCK_ID)
    }

    pub fn with_options(options: PgConnectOptions, lock_id: i64) -> Self {
        Self {
            options,
            lock_id,
            held: Mutex::new(None),
        }
    }

    pub fn lock_id(&self) -> i64 {
        self.lock_id
    }

    pub fn connect_options(&self) -> &PgConnectOptions {
        &self.options
    }

    /// Whether this instance currently holds the lock.
    pub async fn is_held(&self) -> bool {
        self.held.lock().await.is_some()
    }
}

#[async_trait]
impl MigrationLock for PgAdvisoryLock {
    async fn acquire(&self) -> Result<()> {
        let mut held = self.held.lock().await;
        if held.is_some() {
            return Err(StrataError::Lock("migration lock already held".into()));
        }

        debug!("Acquiring migration lock...");
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| StrataError::Lock(format!("Failed to open lock session: {}", e)))?;

        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(self.lock_id)
            .execute(&mut conn)
            .await
            .map_err(|e| StrataError::Lock(format!("Failed to acquire migration lock: {}", e)))?;

        *held = Some(conn);
        debug!("Migration lock acquired");
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        let Some(mut conn) = self.held.lock().await.take() else {
            return Ok(());
        };

        // Ending the session drops the lock even if the unlock call fails.
        let unlocked = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
            .bind(self.lock_id)
            .fetch_one(&mut conn)
            .await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close migration lock session: {}", e);
        }

        match unlocked {
            Ok(true) => {
                debug!("Migration lock released");
                Ok(())
            }
            Ok(false) => Err(StrataError::Lock(
                "migration lock was not held by this session".into(),
            )),
            Err(e) => Err(StrataError::Lock(format!(
                "Failed to release migration lock: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    fn lazy_pool(max_connections: u32) -> PgPool {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy("postgres://strata@db.internal:6543/app")
            .unwrap()
    }

    #[tokio::test]
    async fn test_release_without_acquire_is_noop() {
        let lock = PgAdvisoryLock::new(&lazy_pool(1));
        assert!(!lock.is_held().await);
        assert!(lock.release().await.is_ok());
    }

    #[tokio::test]
    async fn test_lock_targets_pool_database() {
        let pool = lazy_pool(1);
        let lock = PgAdvisoryLock::new(&pool);

        assert_eq!(lock.lock_id(), MIGRATION_LOCK_ID);
        assert_eq!(lock.connect_options().get_host(), "db.internal");
        assert_eq!(lock.connect_options().get_port(), 6543);
        assert_eq!(lock.connect_options().get_database(), Some("app"));
        // Building the lock checks nothing out of the pool.
        assert_eq!(pool.size(), 0);
    }

    /// Requires TEST_DATABASE_URL pointing at a scratch database.
    #[tokio::test]
    #[ignore]
    async fn test_single_connection_pool_stays_usable_while_locked() {
        let url = std::env::var("TEST_DATABASE_URL").unwrap();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(2))
            .connect(&url)
            .await
            .unwrap();
        let lock = PgAdvisoryLock::new(&pool);

        lock.acquire().await.unwrap();
        assert!(lock.is_held().await);
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();
        lock.release().await.unwrap();

        assert!(!lock.is_held().await);
    }
}
