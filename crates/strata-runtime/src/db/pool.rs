use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use strata_core::config::DatabaseConfig;
use strata_core::error::{Result, StrataError};

/// Connection pool for the database being migrated.
///
/// The pool belongs to the caller; migration components borrow clones of it
/// and never close it.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(StrataError::Config("database.url is not set".into()));
        }

        let pool = Self::create_pool(&config.url, config.pool_size, config.pool_timeout_secs)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }

    /// A pool that opens no connection until first use.
    ///
    /// An empty `database.url` falls back to the libpq environment
    /// (`PGHOST`, `PGDATABASE`, ...).
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let options = if config.url.is_empty() {
            PgConnectOptions::new()
        } else {
            config
                .url
                .parse::<PgConnectOptions>()
                .map_err(|e| StrataError::Config(format!("Invalid database.url: {}", e)))?
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.max(1))
            .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn create_pool(url: &str, size: u32, timeout_secs: u64) -> sqlx::Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(size.max(1))
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .connect(url)
            .await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StrataError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
