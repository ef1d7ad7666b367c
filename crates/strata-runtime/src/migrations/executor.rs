use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use strata_core::error::{Result, StrataError};
use strata_core::migration::StatementExecutor;

/// Runs statements one by one on the pool, each in its own implicit transaction.
#[derive(Clone)]
pub struct PgStatementExecutor {
    pool: PgPool,
}

impl PgStatementExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatementExecutor for PgStatementExecutor {
    async fn execute(&self, statements: &[String]) -> Result<()> {
        for (i, statement) in statements.iter().enumerate() {
            debug!("Executing statement {}/{}", i + 1, statements.len());

            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    StrataError::Database(format!("Statement {} failed: {}", i + 1, e))
                })?;
        }
        Ok(())
    }
}
