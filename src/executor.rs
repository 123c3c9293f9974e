//! Statement executor
//!
//! Applies generated statements one at a time, in order. There is no
//! transaction around the batch: the first failure stops the run and is
//! returned unchanged, leaving earlier statements applied.

use crate::error::{Result, UpgradeError};
use deadpool_postgres::Pool;
use std::future::Future;
use tracing::{debug, info};

/// Runs a single DDL statement
pub trait StatementExecutor {
    fn execute(&self, statement: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Executes statements on a pooled PostgreSQL connection
pub struct PostgresExecutor {
    pool: Pool,
}

impl PostgresExecutor {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl StatementExecutor for PostgresExecutor {
    async fn execute(&self, statement: &str) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| UpgradeError::execution(statement, e))?;

        client
            .batch_execute(statement)
            .await
            .map_err(|e| UpgradeError::execution(statement, e))
    }
}

/// Execute `statements` sequentially, stopping at the first failure.
///
/// Returns the number of statements applied.
pub async fn apply_statements<E, S>(executor: &E, statements: &[S]) -> Result<usize>
where
    E: StatementExecutor,
    S: AsRef<str>,
{
    for (i, statement) in statements.iter().enumerate() {
        let statement = statement.as_ref();
        debug!("Step {}: {}", i + 1, statement);
        executor.execute(statement).await?;
    }

    info!("Applied {} statements", statements.len());
    Ok(statements.len())
}
