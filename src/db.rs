//! Database connection helpers
//!
//! Pool construction plus the server-level maintenance helpers used before
//! an upgrade: checking whether the target database exists and creating it.

use crate::config::ServerSettings;
use crate::error::{configuration_error, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

const DATABASE_EXISTS: &str = "SELECT datname::text FROM pg_catalog.pg_database WHERE datname = $1";

/// Create a connection pool for the given settings.
///
/// Settings are validated here; no connection is opened until the pool is
/// first used.
pub fn create_pool(settings: &ServerSettings) -> Result<Pool> {
    let pg_config = settings.pg_config()?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| configuration_error(format!("Failed to create pool: {}", e)))
}

/// Whether the database named in `settings` exists on the server
pub async fn database_exists(settings: &ServerSettings) -> Result<bool> {
    let pool = create_pool(&settings.maintenance())?;
    let client = pool.get().await?;

    let rows = client.query(DATABASE_EXISTS, &[&settings.database]).await?;
    Ok(!rows.is_empty())
}

/// Create the database named in `settings` unless it already exists.
///
/// Returns whether the database was created.
pub async fn create_database(settings: &ServerSettings) -> Result<bool> {
    // Validate the target before touching the server
    settings.connection_string()?;

    if database_exists(settings).await? {
        return Ok(false);
    }

    let pool = create_pool(&settings.maintenance())?;
    let client = pool.get().await?;

    // CREATE DATABASE does not accept bind parameters
    client
        .batch_execute(&format!("CREATE DATABASE {}", quote_identifier(&settings.database)))
        .await?;

    info!("Created database {}", settings.display_name());
    Ok(true)
}

fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpgradeError;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("crm"), "\"crm\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_create_pool_rejects_incomplete_settings() {
        let err = create_pool(&ServerSettings::default()).unwrap_err();
        assert!(matches!(err, UpgradeError::Configuration(_)));
    }

    #[test]
    fn test_create_database_validates_first() {
        let settings = ServerSettings {
            host: "localhost".to_string(),
            username: "deploy".to_string(),
            password: "secret".to_string(),
            ..ServerSettings::default()
        };

        let err = tokio_test::block_on(create_database(&settings)).unwrap_err();
        assert!(matches!(err, UpgradeError::Configuration(_)));
    }
}
