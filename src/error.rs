//! Error handling module
//!
//! Provides the unified error type surfaced by every upgrade operation.

use thiserror::Error;

/// Boxed driver error carried unchanged inside [`UpgradeError`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// A required connection field is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading the live schema failed
    #[error("Introspection failed")]
    Introspection(#[source] BoxError),

    /// A generated statement failed to apply
    #[error("Statement failed: {statement}")]
    Execution {
        statement: String,
        #[source]
        source: BoxError,
    },

    /// The schema model would produce invalid or ambiguous SQL
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Database error")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error")]
    Pool(#[from] deadpool_postgres::PoolError),
}

impl UpgradeError {
    /// Wrap a driver failure raised while reading metadata
    pub fn introspection(source: impl Into<BoxError>) -> Self {
        UpgradeError::Introspection(source.into())
    }

    /// Wrap a driver failure raised while applying `statement`
    pub fn execution(statement: impl Into<String>, source: impl Into<BoxError>) -> Self {
        UpgradeError::Execution {
            statement: statement.into(),
            source: source.into(),
        }
    }
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, UpgradeError>;

/// Helper function to create a configuration error
pub fn configuration_error(msg: impl Into<String>) -> UpgradeError {
    UpgradeError::Configuration(msg.into())
}

/// Helper function to create a data integrity error
pub fn integrity_error(msg: impl Into<String>) -> UpgradeError {
    UpgradeError::DataIntegrity(msg.into())
}
