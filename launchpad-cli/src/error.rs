//! Structured error types for the launchpad CLI

use lib_curve::CurveError;
use lib_launchpad::{LaunchError, LedgerError, StoreError};
use thiserror::Error;

/// Launchpad CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    // Engine operations
    #[error("Launch operation failed: {0}")]
    Launch(#[from] LaunchError),

    #[error("Wallet operation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Curve calculation failed: {0}")]
    Curve(#[from] CurveError),

    #[error("Failed to open database at {path}: {reason}")]
    DatabaseOpenFailed { path: String, reason: String },

    // Configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // I/O operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl From<String> for CliError {
    fn from(s: String) -> Self {
        CliError::Other(s)
    }
}

impl From<&str> for CliError {
    fn from(s: &str) -> Self {
        CliError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lib_launchpad::PoolId;

    #[test]
    fn test_launch_error_wraps_message() {
        let err: CliError = LaunchError::PoolNotFound(PoolId(7)).into();
        assert_eq!(err.to_string(), "Launch operation failed: Pool 7 not found");
    }

    #[test]
    fn test_database_open_error() {
        let err = CliError::DatabaseOpenFailed {
            path: "/tmp/launchpad".to_string(),
            reason: "locked".to_string(),
        };
        assert!(err.to_string().contains("/tmp/launchpad"));
        assert!(err.to_string().contains("locked"));
    }
}
