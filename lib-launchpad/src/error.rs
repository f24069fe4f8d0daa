//! Launchpad Errors
//!
//! Every failure is detected before any pool state, balance or log entry is
//! touched, and is returned to the caller as-is.

use lib_curve::{CurveError, U256};
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::store::StoreError;
use crate::types::PoolId;

/// Result type for engine operations
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Error returned by engine, quote and registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Supply exceeded: requested {requested}, available {available}")]
    SupplyExceeded { requested: U256, available: U256 },

    #[error("Insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply { requested: U256, available: U256 },

    #[error("Pool {0} has migrated; curve trading is closed")]
    PoolMigrated(PoolId),

    #[error("Slippage exceeded: computed {computed}, bound {bound}")]
    SlippageExceeded { computed: U256, bound: U256 },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Asset transfer failed: {0}")]
    TransferFailed(String),

    #[error("Pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient reserve to fund sale")]
    InsufficientReserve,

    #[error("Caller is not authorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CurveError> for LaunchError {
    fn from(err: CurveError) -> Self {
        match err {
            CurveError::ArithmeticOverflow => LaunchError::ArithmeticOverflow,
            // Only reachable with a zero divisor, which validated configs exclude
            CurveError::DivisionByZero => LaunchError::Internal(err.to_string()),
            CurveError::InsufficientSupply { requested, available } => {
                LaunchError::InsufficientSupply { requested, available }
            }
            CurveError::InvalidConfig(msg) => LaunchError::InvalidConfig(msg),
        }
    }
}

impl From<LedgerError> for LaunchError {
    fn from(err: LedgerError) -> Self {
        LaunchError::TransferFailed(err.to_string())
    }
}

impl From<StoreError> for LaunchError {
    fn from(err: StoreError) -> Self {
        match err {
            // Balance failures inside a combined commit are transfer failures
            StoreError::Settlement(err) => err.into(),
            err => LaunchError::Storage(err.to_string()),
        }
    }
}

impl LaunchError {
    /// True for failures caused by the request itself rather than the engine
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            LaunchError::TransferFailed(_) | LaunchError::Storage(_) | LaunchError::Internal(_)
        )
    }
}
