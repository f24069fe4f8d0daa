//! Curve Errors

use primitive_types::U256;
use thiserror::Error;

/// Error during curve arithmetic or parameter validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply { requested: U256, available: U256 },

    #[error("Invalid curve config: {0}")]
    InvalidConfig(String),
}

/// Result type for curve operations
pub type CurveResult<T> = Result<T, CurveError>;
