//! Launchpad Bonding Curve
//!
//! Pure, deterministic pricing for linear bonding-curve launch pools.
//!
//! # Design Principles
//!
//! 1. **Pure functions** - No side effects, no global state
//! 2. **Deterministic** - Same inputs produce identical outputs on every platform
//! 3. **No floats** - All arithmetic uses 256-bit unsigned integers
//! 4. **Overflow-checked** - Every operation fails instead of wrapping or saturating
//!
//! This crate is the single pricing implementation shared by the authoritative
//! engine (`lib-launchpad`) and any off-platform quote calculator. A client that
//! links this crate computes exactly the figures the engine settles.
//!
//! # Usage
//!
//! ```
//! use lib_curve::{buy_cost, current_price, sell_return, PoolConfig, U256};
//!
//! let config = PoolConfig::new(1_000u64, 10u64, 1_000_000u64, 500_000u64);
//!
//! let cost = buy_cost(&config, U256::zero(), U256::from(100u64)).unwrap();
//! assert_eq!(cost, U256::from(150_000u64));
//!
//! let price = current_price(&config, U256::from(100u64)).unwrap();
//! assert_eq!(price, U256::from(2_000u64));
//!
//! let back = sell_return(&config, U256::from(100u64), U256::from(100u64)).unwrap();
//! assert_eq!(back, cost);
//! ```

pub mod errors;
pub mod math;
pub mod pricing;
pub mod types;

#[cfg(test)]
mod golden_vectors;

pub use errors::{CurveError, CurveResult};
pub use math::{bps_of, checked_add, checked_div, checked_mul, checked_sub, BPS_DENOMINATOR};
pub use pricing::{average_price, buy_cost, current_price, progress_bps, sell_return};
pub use types::PoolConfig;

/// 256-bit unsigned integer used for every amount, price and balance
pub use primitive_types::U256;
