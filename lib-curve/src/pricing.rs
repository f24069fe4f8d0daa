//! Bonding Curve Pricing Model
//!
//! Closed-form integrals of the linear price function.
//!
//! # Evaluation order (part of the contract)
//!
//! For a move between supply `lo` and `hi` (`hi = lo + amount`):
//!
//! ```text
//!   hi_sq  = hi × hi
//!   lo_sq  = lo × lo
//!   diff   = hi_sq − lo_sq
//!   curve  = (slope × diff) / 2        (floor)
//!   linear = base_price × amount
//!   value  = linear + curve
//! ```
//!
//! The squares are taken before the subtraction. The algebraically equal
//! expansion `amount × (2·lo + amount)` is NOT used, so any other
//! implementation must evaluate in exactly this order to reproduce results
//! bit for bit. Buying `amount` from `lo` and selling `amount` from `hi`
//! evaluate the identical expression, which is what makes the inverse law exact.

use primitive_types::U256;

use crate::errors::{CurveError, CurveResult};
use crate::math::{checked_add, checked_div, checked_mul, checked_sub, BPS_DENOMINATOR};
use crate::types::PoolConfig;

/// Instantaneous price at `tokens_sold`
pub fn current_price(config: &PoolConfig, tokens_sold: U256) -> CurveResult<U256> {
    let slope_component = checked_mul(config.slope, tokens_sold)?;
    checked_add(config.base_price, slope_component)
}

/// Cost of moving supply from `tokens_sold` up to `tokens_sold + amount`
pub fn buy_cost(config: &PoolConfig, tokens_sold: U256, amount: U256) -> CurveResult<U256> {
    if amount.is_zero() {
        return Ok(U256::zero());
    }

    let hi = checked_add(tokens_sold, amount)?;
    span_value(config, tokens_sold, hi, amount)
}

/// Return for moving supply from `tokens_sold` down to `tokens_sold - amount`
pub fn sell_return(config: &PoolConfig, tokens_sold: U256, amount: U256) -> CurveResult<U256> {
    if amount > tokens_sold {
        return Err(CurveError::InsufficientSupply {
            requested: amount,
            available: tokens_sold,
        });
    }
    if amount.is_zero() {
        return Ok(U256::zero());
    }

    let lo = checked_sub(tokens_sold, amount)?;
    span_value(config, lo, tokens_sold, amount)
}

/// Area under the curve between `lo` and `hi`
fn span_value(config: &PoolConfig, lo: U256, hi: U256, amount: U256) -> CurveResult<U256> {
    let hi_sq = checked_mul(hi, hi)?;
    let lo_sq = checked_mul(lo, lo)?;
    let diff = checked_sub(hi_sq, lo_sq)?;
    let curve = checked_div(checked_mul(config.slope, diff)?, U256::from(2u64))?;
    let linear = checked_mul(config.base_price, amount)?;
    checked_add(linear, curve)
}

/// Average unit price of a buy of `amount` at `tokens_sold` (floor)
///
/// A zero amount has no average; the marginal price is returned instead.
pub fn average_price(config: &PoolConfig, tokens_sold: U256, amount: U256) -> CurveResult<U256> {
    if amount.is_zero() {
        return current_price(config, tokens_sold);
    }
    checked_div(buy_cost(config, tokens_sold, amount)?, amount)
}

/// Progress toward migration in basis points, capped at 10_000
pub fn progress_bps(config: &PoolConfig, tokens_sold: U256) -> CurveResult<u16> {
    if config.migration_threshold.is_zero() {
        return Ok(BPS_DENOMINATOR as u16);
    }

    let scaled = checked_mul(tokens_sold, U256::from(BPS_DENOMINATOR))?;
    let bps = checked_div(scaled, config.migration_threshold)?;
    if bps >= U256::from(BPS_DENOMINATOR) {
        Ok(BPS_DENOMINATOR as u16)
    } else {
        Ok(bps.low_u64() as u16)
    }
}
