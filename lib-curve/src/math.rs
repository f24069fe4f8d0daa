//! Fixed-Point Arithmetic Core
//!
//! Checked operations over unsigned 256-bit integers.
//!
//! # Rules (enforced in code)
//!
//! - Overflow on add/mul and underflow on sub fail with `ArithmeticOverflow`
//! - Nothing wraps and nothing saturates
//! - Division is floor division; a zero divisor fails with `DivisionByZero`
//! - Operation order is part of the contract: `bps_of` multiplies before it divides

use primitive_types::U256;

use crate::errors::{CurveError, CurveResult};

/// Basis-point denominator (10_000 bps = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

#[inline]
pub fn checked_add(a: U256, b: U256) -> CurveResult<U256> {
    a.checked_add(b).ok_or(CurveError::ArithmeticOverflow)
}

#[inline]
pub fn checked_sub(a: U256, b: U256) -> CurveResult<U256> {
    a.checked_sub(b).ok_or(CurveError::ArithmeticOverflow)
}

#[inline]
pub fn checked_mul(a: U256, b: U256) -> CurveResult<U256> {
    a.checked_mul(b).ok_or(CurveError::ArithmeticOverflow)
}

/// Floor division
#[inline]
pub fn checked_div(a: U256, b: U256) -> CurveResult<U256> {
    a.checked_div(b).ok_or(CurveError::DivisionByZero)
}

/// `value * bps / 10_000`, floored
///
/// The product is taken first so no precision is lost before the division.
pub fn bps_of(value: U256, bps: u16) -> CurveResult<U256> {
    let scaled = checked_mul(value, U256::from(bps))?;
    checked_div(scaled, U256::from(BPS_DENOMINATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_overflow_detected() {
        assert_eq!(
            checked_add(U256::MAX, U256::one()),
            Err(CurveError::ArithmeticOverflow)
        );
        assert_eq!(checked_add(U256::from(2u64), U256::from(3u64)), Ok(U256::from(5u64)));
    }

    #[test]
    fn test_sub_underflow_detected() {
        assert_eq!(
            checked_sub(U256::zero(), U256::one()),
            Err(CurveError::ArithmeticOverflow)
        );
        assert_eq!(checked_sub(U256::from(5u64), U256::from(5u64)), Ok(U256::zero()));
    }

    #[test]
    fn test_mul_overflow_detected() {
        let two = U256::from(2u64);
        let half = two.pow(U256::from(128u64));
        assert_eq!(checked_mul(half, half), Err(CurveError::ArithmeticOverflow));
        assert_eq!(
            checked_mul(half, two),
            Ok(two.pow(U256::from(129u64)))
        );
    }

    #[test]
    fn test_div_is_floor() {
        assert_eq!(checked_div(U256::from(7u64), U256::from(2u64)), Ok(U256::from(3u64)));
        assert_eq!(
            checked_div(U256::from(7u64), U256::zero()),
            Err(CurveError::DivisionByZero)
        );
    }

    #[test]
    fn test_bps_of() {
        // 1% of 105_000
        assert_eq!(bps_of(U256::from(105_000u64), 100), Ok(U256::from(1_050u64)));
        // 0.3% of 999 = 2.997 -> 2
        assert_eq!(bps_of(U256::from(999u64), 30), Ok(U256::from(2u64)));
        assert_eq!(bps_of(U256::from(999u64), 0), Ok(U256::zero()));
        assert_eq!(bps_of(U256::MAX, 2), Err(CurveError::ArithmeticOverflow));
    }
}
