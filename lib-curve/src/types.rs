//! Bonding Curve Parameters
//!
//! A launch pool prices its units on a linear curve:
//!
//! ```text
//!   price(sold) = base_price + slope × sold
//! ```
//!
//! Parameters are immutable after the pool is created.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::errors::{CurveError, CurveResult};
use crate::math::bps_of;
use crate::pricing::{buy_cost, current_price};

/// Linear bonding-curve configuration for one launch pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Price per unit when zero units are sold (quote-asset atomic units)
    pub base_price: U256,
    /// Price increase per unit sold
    pub slope: U256,
    /// Upper bound on units that may ever be outstanding
    pub max_supply: U256,
    /// Cumulative units sold at which the pool migrates
    pub migration_threshold: U256,
}

impl PoolConfig {
    pub fn new(
        base_price: impl Into<U256>,
        slope: impl Into<U256>,
        max_supply: impl Into<U256>,
        migration_threshold: impl Into<U256>,
    ) -> Self {
        Self {
            base_price: base_price.into(),
            slope: slope.into(),
            max_supply: max_supply.into(),
            migration_threshold: migration_threshold.into(),
        }
    }

    /// Validate curve parameters
    ///
    /// Beyond the shape invariants this evaluates the whole curve once, from
    /// zero to `max_supply`, together with its fee. Every intermediate value of
    /// any legal trade is bounded by that evaluation, so a config that passes
    /// here can never overflow at trade time.
    pub fn validate(&self, fee_bps: u16) -> CurveResult<()> {
        if self.slope.is_zero() {
            return Err(CurveError::InvalidConfig("slope must be non-zero".to_string()));
        }
        if self.max_supply.is_zero() {
            return Err(CurveError::InvalidConfig("max_supply must be non-zero".to_string()));
        }
        if self.migration_threshold.is_zero() {
            return Err(CurveError::InvalidConfig(
                "migration_threshold must be non-zero".to_string(),
            ));
        }
        if self.migration_threshold > self.max_supply {
            return Err(CurveError::InvalidConfig(format!(
                "migration_threshold {} exceeds max_supply {}",
                self.migration_threshold, self.max_supply
            )));
        }

        current_price(self, self.max_supply)?;
        let full_curve = buy_cost(self, U256::zero(), self.max_supply)?;
        bps_of(full_curve, fee_bps)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> PoolConfig {
        PoolConfig::new(1_000u64, 10u64, 1_000_000u64, 500_000u64)
    }

    #[test]
    fn test_valid_config() {
        assert!(sample_config().validate(100).is_ok());
        assert!(sample_config().validate(10_000).is_ok());
    }

    #[test]
    fn test_zero_base_price_allowed() {
        let config = PoolConfig::new(0u64, 1u64, 100u64, 100u64);
        assert!(config.validate(0).is_ok());
    }

    #[test]
    fn test_zero_slope_rejected() {
        let mut config = sample_config();
        config.slope = U256::zero();
        assert!(matches!(config.validate(0), Err(CurveError::InvalidConfig(_))));
    }

    #[test]
    fn test_threshold_above_max_supply_rejected() {
        let mut config = sample_config();
        config.migration_threshold = config.max_supply + U256::one();
        assert!(matches!(config.validate(0), Err(CurveError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_supply_and_threshold_rejected() {
        let mut config = sample_config();
        config.migration_threshold = U256::zero();
        assert!(config.validate(0).is_err());

        let mut config = sample_config();
        config.max_supply = U256::zero();
        assert!(config.validate(0).is_err());
    }

    #[test]
    fn test_overflowing_curve_rejected_at_creation() {
        // max_supply^2 alone exceeds 256 bits
        let max = U256::from(2u64).pow(U256::from(128u64));
        let config = PoolConfig::new(1u64, 1u64, max, max);
        assert_eq!(config.validate(0), Err(CurveError::ArithmeticOverflow));
    }

    #[test]
    fn test_fee_overflow_rejected_at_creation() {
        // The curve itself fits, but cost * fee_bps does not
        let two = U256::from(2u64);
        let supply = two.pow(U256::from(126u64));
        let config = PoolConfig::new(0u64, 1u64, supply, supply);
        assert!(config.validate(0).is_ok());
        assert_eq!(config.validate(10_000), Err(CurveError::ArithmeticOverflow));
    }
}
