//! Engine Configuration

use std::path::PathBuf;
use std::time::Duration;

use lib_curve::BPS_DENOMINATOR;
use serde::{Deserialize, Serialize};

use crate::error::{LaunchError, LaunchResult};
use crate::types::AccountId;

/// Default protocol fee: 1%
pub const DEFAULT_FEE_BPS: u16 = 100;

/// Engine-wide settings shared by every pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Protocol fee in basis points, applied to every trade
    pub fee_bps: u16,
    /// Account credited with protocol fees
    pub fee_receiver: AccountId,
    /// Only account allowed to migrate pools by hand
    pub admin: AccountId,
    /// Lifetime of a cached quote snapshot
    pub quote_cache_max_age_ms: u64,
    /// Maximum number of cached snapshots
    pub quote_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_bps: DEFAULT_FEE_BPS,
            fee_receiver: AccountId::ZERO,
            admin: AccountId::ZERO,
            quote_cache_max_age_ms: 2_000,
            quote_cache_capacity: 1_024,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> LaunchResult<()> {
        if u64::from(self.fee_bps) > BPS_DENOMINATOR {
            return Err(LaunchError::InvalidConfig(format!(
                "fee_bps {} exceeds {}",
                self.fee_bps, BPS_DENOMINATOR
            )));
        }
        if self.quote_cache_capacity == 0 {
            return Err(LaunchError::InvalidConfig(
                "quote_cache_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn quote_cache_max_age(&self) -> Duration {
        Duration::from_millis(self.quote_cache_max_age_ms)
    }
}

/// Settings file of a local launchpad installation
///
/// ```toml
/// data_dir = "/var/lib/launchpad"
///
/// [engine]
/// fee_bps = 100
/// fee_receiver = "<64 hex chars>"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadConfig {
    /// Directory holding the sled database
    pub data_dir: PathBuf,
    pub engine: EngineConfig,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("launchpad-data"),
            engine: EngineConfig::default(),
        }
    }
}

impl LaunchpadConfig {
    /// Parse and validate TOML settings
    pub fn from_toml_str(contents: &str) -> LaunchResult<Self> {
        let config: LaunchpadConfig = toml::from_str(contents)
            .map_err(|e| LaunchError::InvalidConfig(format!("failed to parse config: {}", e)))?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> LaunchResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LaunchError::InvalidConfig(format!("failed to render config: {}", e)))
    }
}
