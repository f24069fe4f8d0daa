//! Migration Trigger
//!
//! A pool migrates once cumulative units sold reach its threshold. The check
//! runs after every trade, on the post-trade state, inside the same commit as
//! the trade. An active pool is always below its threshold, so only a buy can
//! fire it.

use serde::{Deserialize, Serialize};

use crate::error::LaunchResult;
use crate::pool::PoolRecord;
use crate::types::PoolId;

/// What caused a pool to migrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationSource {
    /// `tokens_sold` reached `migration_threshold` on a buy
    Threshold,
    /// Explicit call by the engine admin
    Administrative,
}

impl std::fmt::Display for MigrationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationSource::Threshold => write!(f, "threshold"),
            MigrationSource::Administrative => write!(f, "administrative"),
        }
    }
}

/// Whether the pool's sold quantity has reached its migration threshold
pub fn threshold_reached(record: &PoolRecord) -> bool {
    record.state.tokens_sold >= record.config.migration_threshold
}

/// Migrate the pool if it is active and the threshold is reached
///
/// Returns `true` when this call performed the transition.
pub fn evaluate(record: &mut PoolRecord, pool_id: PoolId, timestamp: u64) -> LaunchResult<bool> {
    if !record.is_trading_active() || !threshold_reached(record) {
        return Ok(false);
    }

    record.mark_migrated(pool_id, MigrationSource::Threshold, timestamp)?;
    Ok(true)
}
