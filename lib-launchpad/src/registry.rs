//! Launch Registry
//!
//! Index of every launch pool. Identifier assignment and insertion happen in
//! one step under the table's write lock; each pool then carries its own lock
//! so trades on different pools never contend.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use lib_curve::{current_price, progress_bps, U256};
use serde::{Deserialize, Serialize};

use crate::error::LaunchResult;
use crate::migration::MigrationSource;
use crate::pool::{PoolRecord, PoolStatus};
use crate::types::PoolId;

/// Shared handle to one pool
pub type PoolHandle = Arc<RwLock<PoolRecord>>;

/// Pool table: handles by identifier plus the identifier counter
#[derive(Debug, Default)]
pub struct PoolTable {
    pools: BTreeMap<PoolId, PoolHandle>,
    next_id: u64,
}

impl PoolTable {
    pub fn new(next_id: u64) -> Self {
        Self {
            pools: BTreeMap::new(),
            next_id,
        }
    }

    /// Identifier the next registration will receive
    pub fn peek_next_id(&self) -> PoolId {
        PoolId(self.next_id)
    }

    /// Register a pool under the next identifier
    pub fn register(&mut self, record: PoolRecord) -> PoolId {
        let id = PoolId(self.next_id);
        self.pools.insert(id, Arc::new(RwLock::new(record)));
        self.next_id += 1;
        id
    }

    /// Re-insert a persisted pool, keeping the counter ahead of it
    pub fn restore(&mut self, id: PoolId, record: PoolRecord) {
        self.pools.insert(id, Arc::new(RwLock::new(record)));
        self.next_id = self.next_id.max(id.0.saturating_add(1));
    }

    pub fn get(&self, id: PoolId) -> Option<PoolHandle> {
        self.pools.get(&id).cloned()
    }

    pub fn contains(&self, id: PoolId) -> bool {
        self.pools.contains_key(&id)
    }

    /// Identifiers in ascending order
    pub fn ids(&self) -> Vec<PoolId> {
        self.pools.keys().copied().collect()
    }

    /// Handles in identifier order, detached from the table lock
    pub fn handles(&self) -> Vec<(PoolId, PoolHandle)> {
        self.pools
            .iter()
            .map(|(id, handle)| (*id, Arc::clone(handle)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Registry-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_pools: u64,
    pub active_pools: u64,
    pub migrated_pools: u64,
    pub migrated_by_threshold: u64,
    pub migrated_by_admin: u64,
    /// Sum of all pool reserves
    pub total_reserve: U256,
    pub total_trades: u64,
}

impl RegistryStats {
    /// Fold one pool into the totals
    pub fn include(&mut self, record: &PoolRecord) {
        self.total_pools += 1;
        match record.status() {
            PoolStatus::Active => self.active_pools += 1,
            PoolStatus::Migrated => {
                self.migrated_pools += 1;
                match record.state.migration_source {
                    Some(MigrationSource::Threshold) => self.migrated_by_threshold += 1,
                    Some(MigrationSource::Administrative) => self.migrated_by_admin += 1,
                    None => {}
                }
            }
        }
        self.total_reserve = self.total_reserve.saturating_add(record.state.reserve_balance);
        self.total_trades = self.total_trades.saturating_add(record.state.trade_count);
    }
}

/// Per-pool statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub pool_id: PoolId,
    pub status: PoolStatus,
    pub tokens_sold: U256,
    pub reserve_balance: U256,
    pub current_price: U256,
    /// Progress toward the migration threshold, capped at 10_000
    pub progress_bps: u16,
    pub remaining_supply: U256,
    pub trade_count: u64,
    pub created_at: u64,
    pub migrated_at: Option<u64>,
    pub migration_source: Option<MigrationSource>,
}

impl PoolStats {
    pub fn from_record(pool_id: PoolId, record: &PoolRecord) -> LaunchResult<Self> {
        Ok(Self {
            pool_id,
            status: record.status(),
            tokens_sold: record.state.tokens_sold,
            reserve_balance: record.state.reserve_balance,
            current_price: current_price(&record.config, record.state.tokens_sold)?,
            progress_bps: progress_bps(&record.config, record.state.tokens_sold)?,
            remaining_supply: record.remaining_supply(),
            trade_count: record.state.trade_count,
            created_at: record.state.created_at,
            migrated_at: record.state.migrated_at,
            migration_source: record.state.migration_source,
        })
    }
}
