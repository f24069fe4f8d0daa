//! Launch Pool State Machine
//!
//! Each launch owns one pool with an explicit two-state lifecycle:
//! Active → Migrated
//!
//! # Invariants
//! - The only transition is Active → Migrated, and it is irreversible
//! - Buys and sells are rejected once migrated, before any mutation
//! - Reads keep working in every state
//! - `reserve_balance` equals Σ buy costs − Σ sell returns (fees excluded)

use lib_curve::{checked_add, checked_sub, PoolConfig, U256};
use serde::{Deserialize, Serialize};

use crate::error::{LaunchError, LaunchResult};
use crate::migration::MigrationSource;
use crate::types::PoolId;

/// Lifecycle status of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Curve trading is open
    Active,
    /// Terminal: curve trading is closed
    Migrated,
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolStatus::Active => write!(f, "active"),
            PoolStatus::Migrated => write!(f, "migrated"),
        }
    }
}

/// Mutable per-pool state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Units currently outstanding
    pub tokens_sold: U256,
    /// Quote-asset funds backing the outstanding units
    pub reserve_balance: U256,
    pub migrated: bool,
    pub migrated_at: Option<u64>,
    pub migration_source: Option<MigrationSource>,
    /// Sequence number the next trade record will carry
    pub trade_count: u64,
    pub created_at: u64,
}

impl PoolState {
    pub fn new(created_at: u64) -> Self {
        Self {
            tokens_sold: U256::zero(),
            reserve_balance: U256::zero(),
            migrated: false,
            migrated_at: None,
            migration_source: None,
            trade_count: 0,
            created_at,
        }
    }

    pub fn status(&self) -> PoolStatus {
        if self.migrated {
            PoolStatus::Migrated
        } else {
            PoolStatus::Active
        }
    }
}

/// Immutable parameters plus mutable state: the unit persisted per pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub config: PoolConfig,
    pub state: PoolState,
}

impl PoolRecord {
    pub fn new(config: PoolConfig, created_at: u64) -> Self {
        Self {
            config,
            state: PoolState::new(created_at),
        }
    }

    pub fn status(&self) -> PoolStatus {
        self.state.status()
    }

    pub fn is_trading_active(&self) -> bool {
        !self.state.migrated
    }

    /// Fail with `PoolMigrated` unless curve trading is open
    pub fn require_active(&self, pool_id: PoolId) -> LaunchResult<()> {
        if self.state.migrated {
            Err(LaunchError::PoolMigrated(pool_id))
        } else {
            Ok(())
        }
    }

    /// Units that may still be bought before `max_supply` is reached
    pub fn remaining_supply(&self) -> U256 {
        self.config.max_supply.saturating_sub(self.state.tokens_sold)
    }

    /// Record a settled buy: supply and reserve both grow
    pub fn apply_buy(&mut self, amount: U256, cost: U256) -> LaunchResult<()> {
        let tokens_sold = checked_add(self.state.tokens_sold, amount)?;
        let reserve_balance = checked_add(self.state.reserve_balance, cost)?;
        self.state.tokens_sold = tokens_sold;
        self.state.reserve_balance = reserve_balance;
        Ok(())
    }

    /// Record a settled sell: supply and reserve both shrink
    pub fn apply_sell(&mut self, amount: U256, ret: U256) -> LaunchResult<()> {
        let tokens_sold = checked_sub(self.state.tokens_sold, amount)?;
        let reserve_balance = self
            .state
            .reserve_balance
            .checked_sub(ret)
            .ok_or(LaunchError::InsufficientReserve)?;
        self.state.tokens_sold = tokens_sold;
        self.state.reserve_balance = reserve_balance;
        Ok(())
    }

    /// Claim the next trade log sequence number
    pub fn next_sequence(&mut self) -> LaunchResult<u64> {
        let sequence = self.state.trade_count;
        self.state.trade_count = sequence
            .checked_add(1)
            .ok_or(LaunchError::ArithmeticOverflow)?;
        Ok(sequence)
    }

    /// Active → Migrated
    ///
    /// Irreversible. A second call fails with `PoolMigrated`.
    pub fn mark_migrated(
        &mut self,
        pool_id: PoolId,
        source: MigrationSource,
        timestamp: u64,
    ) -> LaunchResult<()> {
        self.require_active(pool_id)?;

        self.state.migrated = true;
        self.state.migrated_at = Some(timestamp);
        self.state.migration_source = Some(source);

        Ok(())
    }
}
