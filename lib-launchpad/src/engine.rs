//! Launch Engine
//!
//! Authoritative owner of every pool. Executes trades, fires migrations and
//! serves read-only quotes from the same pricing routine.
//!
//! # Trade protocol
//!
//! 1. Take the pool's write lock (trades on one pool are serial)
//! 2. Price the trade and check the slippage bound; nothing is touched yet
//! 3. Build the post-trade record, run the migration trigger on it
//! 4. Settle the asset movements and commit pool record + trade record
//! 5. Publish the new record under the lock
//!
//! A store that holds the ledger balances (`SledLaunchStore::with_ledger`)
//! does step 4 in one transaction. Otherwise the settlement runs first and
//! is reversed if the commit fails. Either way a failed trade leaves
//! balances, pool state and the trade log exactly as they were.

use std::sync::{PoisonError, RwLock};

use lib_curve::{PoolConfig, U256};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{LaunchError, LaunchResult};
use crate::ledger::AssetLedger;
use crate::migration::{self, MigrationSource};
use crate::pool::{PoolRecord, PoolState, PoolStatus};
use crate::quote::{price, PoolSnapshot, Quote};
use crate::registry::{PoolHandle, PoolStats, PoolTable, RegistryStats};
use crate::settlement::Settlement;
use crate::store::LaunchStore;
use crate::types::{AccountId, PoolId, TradeKind, TradeRecord, TradeRequest};

fn poisoned<T>(_: PoisonError<T>) -> LaunchError {
    LaunchError::Internal("lock poisoned".to_string())
}

/// Bonding-curve launch engine over an asset ledger and a store
pub struct LaunchEngine<L: AssetLedger, S: LaunchStore> {
    config: EngineConfig,
    ledger: L,
    store: S,
    table: RwLock<PoolTable>,
}

impl<L: AssetLedger, S: LaunchStore> std::fmt::Debug for LaunchEngine<L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<L: AssetLedger, S: LaunchStore> LaunchEngine<L, S> {
    /// Build an engine, restoring every pool the store holds
    pub fn new(config: EngineConfig, ledger: L, store: S) -> LaunchResult<Self> {
        config.validate()?;

        let mut table = PoolTable::new(store.next_pool_id()?);
        let pools = store.load_pools()?;
        let restored = pools.len();
        for (id, record) in pools {
            table.restore(id, record);
        }
        if restored > 0 {
            info!(
                "Restored {} launch pools, next id {}",
                restored,
                table.peek_next_id()
            );
        }

        Ok(Self {
            config,
            ledger,
            store,
            table: RwLock::new(table),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Create a pool; the identifier comes from this call
    pub fn create_pool(&self, config: PoolConfig, timestamp: u64) -> LaunchResult<PoolId> {
        config.validate(self.config.fee_bps)?;

        let mut table = self.table.write().map_err(poisoned)?;
        let id = table.peek_next_id();
        let next_id = id
            .0
            .checked_add(1)
            .ok_or(LaunchError::ArithmeticOverflow)?;
        let record = PoolRecord::new(config, timestamp);

        self.store.insert_pool(id, &record, next_id)?;
        let registered = table.register(record);
        debug_assert_eq!(registered, id);

        info!(
            "Created launch pool {}: base_price={}, slope={}, max_supply={}, threshold={}",
            id, config.base_price, config.slope, config.max_supply, config.migration_threshold
        );
        Ok(id)
    }

    pub fn get_pool_state(&self, pool_id: PoolId) -> LaunchResult<PoolState> {
        self.read_pool(pool_id, |record| Ok(record.state.clone()))
    }

    pub fn get_pool_config(&self, pool_id: PoolId) -> LaunchResult<PoolConfig> {
        self.read_pool(pool_id, |record| Ok(record.config))
    }

    pub fn list_pools(&self) -> LaunchResult<Vec<PoolId>> {
        Ok(self.table.read().map_err(poisoned)?.ids())
    }

    pub fn pools_by_status(&self, status: PoolStatus) -> LaunchResult<Vec<PoolId>> {
        let mut ids = Vec::new();
        for (id, handle) in self.handles()? {
            if handle.read().map_err(poisoned)?.status() == status {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn registry_stats(&self) -> LaunchResult<RegistryStats> {
        let mut stats = RegistryStats::default();
        for (_, handle) in self.handles()? {
            stats.include(&*handle.read().map_err(poisoned)?);
        }
        Ok(stats)
    }

    pub fn pool_stats(&self, pool_id: PoolId) -> LaunchResult<PoolStats> {
        self.read_pool(pool_id, |record| PoolStats::from_record(pool_id, record))
    }

    /// Trade log of a pool, ordered by sequence
    pub fn trades(&self, pool_id: PoolId) -> LaunchResult<Vec<TradeRecord>> {
        if !self.table.read().map_err(poisoned)?.contains(pool_id) {
            return Err(LaunchError::PoolNotFound(pool_id));
        }
        Ok(self.store.trades(pool_id)?)
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    /// Read-only copy of the pool's pricing inputs
    pub fn snapshot(&self, pool_id: PoolId) -> LaunchResult<PoolSnapshot> {
        self.read_pool(pool_id, |record| {
            Ok(PoolSnapshot::capture(pool_id, record, self.config.fee_bps))
        })
    }

    /// Cost a buy of `amount` would settle at now, before fee
    pub fn quote_buy(&self, pool_id: PoolId, amount: U256) -> LaunchResult<U256> {
        Ok(self.quote_buy_detailed(pool_id, amount)?.value)
    }

    /// Return a sell of `amount` would settle at now, before fee
    pub fn quote_sell(&self, pool_id: PoolId, amount: U256) -> LaunchResult<U256> {
        Ok(self.quote_sell_detailed(pool_id, amount)?.value)
    }

    pub fn quote_buy_detailed(&self, pool_id: PoolId, amount: U256) -> LaunchResult<Quote> {
        self.quote(pool_id, &TradeRequest::buy(amount, U256::MAX))
    }

    pub fn quote_sell_detailed(&self, pool_id: PoolId, amount: U256) -> LaunchResult<Quote> {
        self.quote(pool_id, &TradeRequest::sell(amount, U256::zero()))
    }

    fn quote(&self, pool_id: PoolId, request: &TradeRequest) -> LaunchResult<Quote> {
        self.read_pool(pool_id, |record| {
            let snapshot = PoolSnapshot::capture(pool_id, record, self.config.fee_bps);
            price(&snapshot, request)
        })
    }

    // =========================================================================
    // Trades
    // =========================================================================

    /// Buy `amount` units, paying at most `max_cost` before fee
    pub fn buy(
        &self,
        trader: AccountId,
        pool_id: PoolId,
        amount: U256,
        max_cost: U256,
        timestamp: u64,
    ) -> LaunchResult<TradeRecord> {
        self.execute(trader, pool_id, &TradeRequest::buy(amount, max_cost), timestamp)
    }

    /// Sell `amount` units, receiving at least `min_return` after fee
    pub fn sell(
        &self,
        trader: AccountId,
        pool_id: PoolId,
        amount: U256,
        min_return: U256,
        timestamp: u64,
    ) -> LaunchResult<TradeRecord> {
        self.execute(trader, pool_id, &TradeRequest::sell(amount, min_return), timestamp)
    }

    /// Execute a trade request atomically
    pub fn execute(
        &self,
        trader: AccountId,
        pool_id: PoolId,
        request: &TradeRequest,
        timestamp: u64,
    ) -> LaunchResult<TradeRecord> {
        let result = self.execute_locked(trader, pool_id, request, timestamp);
        match &result {
            Err(err) if err.is_rejection() => {
                debug!("Pool {} {} rejected: {}", pool_id, request.kind, err)
            }
            Err(err) => warn!("Pool {} {} by {} failed: {}", pool_id, request.kind, trader, err),
            Ok(_) => {}
        }
        result
    }

    fn execute_locked(
        &self,
        trader: AccountId,
        pool_id: PoolId,
        request: &TradeRequest,
        timestamp: u64,
    ) -> LaunchResult<TradeRecord> {
        let handle = self.handle(pool_id)?;
        let mut pool = handle.write().map_err(poisoned)?;

        let snapshot = PoolSnapshot::capture(pool_id, &pool, self.config.fee_bps);
        let quote = price(&snapshot, request)?;
        check_slippage(&quote, request.bound)?;

        let mut next = pool.clone();
        match request.kind {
            TradeKind::Buy => next.apply_buy(quote.amount, quote.value)?,
            TradeKind::Sell => next.apply_sell(quote.amount, quote.value)?,
        }
        let migrated = migration::evaluate(&mut next, pool_id, timestamp)?;

        let trade = TradeRecord {
            pool_id,
            sequence: next.next_sequence()?,
            trader,
            kind: request.kind,
            amount: quote.amount,
            settled_value: quote.value,
            fee_value: quote.fee,
            tokens_sold_after: next.state.tokens_sold,
            timestamp,
        };

        let settlement = self.settlement_for(trader, pool_id, &quote);
        self.settle_and_commit(pool_id, &next, &trade, &settlement)?;
        *pool = next;

        info!(
            "Pool {} {} #{}: amount={}, value={}, fee={}, tokens_sold={}",
            pool_id,
            trade.kind,
            trade.sequence,
            trade.amount,
            trade.settled_value,
            trade.fee_value,
            trade.tokens_sold_after
        );
        if migrated {
            info!(
                "Pool {} migrated at threshold: tokens_sold={}, reserve={}",
                pool_id, pool.state.tokens_sold, pool.state.reserve_balance
            );
        }

        Ok(trade)
    }

    /// Administrative Active → Migrated transition
    pub fn migrate(
        &self,
        caller: AccountId,
        pool_id: PoolId,
        timestamp: u64,
    ) -> LaunchResult<PoolState> {
        if caller != self.config.admin {
            warn!("Rejected migration of pool {} by non-admin {}", pool_id, caller);
            return Err(LaunchError::Unauthorized);
        }

        let handle = self.handle(pool_id)?;
        let mut pool = handle.write().map_err(poisoned)?;

        let mut next = pool.clone();
        next.mark_migrated(pool_id, MigrationSource::Administrative, timestamp)?;
        self.store.commit(pool_id, &next, None)?;
        *pool = next;

        info!(
            "Pool {} migrated by admin: tokens_sold={}, reserve={}",
            pool_id, pool.state.tokens_sold, pool.state.reserve_balance
        );
        Ok(pool.state.clone())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn settlement_for(&self, trader: AccountId, pool_id: PoolId, quote: &Quote) -> Settlement {
        match quote.kind {
            TradeKind::Buy => Settlement::for_buy(
                trader,
                pool_id,
                quote.amount,
                quote.value,
                quote.fee,
                self.config.fee_receiver,
            ),
            TradeKind::Sell => Settlement::for_sell(
                trader,
                pool_id,
                quote.amount,
                quote.total,
                quote.fee,
                self.config.fee_receiver,
            ),
        }
    }

    fn settle_and_commit(
        &self,
        pool_id: PoolId,
        record: &PoolRecord,
        trade: &TradeRecord,
        settlement: &Settlement,
    ) -> LaunchResult<()> {
        if self.store.commit_settled(pool_id, record, trade, settlement)? {
            return Ok(());
        }

        // Split backends: settle first, reverse if the commit fails
        self.ledger.settle(settlement)?;

        if let Err(commit_err) = self.store.commit(pool_id, record, Some(trade)) {
            error!("Commit failed for pool {}: {}", pool_id, commit_err);
            if let Err(revert_err) = self.ledger.settle(&settlement.reversed()) {
                error!(
                    "Settlement reversal failed for pool {}: {}",
                    pool_id, revert_err
                );
                return Err(LaunchError::Internal(format!(
                    "commit failed ({}) and settlement reversal failed ({})",
                    commit_err, revert_err
                )));
            }
            debug!("Reversed settlement for pool {}", pool_id);
            return Err(commit_err.into());
        }

        Ok(())
    }

    fn handle(&self, pool_id: PoolId) -> LaunchResult<PoolHandle> {
        self.table
            .read()
            .map_err(poisoned)?
            .get(pool_id)
            .ok_or(LaunchError::PoolNotFound(pool_id))
    }

    fn handles(&self) -> LaunchResult<Vec<(PoolId, PoolHandle)>> {
        Ok(self.table.read().map_err(poisoned)?.handles())
    }

    fn read_pool<T, F>(&self, pool_id: PoolId, f: F) -> LaunchResult<T>
    where
        F: FnOnce(&PoolRecord) -> LaunchResult<T>,
    {
        let handle = self.handle(pool_id)?;
        let pool = handle.read().map_err(poisoned)?;
        f(&pool)
    }
}

fn check_slippage(quote: &Quote, bound: U256) -> LaunchResult<()> {
    let exceeded = match quote.kind {
        TradeKind::Buy => quote.value > bound,
        TradeKind::Sell => quote.total < bound,
    };
    if exceeded {
        return Err(LaunchError::SlippageExceeded {
            computed: quote.exact_bound(),
            bound,
        });
    }
    Ok(())
}
