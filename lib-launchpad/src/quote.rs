//! Quote API and Snapshot Cache
//!
//! `price_buy` and `price_sell` are the only quote routines. The engine
//! settles every trade through them, so a quote taken from an up-to-date
//! snapshot equals the settled value of the trade it describes.
//!
//! Read-only clients may hold snapshots for a short while through a
//! `SnapshotCache`. Cached snapshots are time-boxed and dropped whenever a
//! trade on their pool is observed.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lib_curve::{bps_of, buy_cost, checked_add, checked_sub, sell_return, PoolConfig, U256};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::LaunchEngine;
use crate::config::EngineConfig;
use crate::error::{LaunchError, LaunchResult};
use crate::ledger::AssetLedger;
use crate::pool::PoolRecord;
use crate::store::LaunchStore;
use crate::types::{AccountId, PoolId, TradeKind, TradeRecord, TradeRequest};

/// Read-only copy of a pool's pricing inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool_id: PoolId,
    pub config: PoolConfig,
    pub tokens_sold: U256,
    pub reserve_balance: U256,
    pub migrated: bool,
    pub fee_bps: u16,
}

impl PoolSnapshot {
    pub fn capture(pool_id: PoolId, record: &PoolRecord, fee_bps: u16) -> Self {
        Self {
            pool_id,
            config: record.config,
            tokens_sold: record.state.tokens_sold,
            reserve_balance: record.state.reserve_balance,
            migrated: record.state.migrated,
            fee_bps,
        }
    }
}

/// Priced trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub kind: TradeKind,
    pub amount: U256,
    /// Gross curve value; becomes the trade's `settled_value`
    pub value: U256,
    pub fee: U256,
    /// What the buyer pays (`value + fee`) or the seller receives (`value - fee`)
    pub total: U256,
    pub tokens_sold_after: U256,
}

impl Quote {
    /// Bound to submit so that, absent intervening trades, slippage cannot fail
    pub fn exact_bound(&self) -> U256 {
        match self.kind {
            TradeKind::Buy => self.value,
            TradeKind::Sell => self.total,
        }
    }
}

/// Price a buy of `amount` units against `snapshot`
pub fn price_buy(snapshot: &PoolSnapshot, amount: U256) -> LaunchResult<Quote> {
    if amount.is_zero() {
        return Err(LaunchError::InvalidAmount);
    }
    if snapshot.migrated {
        return Err(LaunchError::PoolMigrated(snapshot.pool_id));
    }

    let available = snapshot.config.max_supply.saturating_sub(snapshot.tokens_sold);
    let tokens_sold_after = match snapshot.tokens_sold.checked_add(amount) {
        Some(after) if after <= snapshot.config.max_supply => after,
        _ => {
            return Err(LaunchError::SupplyExceeded {
                requested: amount,
                available,
            })
        }
    };

    let value = buy_cost(&snapshot.config, snapshot.tokens_sold, amount)?;
    let fee = bps_of(value, snapshot.fee_bps)?;
    let total = checked_add(value, fee)?;

    Ok(Quote {
        kind: TradeKind::Buy,
        amount,
        value,
        fee,
        total,
        tokens_sold_after,
    })
}

/// Price a sell of `amount` units against `snapshot`
pub fn price_sell(snapshot: &PoolSnapshot, amount: U256) -> LaunchResult<Quote> {
    if amount.is_zero() {
        return Err(LaunchError::InvalidAmount);
    }
    if snapshot.migrated {
        return Err(LaunchError::PoolMigrated(snapshot.pool_id));
    }
    if amount > snapshot.tokens_sold {
        return Err(LaunchError::InsufficientSupply {
            requested: amount,
            available: snapshot.tokens_sold,
        });
    }

    let value = sell_return(&snapshot.config, snapshot.tokens_sold, amount)?;
    let fee = bps_of(value, snapshot.fee_bps)?;
    let total = checked_sub(value, fee)?;

    // Floor rounding makes the curve path-dependent by up to one unit per trade
    if value > snapshot.reserve_balance {
        return Err(LaunchError::InsufficientReserve);
    }

    Ok(Quote {
        kind: TradeKind::Sell,
        amount,
        value,
        fee,
        total,
        tokens_sold_after: checked_sub(snapshot.tokens_sold, amount)?,
    })
}

/// Price a trade request of either kind
pub fn price(snapshot: &PoolSnapshot, request: &TradeRequest) -> LaunchResult<Quote> {
    match request.kind {
        TradeKind::Buy => price_buy(snapshot, request.amount),
        TradeKind::Sell => price_sell(snapshot, request.amount),
    }
}

// =============================================================================
// SNAPSHOT CACHE
// =============================================================================

/// Snapshot cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub invalidations: u64,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
struct CachedSnapshot {
    snapshot: PoolSnapshot,
    fetched_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    entries: LruCache<PoolId, CachedSnapshot>,
    stats: CacheStats,
}

/// Time-boxed LRU of pool snapshots
#[derive(Debug)]
pub struct SnapshotCache {
    inner: Mutex<CacheInner>,
    max_age: Duration,
}

impl SnapshotCache {
    /// A zero capacity is rounded up to one entry
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            max_age,
        }
    }

    /// Cache sized and time-boxed by the engine's quote cache settings
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.quote_cache_capacity, config.quote_cache_max_age())
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Cached snapshot if still fresh, else one from `fetch`
    pub fn get_or_fetch<F>(&self, pool_id: PoolId, fetch: F) -> LaunchResult<PoolSnapshot>
    where
        F: FnOnce() -> LaunchResult<PoolSnapshot>,
    {
        self.get_or_fetch_at(pool_id, Instant::now(), fetch)
    }

    /// `get_or_fetch` with an explicit clock reading
    pub fn get_or_fetch_at<F>(
        &self,
        pool_id: PoolId,
        now: Instant,
        fetch: F,
    ) -> LaunchResult<PoolSnapshot>
    where
        F: FnOnce() -> LaunchResult<PoolSnapshot>,
    {
        let mut inner = self.lock()?;
        let cached = inner
            .entries
            .get(&pool_id)
            .map(|entry| (entry.snapshot.clone(), entry.fetched_at));

        match cached {
            Some((snapshot, fetched_at))
                if now.saturating_duration_since(fetched_at) < self.max_age =>
            {
                inner.stats.hits += 1;
                return Ok(snapshot);
            }
            Some(_) => {
                inner.stats.expired += 1;
                inner.entries.pop(&pool_id);
            }
            None => inner.stats.misses += 1,
        }

        // The engine takes pool locks inside `fetch`; never hold ours meanwhile
        drop(inner);
        let snapshot = fetch()?;

        let mut inner = self.lock()?;
        inner.entries.put(
            pool_id,
            CachedSnapshot {
                snapshot: snapshot.clone(),
                fetched_at: now,
            },
        );
        Ok(snapshot)
    }

    /// Drop the cached snapshot of one pool
    pub fn invalidate(&self, pool_id: PoolId) -> LaunchResult<()> {
        let mut inner = self.lock()?;
        if inner.entries.pop(&pool_id).is_some() {
            inner.stats.invalidations += 1;
        }
        Ok(())
    }

    /// Tell the cache a trade settled on `trade.pool_id`
    pub fn observe_trade(&self, trade: &TradeRecord) -> LaunchResult<()> {
        debug!(
            "Snapshot cache observed trade {} on pool {}",
            trade.sequence, trade.pool_id
        );
        self.invalidate(trade.pool_id)
    }

    pub fn clear(&self) -> LaunchResult<()> {
        self.lock()?.entries.clear();
        Ok(())
    }

    pub fn stats(&self) -> LaunchResult<CacheStats> {
        let inner = self.lock()?;
        let mut stats = inner.stats.clone();
        stats.entry_count = inner.entries.len();
        Ok(stats)
    }

    fn lock(&self) -> LaunchResult<std::sync::MutexGuard<'_, CacheInner>> {
        self.inner
            .lock()
            .map_err(|_| LaunchError::Internal("snapshot cache lock poisoned".to_string()))
    }
}

// =============================================================================
// QUOTER
// =============================================================================

/// Quote client that reads through a snapshot cache and keeps it honest
///
/// Trades submitted through the quoter invalidate the traded pool's entry.
pub struct Quoter<'a, L: AssetLedger, S: LaunchStore> {
    engine: &'a LaunchEngine<L, S>,
    cache: &'a SnapshotCache,
}

impl<'a, L: AssetLedger, S: LaunchStore> Quoter<'a, L, S> {
    pub fn new(engine: &'a LaunchEngine<L, S>, cache: &'a SnapshotCache) -> Self {
        Self { engine, cache }
    }

    pub fn snapshot(&self, pool_id: PoolId) -> LaunchResult<PoolSnapshot> {
        self.cache
            .get_or_fetch(pool_id, || self.engine.snapshot(pool_id))
    }

    pub fn quote_buy(&self, pool_id: PoolId, amount: U256) -> LaunchResult<Quote> {
        price_buy(&self.snapshot(pool_id)?, amount)
    }

    pub fn quote_sell(&self, pool_id: PoolId, amount: U256) -> LaunchResult<Quote> {
        price_sell(&self.snapshot(pool_id)?, amount)
    }

    /// Submit a trade and drop the pool's cached snapshot once it settles
    pub fn execute(
        &self,
        trader: AccountId,
        pool_id: PoolId,
        request: &TradeRequest,
        timestamp: u64,
    ) -> LaunchResult<TradeRecord> {
        let trade = self.engine.execute(trader, pool_id, request, timestamp)?;
        self.cache.observe_trade(&trade)?;
        Ok(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn snapshot(sold: u64, reserve: u64) -> PoolSnapshot {
        PoolSnapshot {
            pool_id: PoolId(1),
            config: PoolConfig::new(1_000u64, 10u64, 1_000_000u64, 500_000u64),
            tokens_sold: u(sold),
            reserve_balance: u(reserve),
            migrated: false,
            fee_bps: 100,
        }
    }

    #[test]
    fn test_price_buy() {
        let quote = price_buy(&snapshot(0, 0), u(100)).unwrap();
        assert_eq!(quote.value, u(150_000));
        assert_eq!(quote.fee, u(1_500));
        assert_eq!(quote.total, u(151_500));
        assert_eq!(quote.tokens_sold_after, u(100));
        assert_eq!(quote.exact_bound(), u(150_000));
    }

    #[test]
    fn test_price_sell() {
        let quote = price_sell(&snapshot(100, 150_000), u(100)).unwrap();
        assert_eq!(quote.value, u(150_000));
        assert_eq!(quote.fee, u(1_500));
        assert_eq!(quote.total, u(148_500));
        assert!(quote.tokens_sold_after.is_zero());
        assert_eq!(quote.exact_bound(), u(148_500));
    }

    #[test]
    fn test_zero_amount_rejected() {
        assert_eq!(price_buy(&snapshot(0, 0), u(0)), Err(LaunchError::InvalidAmount));
        assert_eq!(price_sell(&snapshot(5, 0), u(0)), Err(LaunchError::InvalidAmount));
    }

    #[test]
    fn test_migrated_rejected() {
        let mut snap = snapshot(10, 10_050);
        snap.migrated = true;
        assert_eq!(price_buy(&snap, u(1)), Err(LaunchError::PoolMigrated(PoolId(1))));
        assert_eq!(price_sell(&snap, u(1)), Err(LaunchError::PoolMigrated(PoolId(1))));
    }

    #[test]
    fn test_supply_bounds() {
        assert_eq!(
            price_buy(&snapshot(999_990, 0), u(11)),
            Err(LaunchError::SupplyExceeded {
                requested: u(11),
                available: u(10),
            })
        );
        assert!(price_buy(&snapshot(999_990, 0), u(10)).is_ok());
        assert_eq!(
            price_buy(&snapshot(0, 0), U256::MAX),
            Err(LaunchError::SupplyExceeded {
                requested: U256::MAX,
                available: u(1_000_000),
            })
        );
        assert_eq!(
            price_sell(&snapshot(3, 3_100), u(4)),
            Err(LaunchError::InsufficientSupply {
                requested: u(4),
                available: u(3),
            })
        );
    }

    #[test]
    fn test_sell_beyond_reserve_rejected() {
        assert_eq!(
            price_sell(&snapshot(100, 149_999), u(100)),
            Err(LaunchError::InsufficientReserve)
        );
    }

    #[test]
    fn test_cache_hits_until_expiry() {
        let cache = SnapshotCache::new(8, Duration::from_millis(500));
        let start = Instant::now();
        let mut fetches = 0;

        for offset in [0u64, 100, 499] {
            let snap = cache
                .get_or_fetch_at(PoolId(1), start + Duration::from_millis(offset), || {
                    fetches += 1;
                    Ok(snapshot(0, 0))
                })
                .unwrap();
            assert_eq!(snap.pool_id, PoolId(1));
        }
        assert_eq!(fetches, 1);

        cache
            .get_or_fetch_at(PoolId(1), start + Duration::from_millis(500), || {
                fetches += 1;
                Ok(snapshot(7, 70_245))
            })
            .unwrap();
        assert_eq!(fetches, 2);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_observed_trade_invalidates() {
        let cache = SnapshotCache::new(8, Duration::from_secs(60));
        cache.get_or_fetch(PoolId(1), || Ok(snapshot(0, 0))).unwrap();

        let trade = TradeRecord {
            pool_id: PoolId(1),
            sequence: 0,
            trader: AccountId::ZERO,
            kind: TradeKind::Buy,
            amount: u(100),
            settled_value: u(150_000),
            fee_value: u(1_500),
            tokens_sold_after: u(100),
            timestamp: 0,
        };
        cache.observe_trade(&trade).unwrap();

        let fresh = cache
            .get_or_fetch(PoolId(1), || Ok(snapshot(100, 150_000)))
            .unwrap();
        assert_eq!(fresh.tokens_sold, u(100));
        assert_eq!(cache.stats().unwrap().invalidations, 1);
    }

    #[test]
    fn test_cache_follows_engine_config() {
        let config = EngineConfig {
            quote_cache_capacity: 2,
            quote_cache_max_age_ms: 250,
            ..EngineConfig::default()
        };
        let cache = SnapshotCache::from_config(&config);
        assert_eq!(cache.max_age(), Duration::from_millis(250));

        for id in 1..=3u64 {
            cache
                .get_or_fetch(PoolId(id), || Ok(snapshot(0, 0)))
                .unwrap();
        }
        assert_eq!(cache.stats().unwrap().entry_count, 2);
    }

    #[test]
    fn test_fetch_error_not_cached() {
        let cache = SnapshotCache::new(8, Duration::from_secs(60));
        let err = cache.get_or_fetch(PoolId(2), || Err(LaunchError::PoolNotFound(PoolId(2))));
        assert_eq!(err, Err(LaunchError::PoolNotFound(PoolId(2))));
        assert_eq!(cache.stats().unwrap().entry_count, 0);
    }
}
