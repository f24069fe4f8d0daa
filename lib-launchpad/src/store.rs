//! Launch Store
//!
//! Persistence for pool records and the per-pool trade log.
//!
//! A trade commit writes the updated pool record and its trade record in one
//! transaction; readers never observe one without the other. A sled store
//! opened with `SledLaunchStore::with_ledger` also writes the trade's
//! balance movements in that transaction.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use thiserror::Error;
use tracing::{debug, info};

use crate::ledger::{self, LedgerError, SledAssetLedger};
use crate::pool::PoolRecord;
use crate::settlement::Settlement;
use crate::types::{PoolId, TradeRecord};

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt entry: {0}")]
    Corruption(String),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Settlement rejected: {0}")]
    Settlement(LedgerError),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Durable home of pools and trade logs
pub trait LaunchStore: Send + Sync {
    /// Identifier the next created pool will receive
    fn next_pool_id(&self) -> StoreResult<u64>;

    /// Persist a new pool together with the advanced identifier counter
    fn insert_pool(&self, pool_id: PoolId, record: &PoolRecord, next_id: u64) -> StoreResult<()>;

    /// Persist an updated pool record and, for trades, its log entry
    fn commit(
        &self,
        pool_id: PoolId,
        record: &PoolRecord,
        trade: Option<&TradeRecord>,
    ) -> StoreResult<()>;

    /// Apply `settlement` and commit the pool record and trade as one unit
    ///
    /// Returns `Ok(false)` without writing when this store does not hold the
    /// ledger balances; the caller then settles through its own ledger and
    /// calls `commit`.
    fn commit_settled(
        &self,
        _pool_id: PoolId,
        _record: &PoolRecord,
        _trade: &TradeRecord,
        _settlement: &Settlement,
    ) -> StoreResult<bool> {
        Ok(false)
    }

    /// Every persisted pool, ordered by identifier
    fn load_pools(&self) -> StoreResult<Vec<(PoolId, PoolRecord)>>;

    /// Trade log of one pool, ordered by sequence
    fn trades(&self, pool_id: PoolId) -> StoreResult<Vec<TradeRecord>>;
}

// =============================================================================
// KEYS
// =============================================================================

pub mod keys {
    use crate::types::PoolId;

    pub const META_NEXT_POOL_ID: &[u8] = b"next_pool_id";

    /// Pool key: 8-byte big-endian id
    pub fn pool_key(pool_id: PoolId) -> [u8; 8] {
        pool_id.to_be_bytes()
    }

    /// Trade key: pool id ‖ sequence, both big-endian, so a prefix scan
    /// yields one pool's log in order
    pub fn trade_key(pool_id: PoolId, sequence: u64) -> [u8; 16] {
        let mut key = [0u8; 16];
        key[..8].copy_from_slice(&pool_id.to_be_bytes());
        key[8..].copy_from_slice(&sequence.to_be_bytes());
        key
    }

    pub fn decode_u64(bytes: &[u8]) -> Option<u64> {
        let array: [u8; 8] = bytes.try_into().ok()?;
        Some(u64::from_be_bytes(array))
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    pools: BTreeMap<PoolId, PoolRecord>,
    trades: BTreeMap<(PoolId, u64), TradeRecord>,
    next_id: u64,
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryLaunchStore {
    state: Mutex<MemoryState>,
}

impl InMemoryLaunchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LaunchStore for InMemoryLaunchStore {
    fn next_pool_id(&self) -> StoreResult<u64> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state.next_id)
    }

    fn insert_pool(&self, pool_id: PoolId, record: &PoolRecord, next_id: u64) -> StoreResult<()> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        state.pools.insert(pool_id, record.clone());
        state.next_id = next_id;
        Ok(())
    }

    fn commit(
        &self,
        pool_id: PoolId,
        record: &PoolRecord,
        trade: Option<&TradeRecord>,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        state.pools.insert(pool_id, record.clone());
        if let Some(trade) = trade {
            state.trades.insert((pool_id, trade.sequence), trade.clone());
        }
        Ok(())
    }

    fn load_pools(&self) -> StoreResult<Vec<(PoolId, PoolRecord)>> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .pools
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect())
    }

    fn trades(&self, pool_id: PoolId) -> StoreResult<Vec<TradeRecord>> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .trades
            .range((pool_id, 0)..=(pool_id, u64::MAX))
            .map(|(_, trade)| trade.clone())
            .collect())
    }
}

// =============================================================================
// SLED STORE
// =============================================================================

// Tree names are part of the on-disk format
const TREE_POOLS: &str = "launch_pools";
const TREE_TRADES: &str = "launch_trades";
const TREE_META: &str = "launch_meta";

/// Sled-backed store; values are bincode
pub struct SledLaunchStore {
    db: Db,
    pools: Tree,
    trades: Tree,
    meta: Tree,
    // Quote and unit balance trees of a ledger sharing `db`
    ledger: Option<(Tree, Tree)>,
}

impl std::fmt::Debug for SledLaunchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledLaunchStore")
            .field("pools", &self.pools.len())
            .field("trades", &self.trades.len())
            .field("settles_trades", &self.ledger.is_some())
            .finish_non_exhaustive()
    }
}

fn flatten(err: TransactionError<StoreError>) -> StoreError {
    match err {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => StoreError::Database(err.to_string()),
    }
}

impl SledLaunchStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        info!("Opening launch store at: {}", path.display());
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open the store trees inside an existing database
    pub fn from_db(db: Db) -> StoreResult<Self> {
        let pools = db.open_tree(TREE_POOLS)?;
        let trades = db.open_tree(TREE_TRADES)?;
        let meta = db.open_tree(TREE_META)?;
        debug!("Opened launch store trees: {}, {}, {}", TREE_POOLS, TREE_TRADES, TREE_META);

        Ok(Self {
            db,
            pools,
            trades,
            meta,
            ledger: None,
        })
    }

    /// Open a ledger and a store over one database
    ///
    /// Trades through this pair settle balances and commit the pool record
    /// and trade log in a single sled transaction. Hand the returned ledger,
    /// not another one, to the engine.
    pub fn with_ledger(db: Db) -> StoreResult<(SledAssetLedger, Self)> {
        let ledger = SledAssetLedger::from_db(&db)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let mut store = Self::from_db(db)?;
        store.ledger = Some(ledger.trees());
        Ok((ledger, store))
    }

    /// Open a throwaway store that lives only as long as the handle
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl LaunchStore for SledLaunchStore {
    fn next_pool_id(&self) -> StoreResult<u64> {
        match self.meta.get(keys::META_NEXT_POOL_ID)? {
            Some(bytes) => keys::decode_u64(&bytes)
                .ok_or_else(|| StoreError::Corruption("next pool id".to_string())),
            None => Ok(0),
        }
    }

    fn insert_pool(&self, pool_id: PoolId, record: &PoolRecord, next_id: u64) -> StoreResult<()> {
        let value = bincode::serialize(record)?;
        let key = keys::pool_key(pool_id);
        let next = next_id.to_be_bytes();

        (&self.pools, &self.meta)
            .transaction(|(pools, meta)| {
                pools.insert(&key[..], value.as_slice())?;
                meta.insert(keys::META_NEXT_POOL_ID, &next[..])?;
                Ok::<(), ConflictableTransactionError<StoreError>>(())
            })
            .map_err(flatten)?;

        self.db.flush()?;
        Ok(())
    }

    fn commit(
        &self,
        pool_id: PoolId,
        record: &PoolRecord,
        trade: Option<&TradeRecord>,
    ) -> StoreResult<()> {
        let pool_value = bincode::serialize(record)?;
        let pool_key = keys::pool_key(pool_id);
        let trade_entry = match trade {
            Some(trade) => Some((
                keys::trade_key(pool_id, trade.sequence),
                bincode::serialize(trade)?,
            )),
            None => None,
        };

        (&self.pools, &self.trades)
            .transaction(|(pools, trades)| {
                pools.insert(&pool_key[..], pool_value.as_slice())?;
                if let Some((key, value)) = &trade_entry {
                    trades.insert(&key[..], value.as_slice())?;
                }
                Ok::<(), ConflictableTransactionError<StoreError>>(())
            })
            .map_err(flatten)?;

        self.db.flush()?;
        Ok(())
    }

    fn commit_settled(
        &self,
        pool_id: PoolId,
        record: &PoolRecord,
        trade: &TradeRecord,
        settlement: &Settlement,
    ) -> StoreResult<bool> {
        let (quote_tree, units_tree) = match &self.ledger {
            Some(trees) => trees,
            None => return Ok(false),
        };

        let pool_value = bincode::serialize(record)?;
        let pool_key = keys::pool_key(pool_id);
        let trade_value = bincode::serialize(trade)?;
        let trade_key = keys::trade_key(pool_id, trade.sequence);

        (&self.pools, &self.trades, quote_tree, units_tree)
            .transaction(|(pools, trades, quote, units)| {
                pools.insert(&pool_key[..], pool_value.as_slice())?;
                trades.insert(&trade_key[..], trade_value.as_slice())?;
                ledger::settle_in(quote, units, settlement, StoreError::Settlement)?;
                Ok::<(), ConflictableTransactionError<StoreError>>(())
            })
            .map_err(flatten)?;

        self.db.flush()?;
        Ok(true)
    }

    fn load_pools(&self) -> StoreResult<Vec<(PoolId, PoolRecord)>> {
        let mut pools = Vec::new();
        for entry in self.pools.iter() {
            let (key, value) = entry?;
            let id = keys::decode_u64(&key)
                .ok_or_else(|| StoreError::Corruption("pool key".to_string()))?;
            let record: PoolRecord = bincode::deserialize(&value)?;
            pools.push((PoolId(id), record));
        }
        Ok(pools)
    }

    fn trades(&self, pool_id: PoolId) -> StoreResult<Vec<TradeRecord>> {
        let mut trades = Vec::new();
        for entry in self.trades.scan_prefix(keys::pool_key(pool_id)) {
            let (_, value) = entry?;
            trades.push(bincode::deserialize(&value)?);
        }
        Ok(trades)
    }
}
