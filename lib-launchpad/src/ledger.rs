//! Asset Ledger
//!
//! The wallet layer the engine settles trades against. The engine only needs
//! `settle`; balances are read and funded through the concrete ledgers.
//!
//! Two implementations:
//! - `InMemoryAssetLedger` for tests and embedding
//! - `SledAssetLedger` for persistent local wallets

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use lib_curve::U256;
use sled::transaction::{
    ConflictableTransactionError, TransactionError, Transactional, TransactionalTree,
};
use sled::{Db, Tree};
use thiserror::Error;
use tracing::debug;

use crate::settlement::{AssetMovement, Holder, Settlement};
use crate::types::{AccountId, PoolId};

/// Asset ledger result type
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failure to apply a settlement or read a balance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient quote balance for {holder}: required {required}, available {available}")]
    InsufficientBalance {
        holder: Holder,
        required: U256,
        available: U256,
    },

    #[error("Insufficient units of pool {pool} for {account}: required {required}, available {available}")]
    InsufficientUnits {
        pool: PoolId,
        account: AccountId,
        required: U256,
        available: U256,
    },

    #[error("Balance overflow")]
    Overflow,

    #[error("Ledger storage error: {0}")]
    Storage(String),

    #[error("Ledger lock poisoned")]
    Poisoned,
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// Wallet layer that applies settlements atomically
pub trait AssetLedger: Send + Sync {
    /// Apply every movement of `settlement`, or none of them
    fn settle(&self, settlement: &Settlement) -> LedgerResult<()>;
}

/// Balances touched by a settlement, computed before anything is written
#[derive(Debug, Default)]
struct StagedBalances {
    quote: HashMap<Holder, U256>,
    units: HashMap<(PoolId, AccountId), U256>,
}

/// Run `settlement` against current balances without writing anything
///
/// The outer error is a failed balance read; the inner one rejects the batch
/// at its first failing movement.
fn stage<E, Q, N>(
    settlement: &Settlement,
    mut quote_balance: Q,
    mut unit_balance: N,
) -> Result<LedgerResult<StagedBalances>, E>
where
    Q: FnMut(&Holder) -> Result<U256, E>,
    N: FnMut(PoolId, &AccountId) -> Result<U256, E>,
{
    let mut staged = StagedBalances::default();

    for movement in settlement.movements() {
        match *movement {
            AssetMovement::Quote { from, to, amount } => {
                let available = match staged.quote.get(&from) {
                    Some(balance) => *balance,
                    None => quote_balance(&from)?,
                };
                let Some(debited) = available.checked_sub(amount) else {
                    return Ok(Err(LedgerError::InsufficientBalance {
                        holder: from,
                        required: amount,
                        available,
                    }));
                };
                staged.quote.insert(from, debited);

                let current = match staged.quote.get(&to) {
                    Some(balance) => *balance,
                    None => quote_balance(&to)?,
                };
                let Some(credited) = current.checked_add(amount) else {
                    return Ok(Err(LedgerError::Overflow));
                };
                staged.quote.insert(to, credited);
            }
            AssetMovement::Mint { pool, to, amount } => {
                let current = match staged.units.get(&(pool, to)) {
                    Some(balance) => *balance,
                    None => unit_balance(pool, &to)?,
                };
                let Some(credited) = current.checked_add(amount) else {
                    return Ok(Err(LedgerError::Overflow));
                };
                staged.units.insert((pool, to), credited);
            }
            AssetMovement::Burn { pool, from, amount } => {
                let available = match staged.units.get(&(pool, from)) {
                    Some(balance) => *balance,
                    None => unit_balance(pool, &from)?,
                };
                let Some(debited) = available.checked_sub(amount) else {
                    return Ok(Err(LedgerError::InsufficientUnits {
                        pool,
                        account: from,
                        required: amount,
                        available,
                    }));
                };
                staged.units.insert((pool, from), debited);
            }
        }
    }

    Ok(Ok(staged))
}

// =============================================================================
// IN-MEMORY LEDGER
// =============================================================================

#[derive(Debug, Default)]
struct Balances {
    quote: HashMap<Holder, U256>,
    units: HashMap<(PoolId, AccountId), U256>,
}

/// Process-local ledger
#[derive(Debug, Default)]
pub struct InMemoryAssetLedger {
    balances: Mutex<Balances>,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit quote asset to an account; returns the new balance
    pub fn deposit(&self, account: AccountId, amount: U256) -> LedgerResult<U256> {
        let mut balances = self.balances.lock().map_err(|_| LedgerError::Poisoned)?;
        let entry = balances.quote.entry(Holder::Account(account)).or_default();
        *entry = entry.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(*entry)
    }

    pub fn quote_balance(&self, holder: &Holder) -> LedgerResult<U256> {
        let balances = self.balances.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(balances.quote.get(holder).copied().unwrap_or_default())
    }

    pub fn unit_balance(&self, pool: PoolId, account: &AccountId) -> LedgerResult<U256> {
        let balances = self.balances.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(balances.units.get(&(pool, *account)).copied().unwrap_or_default())
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn settle(&self, settlement: &Settlement) -> LedgerResult<()> {
        let mut balances = self.balances.lock().map_err(|_| LedgerError::Poisoned)?;

        let staged = {
            let current = &*balances;
            stage(
                settlement,
                |holder| {
                    Ok::<_, LedgerError>(current.quote.get(holder).copied().unwrap_or_default())
                },
                |pool, account| {
                    Ok(current.units.get(&(pool, *account)).copied().unwrap_or_default())
                },
            )??
        };

        balances.quote.extend(staged.quote);
        balances.units.extend(staged.units);
        Ok(())
    }
}

// =============================================================================
// SLED LEDGER
// =============================================================================

const TREE_QUOTE_BALANCES: &str = "ledger_quote_balances";
const TREE_UNIT_BALANCES: &str = "ledger_unit_balances";

fn holder_key(holder: &Holder) -> Vec<u8> {
    match holder {
        Holder::Account(account) => {
            let mut key = Vec::with_capacity(33);
            key.push(0u8);
            key.extend_from_slice(account.as_bytes());
            key
        }
        Holder::Reserve(pool_id) => {
            let mut key = Vec::with_capacity(9);
            key.push(1u8);
            key.extend_from_slice(&pool_id.to_be_bytes());
            key
        }
    }
}

fn unit_key(pool: PoolId, account: &AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(&pool.to_be_bytes());
    key.extend_from_slice(account.as_bytes());
    key
}

fn encode_amount(amount: &U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    amount.to_big_endian(&mut bytes);
    bytes
}

fn decode_amount(bytes: &[u8]) -> LedgerResult<U256> {
    if bytes.len() != 32 {
        return Err(LedgerError::Storage(format!(
            "corrupt balance entry: {} bytes",
            bytes.len()
        )));
    }
    Ok(U256::from_big_endian(bytes))
}

fn read_balance<E>(
    tree: &TransactionalTree,
    key: &[u8],
    reject: fn(LedgerError) -> E,
) -> Result<U256, ConflictableTransactionError<E>> {
    match tree.get(key)? {
        Some(bytes) => {
            decode_amount(&bytes).map_err(|e| ConflictableTransactionError::Abort(reject(e)))
        }
        None => Ok(U256::zero()),
    }
}

/// Stage and write `settlement` inside a running transaction over the
/// ledger trees
///
/// Balances are read through the transaction, so a concurrent writer forces
/// a retry instead of a lost update. Rejections abort through `reject`.
pub(crate) fn settle_in<E>(
    quote: &TransactionalTree,
    units: &TransactionalTree,
    settlement: &Settlement,
    reject: fn(LedgerError) -> E,
) -> Result<(), ConflictableTransactionError<E>> {
    let staged = stage(
        settlement,
        |holder| read_balance(quote, &holder_key(holder), reject),
        |pool, account| read_balance(units, &unit_key(pool, account), reject),
    )?
    .map_err(|e| ConflictableTransactionError::Abort(reject(e)))?;

    for (holder, amount) in &staged.quote {
        quote.insert(holder_key(holder), &encode_amount(amount)[..])?;
    }
    for ((pool, account), amount) in &staged.units {
        units.insert(unit_key(*pool, account), &encode_amount(amount)[..])?;
    }
    Ok(())
}

fn flatten(err: TransactionError<LedgerError>) -> LedgerError {
    match err {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => LedgerError::Storage(err.to_string()),
    }
}

/// Sled-backed ledger; balances are 32-byte big-endian values
///
/// Every write runs as a sled transaction, so deposits and settlements from
/// several handles on one database serialize without an extra lock.
#[derive(Clone)]
pub struct SledAssetLedger {
    quote: Tree,
    units: Tree,
}

impl std::fmt::Debug for SledAssetLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledAssetLedger")
            .field("accounts", &self.quote.len())
            .finish_non_exhaustive()
    }
}

impl SledAssetLedger {
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    /// Open the ledger trees inside an existing database
    pub fn from_db(db: &Db) -> LedgerResult<Self> {
        let quote = db.open_tree(TREE_QUOTE_BALANCES)?;
        let units = db.open_tree(TREE_UNIT_BALANCES)?;
        debug!("Opened ledger trees: {}, {}", TREE_QUOTE_BALANCES, TREE_UNIT_BALANCES);

        Ok(Self { quote, units })
    }

    /// Credit quote asset to an account; returns the new balance
    pub fn deposit(&self, account: AccountId, amount: U256) -> LedgerResult<U256> {
        let key = holder_key(&Holder::Account(account));

        let updated = self
            .quote
            .transaction(|quote| {
                let current = read_balance(quote, &key, std::convert::identity)?;
                let updated = current
                    .checked_add(amount)
                    .ok_or(ConflictableTransactionError::Abort(LedgerError::Overflow))?;
                quote.insert(key.as_slice(), &encode_amount(&updated)[..])?;
                Ok::<U256, ConflictableTransactionError<LedgerError>>(updated)
            })
            .map_err(flatten)?;

        self.quote.flush()?;
        Ok(updated)
    }

    pub fn quote_balance(&self, holder: &Holder) -> LedgerResult<U256> {
        match self.quote.get(holder_key(holder))? {
            Some(bytes) => decode_amount(&bytes),
            None => Ok(U256::zero()),
        }
    }

    pub fn unit_balance(&self, pool: PoolId, account: &AccountId) -> LedgerResult<U256> {
        match self.units.get(unit_key(pool, account))? {
            Some(bytes) => decode_amount(&bytes),
            None => Ok(U256::zero()),
        }
    }

    /// Quote and unit trees, for stores that settle inside their own commit
    pub(crate) fn trees(&self) -> (Tree, Tree) {
        (self.quote.clone(), self.units.clone())
    }
}

impl AssetLedger for SledAssetLedger {
    fn settle(&self, settlement: &Settlement) -> LedgerResult<()> {
        (&self.quote, &self.units)
            .transaction(|(quote, units)| {
                settle_in(quote, units, settlement, std::convert::identity)
            })
            .map_err(flatten)?;

        self.quote.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId([1u8; 32])
    }

    fn bob() -> AccountId {
        AccountId([2u8; 32])
    }

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn test_in_memory_buy_settlement() {
        let ledger = InMemoryAssetLedger::new();
        ledger.deposit(alice(), u(200_000)).unwrap();

        let s = Settlement::for_buy(alice(), PoolId(0), u(100), u(150_000), u(1_500), bob());
        ledger.settle(&s).unwrap();

        assert_eq!(ledger.quote_balance(&Holder::Account(alice())).unwrap(), u(48_500));
        assert_eq!(ledger.quote_balance(&Holder::Reserve(PoolId(0))).unwrap(), u(150_000));
        assert_eq!(ledger.quote_balance(&Holder::Account(bob())).unwrap(), u(1_500));
        assert_eq!(ledger.unit_balance(PoolId(0), &alice()).unwrap(), u(100));
    }

    #[test]
    fn test_in_memory_failed_batch_changes_nothing() {
        let ledger = InMemoryAssetLedger::new();
        ledger.deposit(alice(), u(150_000)).unwrap();

        // Cost fits, cost + fee does not
        let s = Settlement::for_buy(alice(), PoolId(0), u(100), u(150_000), u(1_500), bob());
        let err = ledger.settle(&s).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

        assert_eq!(ledger.quote_balance(&Holder::Account(alice())).unwrap(), u(150_000));
        assert!(ledger.quote_balance(&Holder::Reserve(PoolId(0))).unwrap().is_zero());
        assert!(ledger.unit_balance(PoolId(0), &alice()).unwrap().is_zero());
    }

    #[test]
    fn test_burn_requires_units() {
        let ledger = InMemoryAssetLedger::new();
        let s = Settlement::new().burn(PoolId(3), alice(), u(1));
        assert!(matches!(
            ledger.settle(&s),
            Err(LedgerError::InsufficientUnits { .. })
        ));
    }

    #[test]
    fn test_reversal_restores_balances() {
        let ledger = InMemoryAssetLedger::new();
        ledger.deposit(alice(), u(10_000)).unwrap();

        let s = Settlement::for_buy(alice(), PoolId(0), u(5), u(7_000), u(70), bob());
        ledger.settle(&s).unwrap();
        ledger.settle(&s.reversed()).unwrap();

        assert_eq!(ledger.quote_balance(&Holder::Account(alice())).unwrap(), u(10_000));
        assert!(ledger.quote_balance(&Holder::Account(bob())).unwrap().is_zero());
        assert!(ledger.unit_balance(PoolId(0), &alice()).unwrap().is_zero());
    }

    #[test]
    fn test_sled_ledger_persists() {
        let dir = tempfile::tempdir().unwrap();

        {
            let ledger = SledAssetLedger::open(dir.path()).unwrap();
            ledger.deposit(alice(), u(200_000)).unwrap();
            let s = Settlement::for_buy(alice(), PoolId(7), u(100), u(150_000), u(0), bob());
            ledger.settle(&s).unwrap();
        }

        let ledger = SledAssetLedger::open(dir.path()).unwrap();
        assert_eq!(ledger.quote_balance(&Holder::Account(alice())).unwrap(), u(50_000));
        assert_eq!(ledger.quote_balance(&Holder::Reserve(PoolId(7))).unwrap(), u(150_000));
        assert_eq!(ledger.unit_balance(PoolId(7), &alice()).unwrap(), u(100));
    }

    #[test]
    fn test_sled_failed_batch_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = SledAssetLedger::open(dir.path()).unwrap();
        ledger.deposit(alice(), u(100)).unwrap();

        let s = Settlement::new()
            .transfer(Holder::Account(alice()), Holder::Account(bob()), u(60))
            .transfer(Holder::Account(alice()), Holder::Account(bob()), u(60));
        assert!(ledger.settle(&s).is_err());

        assert_eq!(ledger.quote_balance(&Holder::Account(alice())).unwrap(), u(100));
        assert!(ledger.quote_balance(&Holder::Account(bob())).unwrap().is_zero());
    }
}
