//! Launchpad Engine
//!
//! Authoritative trading engine for bonding-curve token launches. Every launch
//! owns an independent pool priced by a linear curve (see `lib-curve`); the
//! engine executes buys and sells against it, routes the protocol fee, and
//! retires the pool from curve trading once its migration threshold is hit.
//!
//! # Modules
//!
//! - `pool` - per-pool state machine (Active → Migrated)
//! - `migration` - threshold trigger evaluated after every trade
//! - `quote` - the single quote routine, snapshots and the snapshot cache
//! - `settlement` / `ledger` - asset movements and the wallet layer
//! - `store` - pool records and trade log persistence
//! - `registry` - pool table and statistics
//! - `engine` - ties the above together under per-pool locks
//!
//! # Usage
//!
//! ```
//! use lib_launchpad::{
//!     AccountId, EngineConfig, InMemoryAssetLedger, InMemoryLaunchStore, LaunchEngine,
//!     PoolConfig, U256,
//! };
//!
//! let engine = LaunchEngine::new(
//!     EngineConfig::default(),
//!     InMemoryAssetLedger::new(),
//!     InMemoryLaunchStore::new(),
//! )
//! .unwrap();
//!
//! let buyer = AccountId([1u8; 32]);
//! engine.ledger().deposit(buyer, U256::from(1_000_000u64)).unwrap();
//!
//! let pool = engine
//!     .create_pool(PoolConfig::new(1_000u64, 10u64, 1_000_000u64, 500_000u64), 0)
//!     .unwrap();
//!
//! let quoted = engine.quote_buy(pool, U256::from(100u64)).unwrap();
//! let trade = engine.buy(buyer, pool, U256::from(100u64), quoted, 1).unwrap();
//! assert_eq!(trade.settled_value, U256::from(150_000u64));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod migration;
pub mod pool;
pub mod quote;
pub mod registry;
pub mod settlement;
pub mod store;
pub mod types;

pub use config::{EngineConfig, LaunchpadConfig};
pub use engine::LaunchEngine;
pub use error::{LaunchError, LaunchResult};
pub use ledger::{AssetLedger, InMemoryAssetLedger, LedgerError, SledAssetLedger};
pub use migration::MigrationSource;
pub use pool::{PoolRecord, PoolState, PoolStatus};
pub use quote::{price_buy, price_sell, PoolSnapshot, Quote, Quoter, SnapshotCache};
pub use registry::{PoolStats, RegistryStats};
pub use settlement::{AssetMovement, Holder, Settlement};
pub use store::{InMemoryLaunchStore, LaunchStore, SledLaunchStore, StoreError};
pub use types::{AccountId, PoolId, TradeKind, TradeRecord, TradeRequest};

pub use lib_curve::{PoolConfig, U256};
