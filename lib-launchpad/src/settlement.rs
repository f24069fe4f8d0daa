//! Trade Settlement
//!
//! A settlement is the ordered batch of asset movements a trade produces. The
//! asset ledger applies a batch all-or-nothing.

use lib_curve::U256;
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, PoolId};

/// Owner of a quote-asset balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Holder {
    Account(AccountId),
    /// Funds held by a pool on behalf of its outstanding units
    Reserve(PoolId),
}

impl std::fmt::Display for Holder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Holder::Account(account) => write!(f, "account {}", account),
            Holder::Reserve(pool_id) => write!(f, "reserve of pool {}", pool_id),
        }
    }
}

/// One step of a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetMovement {
    /// Move quote asset between holders
    Quote { from: Holder, to: Holder, amount: U256 },
    /// Create pool units for an account
    Mint { pool: PoolId, to: AccountId, amount: U256 },
    /// Destroy pool units held by an account
    Burn { pool: PoolId, from: AccountId, amount: U256 },
}

impl AssetMovement {
    /// The movement that undoes this one
    pub fn inverse(&self) -> AssetMovement {
        match *self {
            AssetMovement::Quote { from, to, amount } => AssetMovement::Quote {
                from: to,
                to: from,
                amount,
            },
            AssetMovement::Mint { pool, to, amount } => AssetMovement::Burn {
                pool,
                from: to,
                amount,
            },
            AssetMovement::Burn { pool, from, amount } => AssetMovement::Mint {
                pool,
                to: from,
                amount,
            },
        }
    }
}

/// Ordered batch of movements applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    movements: Vec<AssetMovement>,
}

impl Settlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote-asset transfer; zero amounts are dropped
    pub fn transfer(mut self, from: Holder, to: Holder, amount: U256) -> Self {
        if !amount.is_zero() {
            self.movements.push(AssetMovement::Quote { from, to, amount });
        }
        self
    }

    pub fn mint(mut self, pool: PoolId, to: AccountId, amount: U256) -> Self {
        self.movements.push(AssetMovement::Mint { pool, to, amount });
        self
    }

    pub fn burn(mut self, pool: PoolId, from: AccountId, amount: U256) -> Self {
        self.movements.push(AssetMovement::Burn { pool, from, amount });
        self
    }

    /// Buy: cost to the reserve, fee to the receiver, units to the buyer
    pub fn for_buy(
        trader: AccountId,
        pool_id: PoolId,
        amount: U256,
        cost: U256,
        fee: U256,
        fee_receiver: AccountId,
    ) -> Self {
        Self::new()
            .transfer(Holder::Account(trader), Holder::Reserve(pool_id), cost)
            .transfer(Holder::Account(trader), Holder::Account(fee_receiver), fee)
            .mint(pool_id, trader, amount)
    }

    /// Sell: units burned, net return to the seller, fee to the receiver
    ///
    /// Both payouts come from the reserve, which therefore drops by the gross
    /// return.
    pub fn for_sell(
        trader: AccountId,
        pool_id: PoolId,
        amount: U256,
        net: U256,
        fee: U256,
        fee_receiver: AccountId,
    ) -> Self {
        Self::new()
            .burn(pool_id, trader, amount)
            .transfer(Holder::Reserve(pool_id), Holder::Account(trader), net)
            .transfer(Holder::Reserve(pool_id), Holder::Account(fee_receiver), fee)
    }

    /// Settlement that undoes this one when applied after it
    pub fn reversed(&self) -> Settlement {
        Settlement {
            movements: self.movements.iter().rev().map(AssetMovement::inverse).collect(),
        }
    }

    pub fn movements(&self) -> &[AssetMovement] {
        &self.movements
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }
}
