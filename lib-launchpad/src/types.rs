//! Identifiers, trade requests and trade records

use std::fmt;
use std::str::FromStr;

use lib_curve::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sequential launch pool identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub u64);

impl PoolId {
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet account identifier (32 bytes, rendered as hex)
///
/// Human-readable formats carry the hex string; binary formats the raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub const ZERO: AccountId = AccountId([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for AccountId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(AccountId)
        }
    }
}

/// Direction of a trade against the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "buy"),
            TradeKind::Sell => write!(f, "sell"),
        }
    }
}

/// A trade as submitted by a caller
///
/// `bound` is the maximum acceptable cost for a buy and the minimum acceptable
/// net return for a sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub kind: TradeKind,
    pub amount: U256,
    pub bound: U256,
}

impl TradeRequest {
    pub fn buy(amount: impl Into<U256>, max_cost: impl Into<U256>) -> Self {
        Self {
            kind: TradeKind::Buy,
            amount: amount.into(),
            bound: max_cost.into(),
        }
    }

    pub fn sell(amount: impl Into<U256>, min_return: impl Into<U256>) -> Self {
        Self {
            kind: TradeKind::Sell,
            amount: amount.into(),
            bound: min_return.into(),
        }
    }
}

/// Append-only record of a settled trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub pool_id: PoolId,
    /// Position in the pool's trade log, starting at 0
    pub sequence: u64,
    pub trader: AccountId,
    pub kind: TradeKind,
    /// Units bought or sold
    pub amount: U256,
    /// Gross curve value: buy cost or sell return before fee
    pub settled_value: U256,
    pub fee_value: U256,
    pub tokens_sold_after: U256,
    pub timestamp: u64,
}

impl TradeRecord {
    /// Quote-asset amount that left (buy) or reached (sell) the trader
    pub fn trader_total(&self) -> U256 {
        match self.kind {
            TradeKind::Buy => self.settled_value.saturating_add(self.fee_value),
            TradeKind::Sell => self.settled_value.saturating_sub(self.fee_value),
        }
    }
}
