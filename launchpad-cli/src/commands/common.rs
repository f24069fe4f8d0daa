//! Argument parsers and the JSON views of pools, trades and quotes

use lib_launchpad::{AccountId, PoolConfig, PoolStats, Quote, TradeRecord, U256};
use serde_json::{json, Value};


/// Decimal quote/unit amount
pub fn parse_u256(value: &str) -> Result<U256, String> {
    let digits = value.replace('_', "");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a decimal amount", value));
    }
    U256::from_dec_str(&digits).map_err(|_| format!("'{}' does not fit in 256 bits", value))
}

/// 32-byte account identifier, hex with optional 0x prefix
pub fn parse_account_id(value: &str) -> Result<AccountId, String> {
    value
        .parse::<AccountId>()
        .map_err(|e| format!("invalid account id '{}': {}", value, e))
}

/// Wall-clock seconds used as trade and pool timestamps
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// Amounts are rendered as decimal strings; JSON numbers cannot hold a U256.

pub fn pool_json(stats: &PoolStats, config: &PoolConfig) -> Value {
    json!({
        "pool_id": stats.pool_id.0,
        "status": stats.status.to_string(),
        "base_price": config.base_price.to_string(),
        "slope": config.slope.to_string(),
        "max_supply": config.max_supply.to_string(),
        "migration_threshold": config.migration_threshold.to_string(),
        "tokens_sold": stats.tokens_sold.to_string(),
        "reserve_balance": stats.reserve_balance.to_string(),
        "current_price": stats.current_price.to_string(),
        "progress_bps": stats.progress_bps,
        "remaining_supply": stats.remaining_supply.to_string(),
        "trade_count": stats.trade_count,
        "created_at": stats.created_at,
        "migrated_at": stats.migrated_at,
        "migration_source": stats.migration_source.map(|s| s.to_string()),
    })
}

pub fn trade_json(trade: &TradeRecord) -> Value {
    json!({
        "pool_id": trade.pool_id.0,
        "sequence": trade.sequence,
        "trader": trade.trader.to_hex(),
        "kind": trade.kind.to_string(),
        "amount": trade.amount.to_string(),
        "settled_value": trade.settled_value.to_string(),
        "fee": trade.fee_value.to_string(),
        "trader_total": trade.trader_total().to_string(),
        "tokens_sold_after": trade.tokens_sold_after.to_string(),
        "timestamp": trade.timestamp,
    })
}

pub fn quote_json(pool: u64, quote: &Quote) -> Value {
    json!({
        "pool_id": pool,
        "kind": quote.kind.to_string(),
        "amount": quote.amount.to_string(),
        "value": quote.value.to_string(),
        "fee": quote.fee.to_string(),
        "total": quote.total.to_string(),
        "tokens_sold_after": quote.tokens_sold_after.to_string(),
        "bound": quote.exact_bound().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u256() {
        assert_eq!(parse_u256("150000").unwrap(), U256::from(150_000u64));
        assert_eq!(parse_u256("1_000_000").unwrap(), U256::from(1_000_000u64));
        assert_eq!(
            parse_u256("340282366920938463463374607431768211456").unwrap(),
            U256::from(u128::MAX) + U256::one()
        );
        assert!(parse_u256("").is_err());
        assert!(parse_u256("-5").is_err());
        assert!(parse_u256("0x10").is_err());
    }

    #[test]
    fn test_parse_account_id() {
        let hex = "01".repeat(32);
        assert_eq!(parse_account_id(&hex).unwrap(), AccountId([1u8; 32]));
        assert_eq!(
            parse_account_id(&format!("0x{}", hex)).unwrap(),
            AccountId([1u8; 32])
        );
        assert!(parse_account_id("0x1234").unwrap_err().contains("invalid account id"));
    }
}
