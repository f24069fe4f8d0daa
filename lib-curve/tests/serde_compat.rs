//! Wire compatibility of curve parameters
//!
//! Quote clients receive pool parameters as JSON and the engine persists them
//! with bincode. Both encodings must carry the full 256-bit values.

use lib_curve::{buy_cost, PoolConfig, U256};

#[test]
fn test_config_from_client_json() {
    // U256 travels as a 0x-prefixed hex string
    let json = r#"{
        "base_price": "0x3e8",
        "slope": "0xa",
        "max_supply": "0xf4240",
        "migration_threshold": "0x7a120"
    }"#;

    let config: PoolConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config, PoolConfig::new(1_000u64, 10u64, 1_000_000u64, 500_000u64));
    assert_eq!(
        buy_cost(&config, U256::zero(), U256::from(100u64)),
        Ok(U256::from(150_000u64))
    );
}

#[test]
fn test_config_survives_bincode_above_u128() {
    let big = U256::from(2u64).pow(U256::from(200u64)) + U256::from(7u64);
    let config = PoolConfig::new(big, 1u64, big, big);

    let bytes = bincode::serialize(&config).unwrap();
    let decoded: PoolConfig = bincode::deserialize(&bytes).unwrap();
    assert_eq!(decoded.base_price, big);
}
