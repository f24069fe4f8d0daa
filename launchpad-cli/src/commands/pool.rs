//! Engine-backed commands
//!
//! Pool lifecycle, wallet funding, quotes and trades against the local
//! engine. Handlers take the engine and a `Report` so tests can drive them
//! over a temporary database and read back what they showed.

use lib_launchpad::{
    Holder, PoolConfig, PoolId, PoolStatus, Quoter, SnapshotCache, TradeKind, TradeRequest, U256,
};
use serde_json::{json, Value};

use crate::argument_parsing::{
    BalanceArgs, BuyArgs, CreateArgs, DepositArgs, ListArgs, LaunchpadCommand, MigrateArgs,
    PoolArgs, QuoteAction, SellArgs,
};
use crate::commands::common::{pool_json, quote_json, trade_json, unix_now};
use crate::commands::{calc, LocalEngine};
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, Report};

pub fn handle_engine_command(
    command: &LaunchpadCommand,
    engine: &LocalEngine,
    report: &Report,
) -> CliResult<()> {
    match command {
        LaunchpadCommand::Create(args) => handle_create(engine, args, report),
        LaunchpadCommand::Deposit(args) => handle_deposit(engine, args, report),
        LaunchpadCommand::Quote(args) => handle_quote(engine, &args.action, report),
        LaunchpadCommand::Buy(args) => handle_buy(engine, args, report),
        LaunchpadCommand::Sell(args) => handle_sell(engine, args, report),
        LaunchpadCommand::Info(args) => handle_info(engine, args, report),
        LaunchpadCommand::List(args) => handle_list(engine, args, report),
        LaunchpadCommand::Trades(args) => handle_trades(engine, args, report),
        LaunchpadCommand::Balance(args) => handle_balance(engine, args, report),
        LaunchpadCommand::Migrate(args) => handle_migrate(engine, args, report),
        LaunchpadCommand::Stats => handle_stats(engine, report),
        LaunchpadCommand::Calc(args) => calc::handle_calc_command(&args.action, report),
    }
}

fn pool_view(engine: &LocalEngine, pool: PoolId) -> CliResult<Value> {
    let stats = engine.pool_stats(pool)?;
    let config = engine.get_pool_config(pool)?;
    Ok(pool_json(&stats, &config))
}

pub fn handle_create(
    engine: &LocalEngine,
    args: &CreateArgs,
    report: &Report,
) -> CliResult<()> {
    let config = PoolConfig::new(
        args.base_price,
        args.slope,
        args.max_supply,
        args.migration_threshold,
    );
    let pool = engine.create_pool(config, unix_now())?;

    report.done(&format!("Created pool {}", pool))?;
    report.show(&pool_view(engine, pool)?)
}

pub fn handle_deposit(
    engine: &LocalEngine,
    args: &DepositArgs,
    report: &Report,
) -> CliResult<()> {
    if args.amount.is_zero() {
        return Err(CliError::InvalidArgument(
            "deposit amount must be greater than zero".to_string(),
        ));
    }
    let balance = engine.ledger().deposit(args.account, args.amount)?;

    report.done(&format!("Deposited {} to {}", args.amount, args.account))?;
    report.show(&json!({
        "account": args.account.to_hex(),
        "quote_balance": balance.to_string(),
    }))
}

/// Quotes read through a snapshot cache sized by the engine config, so a
/// ladder of amounts is priced off one snapshot
pub fn handle_quote(engine: &LocalEngine, action: &QuoteAction, report: &Report) -> CliResult<()> {
    let cache = SnapshotCache::from_config(engine.config());
    let quoter = Quoter::new(engine, &cache);

    let (target, kind) = match action {
        QuoteAction::Buy(target) => (target, TradeKind::Buy),
        QuoteAction::Sell(target) => (target, TradeKind::Sell),
    };
    let pool = PoolId(target.pool);

    let mut views = Vec::with_capacity(target.amounts.len());
    for amount in &target.amounts {
        let quote = match kind {
            TradeKind::Buy => quoter.quote_buy(pool, *amount)?,
            TradeKind::Sell => quoter.quote_sell(pool, *amount)?,
        };
        views.push(quote_json(target.pool, &quote));
    }

    match views.len() {
        1 => report.show(&views.remove(0)),
        _ => report.show(&Value::Array(views)),
    }
}

pub fn handle_buy(
    engine: &LocalEngine,
    args: &BuyArgs,
    report: &Report,
) -> CliResult<()> {
    let request = TradeRequest::buy(args.amount, args.max_cost.unwrap_or(U256::MAX));
    let trade = engine.execute(args.account, PoolId(args.pool), &request, unix_now())?;

    report.done(&format!(
        "Bought {} units from pool {} for {}",
        trade.amount,
        trade.pool_id,
        trade.trader_total()
    ))?;
    if engine.get_pool_state(trade.pool_id)?.migrated {
        report.note(&format!("Pool {} reached its threshold and migrated", trade.pool_id))?;
    }
    report.show(&trade_json(&trade))
}

pub fn handle_sell(
    engine: &LocalEngine,
    args: &SellArgs,
    report: &Report,
) -> CliResult<()> {
    let request = TradeRequest::sell(args.amount, args.min_return.unwrap_or_else(U256::zero));
    let trade = engine.execute(args.account, PoolId(args.pool), &request, unix_now())?;

    report.done(&format!(
        "Sold {} units to pool {} for {}",
        trade.amount,
        trade.pool_id,
        trade.trader_total()
    ))?;
    report.show(&trade_json(&trade))
}

pub fn handle_info(
    engine: &LocalEngine,
    args: &PoolArgs,
    report: &Report,
) -> CliResult<()> {
    report.show(&pool_view(engine, PoolId(args.pool))?)
}

pub fn handle_list(
    engine: &LocalEngine,
    args: &ListArgs,
    report: &Report,
) -> CliResult<()> {
    let ids = match args.status.as_deref() {
        Some("active") => engine.pools_by_status(PoolStatus::Active)?,
        Some("migrated") => engine.pools_by_status(PoolStatus::Migrated)?,
        Some(other) => {
            return Err(CliError::InvalidArgument(format!("unknown status '{}'", other)))
        }
        None => engine.list_pools()?,
    };

    if ids.is_empty() && report.format() == OutputFormat::Table {
        return report.note("No pools");
    }

    let pools = ids
        .into_iter()
        .map(|id| pool_view(engine, id))
        .collect::<CliResult<Vec<_>>>()?;
    report.show(&Value::Array(pools))
}

pub fn handle_trades(
    engine: &LocalEngine,
    args: &PoolArgs,
    report: &Report,
) -> CliResult<()> {
    let trades = engine.trades(PoolId(args.pool))?;
    if trades.is_empty() && report.format() == OutputFormat::Table {
        return report.note(&format!("Pool {} has no trades", args.pool));
    }

    report.show(&Value::Array(trades.iter().map(trade_json).collect()))
}

pub fn handle_balance(
    engine: &LocalEngine,
    args: &BalanceArgs,
    report: &Report,
) -> CliResult<()> {
    let ledger = engine.ledger();
    let mut view = json!({
        "account": args.account.to_hex(),
        "quote_balance": ledger.quote_balance(&Holder::Account(args.account))?.to_string(),
    });

    if let Some(pool) = args.pool {
        let pool = PoolId(pool);
        // Fail on unknown pools instead of reporting zero units
        engine.get_pool_state(pool)?;
        view["pool_id"] = json!(pool.0);
        view["units"] = json!(ledger.unit_balance(pool, &args.account)?.to_string());
    }

    report.show(&view)
}

pub fn handle_migrate(
    engine: &LocalEngine,
    args: &MigrateArgs,
    report: &Report,
) -> CliResult<()> {
    let pool = PoolId(args.pool);
    engine.migrate(args.account, pool, unix_now())?;

    report.done(&format!("Migrated pool {}", pool))?;
    report.show(&pool_view(engine, pool)?)
}

pub fn handle_stats(engine: &LocalEngine, report: &Report) -> CliResult<()> {
    let stats = engine.registry_stats()?;
    report.show(&json!({
        "total_pools": stats.total_pools,
        "active_pools": stats.active_pools,
        "migrated_pools": stats.migrated_pools,
        "migrated_by_threshold": stats.migrated_by_threshold,
        "migrated_by_admin": stats.migrated_by_admin,
        "total_reserve": stats.total_reserve.to_string(),
        "total_trades": stats.total_trades,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument_parsing::QuoteTarget;
    use crate::commands::open_engine;
    use crate::output::testing::CapturedOutput;
    use lib_launchpad::{AccountId, EngineConfig, LaunchError};

    const ADMIN: AccountId = AccountId([0xad; 32]);
    const ALICE: AccountId = AccountId([1u8; 32]);

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn local_engine(dir: &tempfile::TempDir) -> LocalEngine {
        let config = EngineConfig {
            admin: ADMIN,
            fee_receiver: AccountId([0xfe; 32]),
            ..EngineConfig::default()
        };
        open_engine(dir.path(), config).unwrap()
    }

    fn json(output: &CapturedOutput) -> Report<'_> {
        Report::new(output, OutputFormat::Json)
    }

    fn create(engine: &LocalEngine, report: &Report) {
        let args = CreateArgs {
            base_price: u(1_000),
            slope: u(10),
            max_supply: u(1_000_000),
            migration_threshold: u(500),
        };
        handle_create(engine, &args, report).unwrap();
    }

    #[test]
    fn test_create_and_info() {
        let dir = tempfile::tempdir().unwrap();
        let engine = local_engine(&dir);
        let output = CapturedOutput::new();
        let report = json(&output);

        create(&engine, &report);
        let created = output.last_view();
        assert_eq!(created["pool_id"], 0);
        assert_eq!(created["status"], "active");
        assert_eq!(created["current_price"], "1000");
        assert!(output.notices().is_empty());

        handle_info(&engine, &PoolArgs { pool: 0 }, &report).unwrap();
        assert_eq!(output.last_view()["migration_threshold"], "500");
    }

    #[test]
    fn test_trade_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let engine = local_engine(&dir);
        let output = CapturedOutput::new();
        let report = json(&output);
        create(&engine, &report);

        handle_deposit(&engine, &DepositArgs { account: ALICE, amount: u(1_000_000) }, &report)
            .unwrap();
        assert_eq!(output.last_view()["quote_balance"], "1000000");

        let target = QuoteTarget { pool: 0, amounts: vec![u(100)] };
        handle_quote(&engine, &QuoteAction::Buy(target), &report).unwrap();
        let quoted = output.last_view();
        assert_eq!(quoted["value"], "150000");
        assert_eq!(quoted["fee"], "1500");
        assert_eq!(quoted["total"], "151500");

        let buy = BuyArgs {
            account: ALICE,
            pool: 0,
            amount: u(100),
            max_cost: Some(u(150_000)),
        };
        handle_buy(&engine, &buy, &report).unwrap();
        assert_eq!(output.last_view()["settled_value"], "150000");

        let sell = SellArgs {
            account: ALICE,
            pool: 0,
            amount: u(40),
            min_return: None,
        };
        handle_sell(&engine, &sell, &report).unwrap();
        assert_eq!(output.last_view()["kind"], "sell");

        handle_balance(&engine, &BalanceArgs { account: ALICE, pool: Some(0) }, &report).unwrap();
        assert_eq!(output.last_view()["units"], "60");

        handle_trades(&engine, &PoolArgs { pool: 0 }, &report).unwrap();
        let trades = output.last_view();
        assert_eq!(trades.as_array().map(Vec::len), Some(2));
        assert_eq!(trades[1]["sequence"], 1);
    }

    #[test]
    fn test_quote_ladder_matches_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = local_engine(&dir);
        let output = CapturedOutput::new();
        let report = json(&output);
        create(&engine, &report);

        let target = QuoteTarget { pool: 0, amounts: vec![u(10), u(100), u(400)] };
        handle_quote(&engine, &QuoteAction::Buy(target), &report).unwrap();

        let ladder = output.last_view();
        let rungs = ladder.as_array().unwrap();
        assert_eq!(rungs.len(), 3);
        for (rung, amount) in rungs.iter().zip([10u64, 100, 400]) {
            let expected = engine.quote_buy(PoolId(0), u(amount)).unwrap();
            assert_eq!(rung["value"], expected.to_string());
            assert_eq!(rung["amount"], amount.to_string());
        }
    }

    #[test]
    fn test_slippage_surfaces_as_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = local_engine(&dir);
        let output = CapturedOutput::new();
        let report = json(&output);
        create(&engine, &report);
        engine.ledger().deposit(ALICE, u(1_000_000)).unwrap();

        let buy = BuyArgs {
            account: ALICE,
            pool: 0,
            amount: u(100),
            max_cost: Some(u(149_999)),
        };
        let err = handle_buy(&engine, &buy, &report).unwrap_err();
        assert!(matches!(
            err,
            CliError::Launch(LaunchError::SlippageExceeded { .. })
        ));
    }

    #[test]
    fn test_migrate_requires_admin() {
        let dir = tempfile::tempdir().unwrap();
        let engine = local_engine(&dir);
        let output = CapturedOutput::new();
        let report = json(&output);
        create(&engine, &report);

        let err = handle_migrate(&engine, &MigrateArgs { account: ALICE, pool: 0 }, &report)
            .unwrap_err();
        assert!(matches!(err, CliError::Launch(LaunchError::Unauthorized)));

        let table = Report::new(&output, OutputFormat::Table);
        handle_migrate(&engine, &MigrateArgs { account: ADMIN, pool: 0 }, &table).unwrap();
        output.assert_notice("Migrated pool 0");

        handle_list(&engine, &ListArgs { status: Some("migrated".to_string()) }, &report)
            .unwrap();
        assert_eq!(output.last_view()[0]["migration_source"], "administrative");

        handle_stats(&engine, &report).unwrap();
        assert_eq!(output.last_view()["migrated_by_admin"], 1);
    }

    #[test]
    fn test_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let engine = local_engine(&dir);
        let output = CapturedOutput::new();

        handle_list(&engine, &ListArgs { status: None }, &Report::new(&output, OutputFormat::Table))
            .unwrap();
        output.assert_notice("No pools");
        assert!(output.views().is_empty());

        handle_list(&engine, &ListArgs { status: None }, &json(&output)).unwrap();
        assert_eq!(output.last_view(), Value::Array(Vec::new()));
    }

    #[test]
    fn test_balance_unknown_pool() {
        let dir = tempfile::tempdir().unwrap();
        let engine = local_engine(&dir);
        let output = CapturedOutput::new();

        let err = handle_balance(
            &engine,
            &BalanceArgs { account: ALICE, pool: Some(9) },
            &json(&output),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CliError::Launch(LaunchError::PoolNotFound(PoolId(9)))
        ));
    }
}
