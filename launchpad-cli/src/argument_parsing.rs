//! Command-line arguments and the top-level runner

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lib_launchpad::{AccountId, U256};
use tracing_subscriber::EnvFilter;

use crate::commands;
use crate::commands::common::{parse_account_id, parse_u256};
use crate::output::{ConsoleOutput, OutputFormat};

/// Launchpad CLI - bonding-curve token launches on a local engine
#[derive(Parser, Debug, Clone)]
#[command(name = "launchpad", version, about, long_about = None)]
pub struct LaunchpadCli {
    /// Directory holding the launchpad database
    #[arg(short, long, env = "LAUNCHPAD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "LAUNCHPAD_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: LaunchpadCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum LaunchpadCommand {
    /// Create a launch pool
    Create(CreateArgs),
    /// Credit quote asset to a local wallet
    Deposit(DepositArgs),
    /// Quote a trade without executing it
    Quote(QuoteArgs),
    /// Buy units from a pool
    Buy(BuyArgs),
    /// Sell units back to a pool
    Sell(SellArgs),
    /// Show a pool's configuration and state
    Info(PoolArgs),
    /// List pools
    List(ListArgs),
    /// Show a pool's trade log
    Trades(PoolArgs),
    /// Show wallet balances
    Balance(BalanceArgs),
    /// Migrate a pool (admin only)
    Migrate(MigrateArgs),
    /// Registry-wide statistics
    Stats,
    /// Offline curve calculator
    Calc(CalcArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Price per unit with nothing sold
    #[arg(long, value_parser = parse_u256)]
    pub base_price: U256,
    /// Price increase per unit sold
    #[arg(long, value_parser = parse_u256)]
    pub slope: U256,
    #[arg(long, value_parser = parse_u256)]
    pub max_supply: U256,
    /// Units sold at which the pool migrates
    #[arg(long, value_parser = parse_u256)]
    pub migration_threshold: U256,
}

#[derive(Args, Debug, Clone)]
pub struct DepositArgs {
    /// Account to credit (64 hex chars)
    #[arg(long, value_parser = parse_account_id)]
    pub account: AccountId,
    #[arg(long, value_parser = parse_u256)]
    pub amount: U256,
}

#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    #[command(subcommand)]
    pub action: QuoteAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QuoteAction {
    /// Cost of buying `amount` units
    Buy(QuoteTarget),
    /// Return for selling `amount` units
    Sell(QuoteTarget),
}

#[derive(Args, Debug, Clone)]
pub struct QuoteTarget {
    #[arg(long)]
    pub pool: u64,
    /// One or more amounts; several produce a price ladder
    #[arg(long = "amount", value_parser = parse_u256, required = true, num_args = 1..)]
    pub amounts: Vec<U256>,
}

#[derive(Args, Debug, Clone)]
pub struct BuyArgs {
    #[arg(long, value_parser = parse_account_id)]
    pub account: AccountId,
    #[arg(long)]
    pub pool: u64,
    #[arg(long, value_parser = parse_u256)]
    pub amount: U256,
    /// Maximum acceptable cost before fee (unbounded when omitted)
    #[arg(long, value_parser = parse_u256)]
    pub max_cost: Option<U256>,
}

#[derive(Args, Debug, Clone)]
pub struct SellArgs {
    #[arg(long, value_parser = parse_account_id)]
    pub account: AccountId,
    #[arg(long)]
    pub pool: u64,
    #[arg(long, value_parser = parse_u256)]
    pub amount: U256,
    /// Minimum acceptable return after fee (zero when omitted)
    #[arg(long, value_parser = parse_u256)]
    pub min_return: Option<U256>,
}

#[derive(Args, Debug, Clone)]
pub struct PoolArgs {
    #[arg(long)]
    pub pool: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only pools in this status
    #[arg(long, value_parser = ["active", "migrated"])]
    pub status: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct BalanceArgs {
    #[arg(long, value_parser = parse_account_id)]
    pub account: AccountId,
    /// Also show units held in this pool
    #[arg(long)]
    pub pool: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Calling account; must be the configured admin
    #[arg(long, value_parser = parse_account_id)]
    pub account: AccountId,
    #[arg(long)]
    pub pool: u64,
}

#[derive(Args, Debug, Clone)]
pub struct CalcArgs {
    #[command(subcommand)]
    pub action: CalcAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CalcAction {
    /// Cost of buying `amount` units after `sold`
    Buy(CurveInputs),
    /// Return for selling `amount` units out of `sold`
    Sell(CurveInputs),
}

#[derive(Args, Debug, Clone)]
pub struct CurveInputs {
    #[arg(long, value_parser = parse_u256)]
    pub base_price: U256,
    #[arg(long, value_parser = parse_u256)]
    pub slope: U256,
    /// Units already sold
    #[arg(long, value_parser = parse_u256)]
    pub sold: U256,
    #[arg(long, value_parser = parse_u256)]
    pub amount: U256,
    #[arg(long, default_value_t = lib_launchpad::config::DEFAULT_FEE_BPS)]
    pub fee_bps: u16,
}

/// Main CLI runner
pub fn run_cli() -> anyhow::Result<()> {
    let cli = LaunchpadCli::parse();
    init_tracing(cli.verbose);

    let output = ConsoleOutput;
    commands::execute(&cli, &output)?;
    Ok(())
}

/// Logs go to stderr so `--format json` output stays parseable
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
