//! Command handlers
//!
//! `calc` works offline. Every other command opens the sled database under
//! the data directory and runs against a local engine whose launch store and
//! wallet ledger share it, so each trade lands in one transaction.

pub mod calc;
pub mod common;
pub mod pool;

use std::path::Path;

use lib_launchpad::{EngineConfig, LaunchEngine, SledAssetLedger, SledLaunchStore};
use tracing::debug;

use crate::argument_parsing::{LaunchpadCli, LaunchpadCommand};
use crate::cli_config::{load_config, resolve_data_dir};
use crate::error::{CliError, CliResult};
use crate::output::{Output, Report};

/// Engine over the on-disk store and ledger
pub type LocalEngine = LaunchEngine<SledAssetLedger, SledLaunchStore>;

pub fn open_engine(data_dir: &Path, config: EngineConfig) -> CliResult<LocalEngine> {
    let db = sled::open(data_dir).map_err(|e| CliError::DatabaseOpenFailed {
        path: data_dir.display().to_string(),
        reason: e.to_string(),
    })?;
    let (ledger, store) = SledLaunchStore::with_ledger(db)?;
    debug!("Opened launchpad database at {}", data_dir.display());
    Ok(LaunchEngine::new(config, ledger, store)?)
}

/// Dispatch a parsed command line
pub fn execute(cli: &LaunchpadCli, output: &dyn Output) -> CliResult<()> {
    let report = Report::new(output, cli.format);
    if let LaunchpadCommand::Calc(args) = &cli.command {
        return calc::handle_calc_command(&args.action, &report);
    }

    let config = load_config(cli.config.as_deref())?;
    let data_dir = resolve_data_dir(cli.data_dir.as_deref(), &config);
    let engine = open_engine(&data_dir, config.engine)?;

    let result = pool::handle_engine_command(&cli.command, &engine, &report);
    engine.store().flush()?;
    result
}
