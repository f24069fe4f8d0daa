//! Launchpad CLI Library
//!
//! Drives a local, sled-backed launch engine from the command line: create
//! pools, fund wallets, quote and execute trades, and migrate pools. The
//! `calc` command mirrors the engine's pricing offline using `lib-curve`
//! alone.

pub mod argument_parsing;
pub mod cli_config;
pub mod commands;
pub mod error;
pub mod output;

pub use argument_parsing::{run_cli, LaunchpadCli, LaunchpadCommand};
pub use error::{CliError, CliResult};
pub use output::{render_view, OutputFormat};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
