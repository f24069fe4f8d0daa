//! Launchpad Command-Line Interface
//!
//! Entry point for the `launchpad` binary. Parses command-line arguments
//! and delegates to the appropriate command handler.

use launchpad_cli::run_cli;

fn main() -> anyhow::Result<()> {
    run_cli()
}
