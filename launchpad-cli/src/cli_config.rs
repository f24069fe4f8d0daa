//! CLI configuration loader
//!
//! The settings file is a `LaunchpadConfig` in TOML. An explicit path (from
//! `--config` or `LAUNCHPAD_CONFIG`) must exist; the default location is
//! optional and falls back to built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use lib_launchpad::LaunchpadConfig;

use crate::error::{CliError, CliResult};

/// Default config filename under ~/.launchpad/
pub const DEFAULT_CONFIG_FILENAME: &str = "launchpad.toml";

pub fn default_config_path() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".launchpad").join(DEFAULT_CONFIG_FILENAME)
    } else {
        PathBuf::from("./launchpad.toml")
    }
}

pub fn load_config(path: Option<&str>) -> CliResult<LaunchpadConfig> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        if path.is_some() {
            return Err(CliError::ConfigError(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }
        return Ok(LaunchpadConfig::default());
    }

    load_config_strict(&config_path)
}

pub fn load_config_strict(path: &Path) -> CliResult<LaunchpadConfig> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CliError::ConfigError(format!("Failed to read config: {}", e)))?;

    LaunchpadConfig::from_toml_str(&raw)
        .map_err(|e| CliError::ConfigError(format!("Invalid launchpad config: {}", e)))
}

/// `--data-dir` wins over the configured directory
pub fn resolve_data_dir(flag: Option<&Path>, config: &LaunchpadConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| config.data_dir.clone())
}
