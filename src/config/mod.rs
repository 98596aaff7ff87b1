//! Configuration module
//!
//! Handles harness settings: connection target, command sequence,
//! collection window and report layout

mod settings;

pub use settings::{CollectConfig, ConfigError, ConfigOverrides, HarnessConfig, ReportConfig, SequenceConfig, TargetConfig};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "balancebot", "BalanceBot").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default location of the harness config file
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("harness.toml"))
}
