//! Harness settings

use crate::core::sequencer::{CommandSequence, WireCommand};
use crate::core::transport::TcpConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Values given on the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Bridge host
    pub host: Option<String>,
    /// Bridge port
    pub port: Option<u16>,
    /// Pause between commands (ms)
    pub delay_ms: Option<u64>,
    /// Collection window (ms)
    pub window_ms: Option<u64>,
    /// Per-read timeout (ms)
    pub read_timeout_ms: Option<u64>,
}

/// Full harness configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Where to connect
    pub target: TargetConfig,
    /// What to send
    pub sequence: SequenceConfig,
    /// How long to listen
    pub collect: CollectConfig,
    /// How to summarize
    pub report: ReportConfig,
}

impl HarnessConfig {
    /// Load from a TOML file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `harness.toml` from the config directory when it exists
    pub fn load_default() -> Result<Self, ConfigError> {
        match super::config_file() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load `path` (or the default file when `None`), apply `overrides`, validate
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load_default()?,
        };
        config.with_overrides(overrides)
    }

    /// Apply command-line overrides, then validate the result
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(host) = &overrides.host {
            self.target.host.clone_from(host);
        }
        if let Some(port) = overrides.port {
            self.target.port = port;
        }
        if let Some(timeout) = overrides.read_timeout_ms {
            self.target.read_timeout_ms = timeout;
        }
        if let Some(delay) = overrides.delay_ms {
            self.sequence.delay_ms = delay;
        }
        if let Some(window) = overrides.window_ms {
            self.collect.window_ms = window;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the harness cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.host.trim().is_empty() {
            return Err(ConfigError::Invalid("target.host is empty".into()));
        }
        if self.target.port == 0 {
            return Err(ConfigError::Invalid("target.port must be non-zero".into()));
        }
        if self.target.connect_timeout_ms == 0 || self.target.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("target timeouts must be non-zero".into()));
        }
        if self.collect.window_ms == 0 {
            return Err(ConfigError::Invalid("collect.window_ms must be non-zero".into()));
        }
        if self.report.prefix.is_empty() {
            return Err(ConfigError::Invalid("report.prefix is empty".into()));
        }
        if let Some(bad) = self.sequence.commands.iter().find(|c| c.trim_end_matches('\n').contains('\n')) {
            return Err(ConfigError::Invalid(format!("command spans several lines: {bad:?}")));
        }
        Ok(())
    }

    /// TCP settings for the connection manager
    pub fn tcp_config(&self) -> TcpConfig {
        TcpConfig::new(&self.target.host, self.target.port)
            .connect_timeout(Duration::from_millis(self.target.connect_timeout_ms))
            .read_timeout(Duration::from_millis(self.target.read_timeout_ms))
    }

    /// Command sequence to send
    pub fn command_sequence(&self) -> CommandSequence {
        CommandSequence::from_lines(&self.sequence.commands, Duration::from_millis(self.sequence.delay_ms))
    }

    /// Collection window
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.collect.window_ms)
    }

    /// Per-read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.target.read_timeout_ms)
    }
}

/// Connection target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Per-read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9001,
            connect_timeout_ms: 2000,
            read_timeout_ms: 2000,
        }
    }
}

/// Command sequence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Command lines, sent in order
    pub commands: Vec<String>,
    /// Pause between consecutive commands in milliseconds
    pub delay_ms: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            commands: [
                WireCommand::Start,
                WireCommand::Arm,
                WireCommand::Mode(9),
                WireCommand::Disarm,
                WireCommand::Stop,
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            delay_ms: 200,
        }
    }
}

/// Telemetry collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Collection window in milliseconds
    pub window_ms: u64,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self { window_ms: 1000 }
    }
}

/// Report settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Prefix marking a line as a telemetry frame
    pub prefix: String,
    /// Frames shown from the start
    pub head: usize,
    /// Frames shown from the end
    pub tail: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            prefix: "R:".to_string(),
            head: 5,
            tail: 5,
        }
    }
}
