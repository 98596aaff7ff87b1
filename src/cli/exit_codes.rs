//! CLI Exit Codes
//!
//! Standard exit codes for the harness and plotting tools.

use crate::config::ConfigError;
use crate::core::harness::HarnessError;
use crate::core::trace::TraceError;
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error, bad usage of the plotting tools, missing backend
    pub const ERROR: u8 = 1;

    /// Invalid arguments (plot output would overwrite its input)
    pub const INVALID_ARGS: u8 = 2;

    /// Connection failed
    pub const CONNECTION_FAILED: u8 = 3;

    /// Connection timeout
    pub const TIMEOUT: u8 = 4;

    /// File not found
    pub const FILE_NOT_FOUND: u8 = 6;

    /// Permission denied
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// I/O failure on an open connection
    pub const IO_ERROR: u8 = 9;

    /// User cancelled
    pub const CANCELLED: u8 = 11;

    /// Data validation failed (CSV schema)
    pub const VALIDATION_FAILED: u8 = 17;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Plain success
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Success that still has something to say
    pub fn success_with_message(msg: impl Into<String>) -> Self {
        Self::Success(Some(msg.into()))
    }

    /// Failure with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) | Self::Error(_, msg) => Some(msg),
            Self::Success(None) => None,
        }
    }

    /// Convert to `ExitCode`
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<std::io::Error> for CliResult {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let code = match err.kind() {
            ErrorKind::NotFound => ExitCodes::FILE_NOT_FOUND,
            ErrorKind::PermissionDenied => ExitCodes::PERMISSION_DENIED,
            ErrorKind::ConnectionRefused => ExitCodes::CONNECTION_FAILED,
            ErrorKind::TimedOut => ExitCodes::TIMEOUT,
            _ => ExitCodes::ERROR,
        };

        Self::Error(code, err.to_string())
    }
}

impl From<HarnessError> for CliResult {
    fn from(err: HarnessError) -> Self {
        let code = match &err {
            HarnessError::Connect(TransportError::Timeout(_)) => ExitCodes::TIMEOUT,
            HarnessError::Connect(_) => ExitCodes::CONNECTION_FAILED,
            HarnessError::Send(_) | HarnessError::Collect(_) => ExitCodes::IO_ERROR,
            HarnessError::Cancelled => ExitCodes::CANCELLED,
        };
        Self::Error(code, err.to_string())
    }
}

impl From<ConfigError> for CliResult {
    fn from(err: ConfigError) -> Self {
        Self::Error(ExitCodes::CONFIG_ERROR, err.to_string())
    }
}

impl From<TraceError> for CliResult {
    fn from(err: TraceError) -> Self {
        match err {
            TraceError::Io(io) => io.into(),
            clash @ TraceError::OutputIsInput(_) => Self::Error(ExitCodes::INVALID_ARGS, clash.to_string()),
            other => Self::Error(ExitCodes::VALIDATION_FAILED, other.to_string()),
        }
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        4 => "Connection timeout",
        6 => "File not found",
        7 => "Permission denied",
        8 => "Configuration error",
        9 => "I/O error",
        11 => "Operation cancelled",
        17 => "Validation failed",
        _ => "Unknown error",
    }
}
