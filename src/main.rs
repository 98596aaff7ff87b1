//! BalanceBot E2E harness
//!
//! Connects to the simulator bridge, sends the command sequence, samples
//! telemetry and prints a summary of the `R:` frames on stdout.

use balancebot_e2e::cli::{exit_code_description, init_logging};
use balancebot_e2e::{
    CliResult, ConfigError, ConfigOverrides, Harness, HarnessConfig, JsonSink, ReportSink, TextSink,
};
use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Report output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format for scripting
    Json,
}

/// BalanceBot end-to-end harness
#[derive(Parser, Debug)]
#[command(name = "balancebot-e2e", version, about = "End-to-end run against the BalanceBot bridge", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bridge host
    #[arg(long, env = "E2E_HOST")]
    host: Option<String>,

    /// Bridge port
    #[arg(long, env = "E2E_PORT")]
    port: Option<u16>,

    /// Pause between commands (ms)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Telemetry collection window (ms)
    #[arg(long)]
    window_ms: Option<u64>,

    /// Per-read timeout (ms)
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Log as JSON lines on stderr
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::WARN
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// File or default config with command-line overrides applied
    fn harness_config(&self) -> Result<HarnessConfig, ConfigError> {
        let overrides = ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            delay_ms: self.delay_ms,
            window_ms: self.window_ms,
            read_timeout_ms: self.read_timeout_ms,
        };
        HarnessConfig::resolve(self.config.as_deref(), &overrides)
    }
}

async fn run(cli: &Cli) -> Result<(), CliResult> {
    let config = cli.harness_config()?;
    let harness = Harness::new(config);

    let token = harness.cancellation_token();
    if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
        tracing::warn!(error = %e, "Ctrl-C handler not installed");
    }

    let outcome = harness.run().await?;

    let stdout = io::stdout().lock();
    match cli.format {
        OutputFormat::Text => TextSink::new(stdout).emit(&outcome.report)?,
        OutputFormat::Json => JsonSink::new(stdout).pretty(true).emit(&outcome.report)?,
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level(), cli.log_json);

    let result = run(&cli).await.err().unwrap_or_else(CliResult::success);
    if let CliResult::Error(code, msg) = &result {
        eprintln!("error: {msg} ({})", exit_code_description(*code));
    }
    result.to_exit_code()
}
