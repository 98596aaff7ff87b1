//! CLI Module
//!
//! Shared command-line plumbing for the harness and plotting binaries:
//! - Exit codes for automation
//! - Logging setup
//! - Argument handling and output for the plotting tools

pub mod exit_codes;

pub use exit_codes::{exit_code_description, CliResult, ExitCodes};

use crate::core::trace::Figure;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Initialize stderr logging; `RUST_LOG` overrides `default_level`
pub fn init_logging(default_level: tracing::Level, json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // stdout carries the report, so logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Parse plotting tool arguments. Help and version exit through clap; any
/// other parse failure prints `usage` and yields exit status 1.
pub fn parse_plot_args<T: Parser>(usage: &str) -> Result<T, ExitCode> {
    match T::try_parse() {
        Ok(args) => Ok(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            eprintln!("{usage}");
            Err(ExitCode::from(ExitCodes::ERROR))
        }
    }
}

/// Draw `figure` into `out`
#[cfg(feature = "svg")]
pub fn render_figure(figure: &Figure, out: &Path) -> CliResult {
    use crate::core::trace::{Renderer, SvgRenderer};

    if out.exists() {
        tracing::warn!(path = %out.display(), "replacing existing figure");
    }
    match SvgRenderer::new(out).render(figure) {
        Ok(()) => CliResult::success_with_message(format!("wrote {}", out.display())),
        Err(e) => e.into(),
    }
}

/// Built without a drawing backend
#[cfg(not(feature = "svg"))]
pub fn render_figure(_figure: &Figure, _out: &Path) -> CliResult {
    CliResult::error(ExitCodes::ERROR, "no plotting backend; rebuild with `--features svg`")
}

/// Report a plotting tool's outcome: messages on stdout, errors on stderr
pub fn finish(tool: &str, result: &CliResult) -> ExitCode {
    match result {
        CliResult::Success(Some(msg)) => println!("{msg}"),
        CliResult::Success(None) => {}
        CliResult::Error(_, msg) => eprintln!("{tool}: {msg}"),
    }
    result.to_exit_code()
}
