//! Plot pitch against target pitch for the startup / stand-up ramp

use balancebot_e2e::cli::{finish, init_logging, parse_plot_args, render_figure, CliResult};
use balancebot_e2e::core::trace::{output_path, MISSING_TARGET_HINT};
use balancebot_e2e::{StartupLoad, StartupTrace};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Plot a startup trace
#[derive(Parser, Debug)]
#[command(name = "plot-startup", version, about = "Plot pitch and target pitch from a startup trace")]
struct Cli {
    /// Trace written by the simulator with `--trace`
    csv_path: PathBuf,

    /// Figure path (defaults to the trace path with an `.svg` extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn plot(csv_path: &Path, output: Option<&Path>) -> CliResult {
    let out = match output_path(csv_path, output) {
        Ok(out) => out,
        Err(e) => return e.into(),
    };
    let trace = match StartupTrace::from_path(csv_path) {
        Ok(StartupLoad::Loaded(trace)) => trace,
        // Nothing to plot, but not a failure
        Ok(StartupLoad::MissingTarget) => return CliResult::success_with_message(MISSING_TARGET_HINT),
        Err(e) => return e.into(),
    };
    tracing::info!(samples = trace.len(), path = %csv_path.display(), "trace loaded");

    render_figure(&trace.figure(), &out)
}

fn main() -> ExitCode {
    let cli: Cli = match parse_plot_args("usage: plot-startup <csv_path>") {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    init_logging(tracing::Level::WARN, false);

    finish("plot-startup", &plot(&cli.csv_path, cli.output.as_deref()))
}
