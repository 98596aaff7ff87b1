//! Plot a raw IMU trace (`t,gx,gy,gz,ax,ay,az`) as gyro and accel panels

use balancebot_e2e::cli::{finish, init_logging, parse_plot_args, render_figure, CliResult};
use balancebot_e2e::core::trace::output_path;
use balancebot_e2e::SensorTrace;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Plot a sensor CSV trace
#[derive(Parser, Debug)]
#[command(name = "plot-csv", version, about = "Plot gyro and accel series from a sensor trace")]
struct Cli {
    /// Trace written by the simulator
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
    let trace = match SensorTrace::from_path(csv_path) {
        Ok(trace) => trace,
        Err(e) => return e.into(),
    };
    tracing::info!(samples = trace.len(), path = %csv_path.display(), "trace loaded");

    render_figure(&trace.figure(), &out)
}

fn main() -> ExitCode {
    let cli: Cli = match parse_plot_args("usage: plot-csv <csv_path>") {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    init_logging(tracing::Level::WARN, false);

    finish("plot-csv", &plot(&cli.csv_path, cli.output.as_deref()))
}
