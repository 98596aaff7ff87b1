//! # BalanceBot E2E Library
//!
//! End-to-end harness for the BalanceBot simulator bridge. The harness talks the
//! bridge's line-based TCP protocol:
//! - Connects to the bridge with a bounded connect timeout
//! - Sends a fixed, paced command sequence (`START`, `ARM`, `MODE:<n>`, ...)
//! - Samples telemetry for a bounded collection window
//! - Summarizes the `R:` telemetry frames it received
//!
//! It also carries the data side of the trace plotting tools: CSV traces are
//! loaded into typed series and handed to a pluggable renderer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use balancebot_e2e::{Harness, HarnessConfig, ReportSink, TextSink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let harness = Harness::new(HarnessConfig::default());
//!     let outcome = harness.run().await?;
//!
//!     let mut sink = TextSink::new(std::io::stdout());
//!     sink.emit(&outcome.report)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes};
pub use crate::config::{
    CollectConfig, ConfigError, ConfigOverrides, HarnessConfig, ReportConfig, SequenceConfig, TargetConfig,
};
#[cfg(feature = "test-util")]
pub use crate::core::clock::ManualClock;
pub use crate::core::clock::{Clock, TokioClock};
pub use crate::core::codec::LineCodec;
pub use crate::core::collector::{Capture, StopReason, TelemetryCollector};
pub use crate::core::connection::ConnectionManager;
pub use crate::core::harness::{Harness, HarnessError, RunOutcome};
pub use crate::core::report::{Attitude, JsonSink, MemorySink, ReportSink, SessionReport, TextSink};
pub use crate::core::sequencer::{Command, CommandSequence, CommandSequencer, SendLog, WireCommand};
pub use crate::core::trace::{Figure, Panel, Renderer, SensorTrace, Series, StartupLoad, StartupTrace, TraceError};
pub use crate::core::transport::{Received, TcpConfig, TcpTransport, Transport, TransportError, TransportStats};
#[cfg(feature = "test-util")]
pub use crate::core::transport::{FakeHandle, FakeStep, FakeTransport, SentRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
