//! End-to-end run orchestration
//!
//! One run is connect → send commands → collect telemetry → build report,
//! each stage finishing before the next starts. The connection is closed on
//! every exit path, including errors and cancellation.

use crate::config::HarnessConfig;
use crate::core::clock::{Clock, TokioClock};
use crate::core::collector::{Capture, TelemetryCollector};
use crate::core::connection::ConnectionManager;
use crate::core::report::SessionReport;
use crate::core::sequencer::{CommandSequencer, SendLog};
use crate::core::transport::{Transport, TransportError};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Fatal run errors
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The connection could not be opened
    #[error("connect failed: {0}")]
    Connect(#[source] TransportError),

    /// A command could not be written
    #[error("send failed: {0}")]
    Send(#[source] TransportError),

    /// Reading telemetry failed for a reason other than timeout or close
    #[error("telemetry read failed: {0}")]
    Collect(#[source] TransportError),

    /// The run was cancelled before the commands were all sent
    #[error("run cancelled")]
    Cancelled,
}

impl HarnessError {
    /// The transport error behind this failure, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Connect(e) | Self::Send(e) | Self::Collect(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Summary of the recognized telemetry frames
    pub report: SessionReport,
    /// All lines captured, recognized or not
    pub capture: Capture,
    /// What was put on the wire
    pub sent: SendLog,
}

/// Drives one end-to-end run
pub struct Harness {
    config: HarnessConfig,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl Harness {
    /// Create a harness on real time
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            clock: Arc::new(TokioClock::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Use another clock for pacing and the collection window
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Token that stops the run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Configuration in use
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Connect to the configured target and run.
    ///
    /// Cancellation is honored while connecting; a cancelled run never dials.
    pub async fn run(&self) -> Result<RunOutcome, HarnessError> {
        if self.cancel.is_cancelled() {
            return Err(HarnessError::Cancelled);
        }

        let manager = ConnectionManager::new(self.config.tcp_config());
        let transport = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                tracing::warn!(addr = %manager.config().address(), "connect cancelled");
                return Err(HarnessError::Cancelled);
            }
            connected = manager.connect() => connected.map_err(HarnessError::Connect)?,
        };
        self.run_with(transport).await
    }

    /// Run over an already open transport, which is closed before returning
    pub async fn run_with<T: Transport>(&self, mut transport: T) -> Result<RunOutcome, HarnessError> {
        let result = self.drive(&mut transport).await;

        if let Err(e) = transport.close().await {
            tracing::warn!(error = %e, "closing connection failed");
        }
        result
    }

    async fn drive<T: Transport>(&self, transport: &mut T) -> Result<RunOutcome, HarnessError> {
        let sequence = self.config.command_sequence();
        let sent = CommandSequencer::new(self.clock.as_ref(), &self.cancel)
            .run(transport, &sequence)
            .await
            .map_err(|e| match e {
                TransportError::Cancelled => HarnessError::Cancelled,
                other => HarnessError::Send(other),
            })?;

        let capture = TelemetryCollector::new(
            self.clock.as_ref(),
            &self.cancel,
            self.config.window(),
            self.config.read_timeout(),
        )
        .collect(transport)
        .await
        .map_err(HarnessError::Collect)?;

        let report = SessionReport::from_capture(&capture, &self.config.report);
        tracing::info!(
            frames = report.count(),
            lines = capture.lines.len(),
            "run complete"
        );

        Ok(RunOutcome { report, capture, sent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::collector::StopReason;
    use crate::core::transport::{FakeStep, FakeTransport};
    use std::time::Duration;

    fn harness(clock: &Arc<ManualClock>) -> Harness {
        Harness::new(HarnessConfig::default()).with_clock(Arc::clone(clock) as Arc<dyn Clock>)
    }

    #[tokio::test]
    async fn test_run_closes_connection() {
        let clock = ManualClock::shared();
        let fake = FakeTransport::new(Arc::clone(&clock), vec![FakeStep::data("R:0\n"), FakeStep::close()]);
        let handle = fake.handle();

        let outcome = harness(&clock).run_with(fake).await.unwrap();

        assert_eq!(outcome.report.count(), 1);
        assert_eq!(outcome.sent.commands, 5);
        assert_eq!(outcome.capture.stop_reason, StopReason::PeerClosed);
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_still_closes() {
        let clock = ManualClock::shared();
        let fake = FakeTransport::new(Arc::clone(&clock), Vec::new()).fail_send_after(0);
        let handle = fake.handle();

        let err = harness(&clock).run_with(fake).await.unwrap_err();
        assert!(matches!(err, HarnessError::Send(_)));
        assert!(err.transport_error().is_some());
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_still_closes() {
        let clock = ManualClock::shared();
        let fake = FakeTransport::new(
            Arc::clone(&clock),
            vec![FakeStep::Fail(std::io::ErrorKind::ConnectionReset)],
        );
        let handle = fake.handle();

        let err = harness(&clock).run_with(fake).await.unwrap_err();
        assert!(matches!(err, HarnessError::Collect(_)));
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let clock = ManualClock::shared();
        let fake = FakeTransport::new(Arc::clone(&clock), Vec::new());
        let handle = fake.handle();

        let harness = harness(&clock);
        harness.cancellation_token().cancel();
        let err = harness.run_with(fake).await.unwrap_err();

        assert!(matches!(err, HarnessError::Cancelled));
        assert!(handle.sent().is_empty());
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_does_not_connect() {
        // Unroutable target with a long timeout; only cancellation ends this quickly
        let mut config = HarnessConfig::default();
        config.target.host = "192.0.2.1".to_string();
        config.target.connect_timeout_ms = 30_000;

        let harness = Harness::new(config);
        harness.cancellation_token().cancel();

        let started = std::time::Instant::now();
        let err = harness.run().await.unwrap_err();
        assert!(matches!(err, HarnessError::Cancelled), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_connect() {
        let mut config = HarnessConfig::default();
        config.target.host = "192.0.2.1".to_string();
        config.target.connect_timeout_ms = 30_000;

        let harness = Harness::new(config);
        let token = harness.cancellation_token();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = harness.run().await;
        canceller.await.unwrap();
        match result {
            Err(HarnessError::Cancelled) => {}
            // Some sandboxes reject the route before the cancel fires
            Err(HarnessError::Connect(TransportError::ConnectionFailed(_))) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timing_is_virtual() {
        let clock = ManualClock::shared();
        let fake = FakeTransport::new(Arc::clone(&clock), Vec::new());

        let outcome = harness(&clock).run_with(fake).await.unwrap();

        // 4 pauses of 200ms, then a silent 1s window
        assert_eq!(clock.now(), Duration::from_millis(1800));
        assert_eq!(outcome.capture.stop_reason, StopReason::WindowElapsed);
        assert_eq!(outcome.report.count(), 0);
    }
}
