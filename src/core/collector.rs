//! Telemetry collection
//!
//! Samples the connection for a bounded window after the command sequence
//! has been sent. Collection is best-effort: it keeps whatever complete
//! lines arrive before the window elapses, a read times out, the peer
//! closes, or the run is cancelled.

use crate::core::clock::Clock;
use crate::core::codec::{self, LineCodec};
use crate::core::transport::{Received, Transport, TransportError};
use bytes::BytesMut;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;

/// Why collection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The collection window elapsed
    WindowElapsed,
    /// A single read saw no data within the read timeout
    ReadTimeout,
    /// The peer closed the stream
    PeerClosed,
    /// The run was cancelled
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindowElapsed => write!(f, "window elapsed"),
            Self::ReadTimeout => write!(f, "read timeout"),
            Self::PeerClosed => write!(f, "peer closed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Lines collected during one window, in receipt order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Every complete line, recognized or not
    pub lines: Vec<String>,
    /// What ended collection
    pub stop_reason: StopReason,
    /// Raw bytes read
    pub bytes_received: u64,
    /// Undelimited bytes left over when the window closed
    pub discarded_bytes: usize,
    /// Lines that needed replacement characters
    pub lossy_lines: u64,
    /// Time spent collecting
    pub elapsed: Duration,
}

/// Reads the connection for a bounded window and reassembles lines
pub struct TelemetryCollector<'a> {
    clock: &'a dyn Clock,
    cancel: &'a CancellationToken,
    window: Duration,
    read_timeout: Duration,
}

impl<'a> TelemetryCollector<'a> {
    /// Create a collector with the given window and per-read timeout
    pub fn new(clock: &'a dyn Clock, cancel: &'a CancellationToken, window: Duration, read_timeout: Duration) -> Self {
        Self {
            clock,
            cancel,
            window,
            read_timeout,
        }
    }

    /// Collect until the first stop condition.
    ///
    /// Read timeouts and peer close end collection normally. Any other read
    /// failure is returned as an error.
    pub async fn collect<T>(&self, transport: &mut T) -> Result<Capture, TransportError>
    where
        T: Transport + ?Sized,
    {
        let started = self.clock.now();
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::with_capacity(4096);
        let mut lines = Vec::new();
        let mut bytes_received = 0u64;

        let stop_reason = loop {
            let elapsed = self.clock.now().saturating_sub(started);
            if elapsed >= self.window {
                break StopReason::WindowElapsed;
            }
            let wait = self.read_timeout.min(self.window - elapsed);

            let received = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break StopReason::Cancelled,
                received = transport.receive(wait) => received?,
            };

            match received {
                Received::Data(bytes) => {
                    bytes_received += bytes.len() as u64;
                    buffer.extend_from_slice(&bytes);
                    let before = lines.len();
                    lines.extend(codec::drain_lines(&mut codec, &mut buffer));
                    tracing::trace!(bytes = bytes.len(), lines = lines.len() - before, "read");
                }
                Received::Closed => {
                    // The stream is over, so a trailing fragment is final
                    if let Some(line) = codec.decode_eof(&mut buffer)? {
                        lines.push(line);
                    }
                    break StopReason::PeerClosed;
                }
                Received::TimedOut if wait < self.read_timeout => break StopReason::WindowElapsed,
                Received::TimedOut => break StopReason::ReadTimeout,
            }
        };

        let discarded_bytes = codec::discard(&mut buffer);
        let capture = Capture {
            lines,
            stop_reason,
            bytes_received,
            discarded_bytes,
            lossy_lines: codec.lossy_lines(),
            elapsed: self.clock.now().saturating_sub(started),
        };

        if stop_reason == StopReason::Cancelled {
            tracing::warn!(lines = capture.lines.len(), "telemetry collection cancelled");
        }
        tracing::info!(
            lines = capture.lines.len(),
            bytes = capture.bytes_received,
            reason = %capture.stop_reason,
            discarded_bytes = capture.discarded_bytes,
            lossy_lines = capture.lossy_lines,
            elapsed_ms = capture.elapsed.as_millis(),
            "telemetry collected"
        );
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::transport::{FakeStep, FakeTransport};
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(1);
    const READ_TIMEOUT: Duration = Duration::from_secs(2);

    async fn collect(clock: &Arc<ManualClock>, script: Vec<FakeStep>) -> Capture {
        let cancel = CancellationToken::new();
        let mut fake = FakeTransport::new(Arc::clone(clock), script);
        TelemetryCollector::new(clock.as_ref(), &cancel, WINDOW, READ_TIMEOUT)
            .collect(&mut fake)
            .await
            .unwrap()
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test]
    async fn test_reassembles_fragmented_lines() {
        let clock = ManualClock::shared();
        let capture = collect(
            &clock,
            vec![
                FakeStep::data("R:0 P:1"),
                FakeStep::delayed(ms(10), " Y:0\nR:1 P:2 Y:0\nR"),
                FakeStep::delayed(ms(10), ":2\n"),
                FakeStep::close(),
            ],
        )
        .await;

        assert_eq!(capture.lines, ["R:0 P:1 Y:0", "R:1 P:2 Y:0", "R:2"]);
        assert_eq!(capture.stop_reason, StopReason::PeerClosed);
        assert_eq!(capture.bytes_received, 28);
    }

    #[tokio::test]
    async fn test_peer_close_keeps_buffered_fragment() {
        let clock = ManualClock::shared();
        let capture = collect(&clock, vec![FakeStep::data("R:0\nR:1"), FakeStep::close()]).await;

        assert_eq!(capture.lines, ["R:0", "R:1"]);
        assert_eq!(capture.stop_reason, StopReason::PeerClosed);
        assert_eq!(capture.discarded_bytes, 0);
    }

    #[tokio::test]
    async fn test_window_bounds_collection() {
        let clock = ManualClock::shared();
        let script = (0..20)
            .map(|i| FakeStep::delayed(ms(100), format!("R:{i}\n")))
            .collect();
        let capture = collect(&clock, script).await;

        // Frames land at 100ms..=1000ms
        assert_eq!(capture.lines.len(), 10);
        assert_eq!(capture.lines.last().map(String::as_str), Some("R:9"));
        assert_eq!(capture.stop_reason, StopReason::WindowElapsed);
        assert_eq!(capture.elapsed, WINDOW);
    }

    #[tokio::test]
    async fn test_silence_past_window_ends_as_window_elapsed() {
        let clock = ManualClock::shared();
        let capture = collect(&clock, vec![FakeStep::data("R:0\npart")]).await;

        assert_eq!(capture.lines, ["R:0"]);
        assert_eq!(capture.stop_reason, StopReason::WindowElapsed);
        assert_eq!(capture.discarded_bytes, 4);
        assert_eq!(clock.now(), WINDOW);
    }

    #[tokio::test]
    async fn test_read_timeout_inside_window() {
        let clock = ManualClock::shared();
        let cancel = CancellationToken::new();
        let mut fake = FakeTransport::new(
            Arc::clone(&clock),
            vec![FakeStep::data("R:0\n"), FakeStep::delayed(ms(500), "R:1\n")],
        );

        let capture = TelemetryCollector::new(clock.as_ref(), &cancel, WINDOW, ms(200))
            .collect(&mut fake)
            .await
            .unwrap();

        assert_eq!(capture.lines, ["R:0"]);
        assert_eq!(capture.stop_reason, StopReason::ReadTimeout);
        assert_eq!(capture.elapsed, ms(200));
    }

    #[tokio::test]
    async fn test_read_error_is_fatal() {
        let clock = ManualClock::shared();
        let cancel = CancellationToken::new();
        let mut fake = FakeTransport::new(
            Arc::clone(&clock),
            vec![FakeStep::data("R:0\n"), FakeStep::Fail(std::io::ErrorKind::ConnectionReset)],
        );

        let result = TelemetryCollector::new(clock.as_ref(), &cancel, WINDOW, READ_TIMEOUT)
            .collect(&mut fake)
            .await;
        assert!(matches!(result, Err(TransportError::IoError(_))));
    }

    #[tokio::test]
    async fn test_cancelled_collection_keeps_nothing_new() {
        let clock = ManualClock::shared();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut fake = FakeTransport::new(Arc::clone(&clock), vec![FakeStep::data("R:0\n")]);

        let capture = TelemetryCollector::new(clock.as_ref(), &cancel, WINDOW, READ_TIMEOUT)
            .collect(&mut fake)
            .await
            .unwrap();
        assert!(capture.lines.is_empty());
        assert_eq!(capture.stop_reason, StopReason::Cancelled);
    }
}
