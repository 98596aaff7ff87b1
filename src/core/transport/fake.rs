//! Scripted in-memory transport
//!
//! Plays back a script of byte fragments, peer closes and read errors against
//! a [`ManualClock`], so timeouts and pacing are simulated instead of waited
//! for. Writes are recorded with the virtual time they happened at.

use super::{Received, Transport, TransportError, TransportStats};
use crate::core::clock::{Clock, ManualClock};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// One scripted event on the receive side
#[derive(Debug, Clone)]
pub enum FakeStep {
    /// Bytes become readable after `delay`
    Data {
        /// Virtual time until the bytes arrive
        delay: Duration,
        /// Payload, delivered as a single read
        bytes: Bytes,
    },
    /// Peer closes the stream after `delay`
    Close {
        /// Virtual time until the close
        delay: Duration,
    },
    /// Read fails with the given error kind
    Fail(std::io::ErrorKind),
}

impl FakeStep {
    /// Bytes available immediately
    pub fn data(bytes: impl AsRef<[u8]>) -> Self {
        Self::delayed(Duration::ZERO, bytes)
    }

    /// Bytes available after `delay`
    pub fn delayed(delay: Duration, bytes: impl AsRef<[u8]>) -> Self {
        Self::Data {
            delay,
            bytes: Bytes::copy_from_slice(bytes.as_ref()),
        }
    }

    /// Immediate peer close
    pub fn close() -> Self {
        Self::Close {
            delay: Duration::ZERO,
        }
    }
}

/// A write observed by the fake peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    /// Virtual time of the write
    pub at: Duration,
    /// Bytes written
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
struct FakeState {
    sent: Vec<SentRecord>,
    close_calls: usize,
    stats: TransportStats,
}

/// Shared view of what a [`FakeTransport`] observed, usable after the
/// transport itself has been moved into the harness
#[derive(Debug, Clone)]
pub struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

impl FakeHandle {
    /// Every write, in order
    pub fn sent(&self) -> Vec<SentRecord> {
        self.state.lock().sent.clone()
    }

    /// Concatenation of every write, as the peer would have read it
    pub fn written(&self) -> Vec<u8> {
        self.state
            .lock()
            .sent
            .iter()
            .flat_map(|r| r.bytes.iter().copied())
            .collect()
    }

    /// Number of `close` calls
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }
}

/// Minimal fake transport used in tests to script reads and capture writes
pub struct FakeTransport {
    clock: Arc<ManualClock>,
    script: VecDeque<FakeStep>,
    state: Arc<Mutex<FakeState>>,
    fail_send_after: Option<usize>,
    closed: bool,
    peer_closed: bool,
}

impl FakeTransport {
    /// Create a fake that plays `script` against `clock`
    pub fn new(clock: Arc<ManualClock>, script: Vec<FakeStep>) -> Self {
        Self {
            clock,
            script: script.into(),
            state: Arc::new(Mutex::new(FakeState::default())),
            fail_send_after: None,
            closed: false,
            peer_closed: false,
        }
    }

    /// Let the first `count` sends succeed and fail every one after
    #[must_use]
    pub fn fail_send_after(mut self, count: usize) -> Self {
        self.fail_send_after = Some(count);
        self
    }

    /// Observation handle
    pub fn handle(&self) -> FakeHandle {
        FakeHandle {
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::NotConnected);
        }

        let mut state = self.state.lock();
        if self.fail_send_after.is_some_and(|limit| state.sent.len() >= limit) {
            return Err(TransportError::IoError(std::io::ErrorKind::BrokenPipe.into()));
        }

        state.sent.push(SentRecord {
            at: self.clock.now(),
            bytes: Bytes::copy_from_slice(data),
        });
        state.stats.bytes_sent += data.len() as u64;
        state.stats.packets_sent += 1;
        Ok(data.len())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Received, TransportError> {
        if self.closed {
            return Err(TransportError::NotConnected);
        }
        if self.peer_closed {
            return Ok(Received::Closed);
        }

        let Some(mut step) = self.script.pop_front() else {
            // Script exhausted: the peer stays silent
            self.clock.advance(timeout);
            return Ok(Received::TimedOut);
        };

        if let FakeStep::Data { delay, .. } | FakeStep::Close { delay } = &mut step {
            if *delay > timeout {
                *delay -= timeout;
                self.clock.advance(timeout);
                self.script.push_front(step);
                return Ok(Received::TimedOut);
            }
        }

        match step {
            FakeStep::Data { delay, bytes } => {
                self.clock.advance(delay);
                let mut state = self.state.lock();
                state.stats.bytes_received += bytes.len() as u64;
                state.stats.packets_received += 1;
                Ok(Received::Data(bytes))
            }
            FakeStep::Close { delay } => {
                self.clock.advance(delay);
                self.peer_closed = true;
                Ok(Received::Closed)
            }
            FakeStep::Fail(kind) => Err(TransportError::IoError(kind.into())),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state.lock().close_calls += 1;
        self.closed = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }

    fn connection_info(&self) -> String {
        "fake".to_string()
    }

    fn stats(&self) -> TransportStats {
        self.state.lock().stats.clone()
    }
}
