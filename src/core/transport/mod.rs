//! Transport layer for the harness connection
//!
//! Supports:
//! - Raw TCP connections to the simulator bridge
//! - A scripted in-memory transport for deterministic tests (`test-util`)

#[cfg(any(test, feature = "test-util"))]
mod fake;
mod tcp;

#[cfg(any(test, feature = "test-util"))]
pub use fake::{FakeHandle, FakeStep, FakeTransport, SentRecord};
pub use tcp::{TcpConfig, TcpTransport};

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed (refused, unreachable, bad address)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection timeout
    #[error("Connection timeout after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// Operation interrupted by cancellation
    #[error("Cancelled")]
    Cancelled,
}

/// Outcome of a single bounded read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Bytes arrived; never empty
    Data(Bytes),
    /// Zero-length read, the peer closed the stream
    Closed,
    /// Nothing arrived before the read timeout
    TimedOut,
}

/// Transport statistics
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    /// Bytes sent
    pub bytes_sent: u64,
    /// Bytes received
    pub bytes_received: u64,
    /// Writes performed
    pub packets_sent: u64,
    /// Non-empty reads performed
    pub packets_received: u64,
}

/// Byte-stream connection used by the harness
#[async_trait]
pub trait Transport: Send {
    /// Write all of `data` as one unit
    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Wait at most `timeout` for the next chunk of bytes
    async fn receive(&mut self, timeout: Duration) -> Result<Received, TransportError>;

    /// Release the connection; calling it twice is a no-op
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Get connection info string
    fn connection_info(&self) -> String;

    /// Get statistics
    fn stats(&self) -> TransportStats;
}
