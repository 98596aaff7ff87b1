//! TCP transport implementation

use super::{Received, Transport, TransportError, TransportStats};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Read buffer size for a single `receive`
const READ_CHUNK: usize = 4096;

/// TCP connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Upper bound for a single read
    pub read_timeout: Duration,
}

impl TcpConfig {
    /// Create a new TCP configuration
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(2),
        }
    }

    /// Set connect timeout
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set read timeout
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// `host:port` form
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 9001)
    }
}

/// TCP transport
pub struct TcpTransport {
    config: TcpConfig,
    stream: Option<TcpStream>,
    stats: TransportStats,
}

impl TcpTransport {
    /// Create a new, unconnected TCP transport
    pub fn new(config: TcpConfig) -> Self {
        Self {
            config,
            stream: None,
            stats: TransportStats::default(),
        }
    }

    /// Open the connection, bounded by the configured connect timeout
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        let addr = self.config.address();

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::Timeout(self.config.connect_timeout))?
            .map_err(|e| TransportError::ConnectionFailed(format!("{addr}: {e}")))?;

        // Commands are tiny; don't let Nagle hold them back
        stream.set_nodelay(true).map_err(TransportError::IoError)?;

        self.stream = Some(stream);
        self.stats = TransportStats::default();

        tracing::debug!(%addr, "tcp connected");
        Ok(())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        stream.write_all(data).await.map_err(TransportError::IoError)?;
        stream.flush().await.map_err(TransportError::IoError)?;

        self.stats.bytes_sent += data.len() as u64;
        self.stats.packets_sent += 1;

        Ok(data.len())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Received, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        let mut buffer = vec![0u8; READ_CHUNK];

        match tokio::time::timeout(timeout, stream.read(&mut buffer)).await {
            Err(_) => Ok(Received::TimedOut),
            Ok(Ok(0)) => Ok(Received::Closed),
            Ok(Ok(n)) => {
                buffer.truncate(n);
                self.stats.bytes_received += n as u64;
                self.stats.packets_received += 1;
                Ok(Received::Data(Bytes::from(buffer)))
            }
            Ok(Err(e)) => Err(TransportError::IoError(e)),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already be gone; the socket is dropped either way
            stream.shutdown().await.ok();
            tracing::debug!(addr = %self.config.address(), "tcp closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connection_info(&self) -> String {
        self.config.address()
    }

    fn stats(&self) -> TransportStats {
        self.stats.clone()
    }
}
