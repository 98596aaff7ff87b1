//! Connection management
//!
//! Opens the single TCP connection a run uses. Connect failures (refused,
//! unreachable, timed out) are fatal and never retried.

use crate::core::transport::{TcpConfig, TcpTransport, Transport, TransportError};

/// Opens harness connections
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    config: TcpConfig,
}

impl ConnectionManager {
    /// Create a manager for the given target
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Target settings
    pub fn config(&self) -> &TcpConfig {
        &self.config
    }

    /// Connect, bounded by the configured connect timeout
    pub async fn connect(&self) -> Result<TcpTransport, TransportError> {
        tracing::info!(
            addr = %self.config.address(),
            timeout_ms = self.config.connect_timeout.as_millis(),
            "connecting"
        );

        let mut transport = TcpTransport::new(self.config.clone());
        if let Err(e) = transport.connect().await {
            tracing::error!(addr = %self.config.address(), error = %e, "connect failed");
            return Err(e);
        }

        tracing::info!(addr = %transport.connection_info(), "connected");
        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let manager = ConnectionManager::new(TcpConfig::new("127.0.0.1", port));
        let (transport, accepted) = tokio::join!(manager.connect(), listener.accept());

        let mut transport = transport.unwrap();
        accepted.unwrap();
        assert!(transport.is_connected());
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unroutable_target_times_out() {
        // TEST-NET-1 (RFC 5737) is never routed
        let config = TcpConfig::new("192.0.2.1", 9001).connect_timeout(Duration::from_millis(50));
        match ConnectionManager::new(config).connect().await {
            Err(TransportError::Timeout(timeout)) => assert_eq!(timeout, Duration::from_millis(50)),
            // Some sandboxes reject the route outright instead of dropping packets
            Err(TransportError::ConnectionFailed(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connected to a TEST-NET address"),
        }
    }
}
