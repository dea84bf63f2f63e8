//! Timeout configuration for surreal-link operations.
//!
//! Centralizes the deadlines used by the connection engine: opening the
//! socket, writing a frame, waiting for a reply, keep-alive cadence and the
//! best-effort teardown work done on dispose.

use std::time::Duration;

/// Timeout configuration for surreal-link operations.
///
/// # Examples
///
/// ```rust
/// use surreal_link::SurrealLinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = SurrealLinkTimeouts::default();
///
/// // Custom timeouts for high-latency environments
/// let timeouts = SurrealLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(60))
///     .receive_timeout(Duration::from_secs(120))
///     .build();
///
/// // Aggressive timeouts for local development
/// let timeouts = SurrealLinkTimeouts::fast();
/// ```
#[derive(Debug, Clone)]
pub struct SurrealLinkTimeouts {
    /// Timeout for establishing the connection (TCP + TLS + WebSocket upgrade).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for writing one frame to the socket.
    /// Default: 10 seconds
    pub send_timeout: Duration,

    /// Timeout for waiting on the reply to one request.
    /// Set to 0 to wait indefinitely.
    /// Default: 30 seconds
    pub receive_timeout: Duration,

    /// Interval between keep-alive `ping` requests.
    /// Set to 0 to disable keep-alive.
    /// Default: 30 seconds
    pub keepalive_interval: Duration,

    /// Upper bound for each best-effort step of dispose (server-side kill of
    /// open live queries, WebSocket close handshake).
    /// Default: 2 seconds
    pub close_timeout: Duration,
}

impl Default for SurrealLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
            receive_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(30),
            close_timeout: Duration::from_secs(2),
        }
    }
}

impl SurrealLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> SurrealLinkTimeoutsBuilder {
        SurrealLinkTimeoutsBuilder::new()
    }

    /// Create timeouts optimized for fast local development.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            send_timeout: Duration::from_secs(2),
            receive_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(15),
            close_timeout: Duration::from_millis(500),
        }
    }

    /// Create timeouts optimized for high-latency or unreliable networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            send_timeout: Duration::from_secs(30),
            receive_timeout: Duration::from_secs(120),
            keepalive_interval: Duration::from_secs(30),
            close_timeout: Duration::from_secs(5),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365) // > 1 year
    }
}

/// Builder for creating custom [`SurrealLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct SurrealLinkTimeoutsBuilder {
    timeouts: SurrealLinkTimeouts,
}

impl SurrealLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: SurrealLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the send timeout (writing one frame).
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.send_timeout = timeout;
        self
    }

    /// Set the receive timeout (waiting for one reply).
    /// Set to 0 to wait indefinitely.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.receive_timeout = timeout;
        self
    }

    /// Set the receive timeout in seconds.
    pub fn receive_timeout_secs(self, secs: u64) -> Self {
        self.receive_timeout(Duration::from_secs(secs))
    }

    /// Set the keep-alive interval.
    /// Set to 0 to disable keep-alive pings.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.timeouts.keepalive_interval = interval;
        self
    }

    /// Set the keep-alive interval in seconds.
    pub fn keepalive_interval_secs(self, secs: u64) -> Self {
        self.keepalive_interval(Duration::from_secs(secs))
    }

    /// Set the bound for best-effort teardown steps.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.close_timeout = timeout;
        self
    }

    /// Build the timeout configuration.
    pub fn build(self) -> SurrealLinkTimeouts {
        self.timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = SurrealLinkTimeouts::default();
        assert_eq!(timeouts.connection_timeout, Duration::from_secs(10));
        assert_eq!(timeouts.receive_timeout, Duration::from_secs(30));
        assert_eq!(timeouts.keepalive_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let timeouts = SurrealLinkTimeouts::builder()
            .connection_timeout_secs(60)
            .receive_timeout_secs(120)
            .keepalive_interval(Duration::ZERO)
            .build();

        assert_eq!(timeouts.connection_timeout, Duration::from_secs(60));
        assert_eq!(timeouts.receive_timeout, Duration::from_secs(120));
        assert!(timeouts.keepalive_interval.is_zero());
    }

    #[test]
    fn test_presets() {
        assert!(SurrealLinkTimeouts::fast().connection_timeout <= Duration::from_secs(5));
        assert!(SurrealLinkTimeouts::relaxed().receive_timeout >= Duration::from_secs(60));
    }

    #[test]
    fn test_is_no_timeout() {
        assert!(SurrealLinkTimeouts::is_no_timeout(Duration::ZERO));
        assert!(!SurrealLinkTimeouts::is_no_timeout(Duration::from_secs(1)));
        assert!(SurrealLinkTimeouts::is_no_timeout(Duration::from_secs(86400 * 400)));
    }
}
