//! Runtime configuration for the device link.
//!
//! [`LinkConfig`] is the single source of truth for the link's timing and
//! sizing.  It is built once at startup (from the TOML file plus CLI
//! overrides, see `infrastructure::storage`) and handed to the
//! [`LinkManager`](super::LinkManager) and the
//! [`Dispatcher`](super::Dispatcher) by value.

use std::time::Duration;

use twin_core::FramingMode;

/// Default device endpoint (the controller's address on the lab network).
pub const DEFAULT_HOST: &str = "172.26.109.127";
pub const DEFAULT_PORT: u16 = 8080;

/// All runtime settings of the device link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConfig {
    /// Hostname or IP address of the device.
    pub host: String,
    /// TCP port of the device's line protocol server.
    pub port: u16,
    /// Fixed delay between failed connection attempts.  There is no attempt
    /// limit: the link retries until it succeeds or the process exits.
    pub reconnect_delay: Duration,
    /// Upper bound on a single `receive()` call.  Expiry is a normal empty
    /// poll, not an error.
    pub read_timeout: Duration,
    /// Upper bound on writing one command.  A device that stops draining its
    /// socket is treated as a failed send and the link reconnects.
    pub write_timeout: Duration,
    /// Maximum bytes taken from the socket per `receive()` call.
    pub read_chunk_size: usize,
    /// How the dispatcher treats lines split across reads.
    pub framing: FramingMode,
    /// Capacity of the channel between the receive task and the consumer.
    pub dispatch_capacity: usize,
    /// How often the consumer samples the live/not-live flag.
    pub status_poll_interval: Duration,
}

impl LinkConfig {
    /// Creates a configuration for `host:port` with every other field at its
    /// default.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// The `host:port` string passed to the connector.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }
}

impl Default for LinkConfig {
    /// | Field                | Default            |
    /// |----------------------|--------------------|
    /// | host:port            | `172.26.109.127:8080` |
    /// | reconnect_delay      | 3 seconds          |
    /// | read_timeout         | 500 ms             |
    /// | write_timeout        | 500 ms             |
    /// | read_chunk_size      | 1024 bytes         |
    /// | framing              | `per_read`         |
    /// | dispatch_capacity    | 128 lines          |
    /// | status_poll_interval | 1 second           |
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            reconnect_delay: Duration::from_secs(3),
            read_timeout: Duration::from_millis(500),
            write_timeout: Duration::from_millis(500),
            read_chunk_size: 1024,
            framing: FramingMode::PerRead,
            dispatch_capacity: 128,
            status_poll_interval: Duration::from_secs(1),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reconnect_delay_is_three_seconds() {
        assert_eq!(LinkConfig::default().reconnect_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_default_read_timeout_is_half_a_second() {
        assert_eq!(LinkConfig::default().read_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_default_write_timeout_is_half_a_second() {
        assert_eq!(LinkConfig::default().write_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_default_chunk_size_is_1024() {
        assert_eq!(LinkConfig::default().read_chunk_size, 1024);
    }

    #[test]
    fn test_default_framing_does_not_buffer_across_reads() {
        assert_eq!(LinkConfig::default().framing, FramingMode::PerRead);
    }

    #[test]
    fn test_endpoint_joins_host_and_port() {
        let cfg = LinkConfig::new("10.0.0.5", 9000);
        assert_eq!(cfg.endpoint(), "10.0.0.5:9000");
        assert_eq!(cfg.read_chunk_size, 1024);
    }

    #[test]
    fn test_builders_override_single_fields() {
        let cfg = LinkConfig::new("localhost", 1)
            .with_reconnect_delay(Duration::from_millis(10))
            .with_read_timeout(Duration::from_millis(20))
            .with_write_timeout(Duration::from_millis(30))
            .with_framing(FramingMode::Buffered);
        assert_eq!(cfg.reconnect_delay, Duration::from_millis(10));
        assert_eq!(cfg.read_timeout, Duration::from_millis(20));
        assert_eq!(cfg.write_timeout, Duration::from_millis(30));
        assert_eq!(cfg.framing, FramingMode::Buffered);
    }
}
