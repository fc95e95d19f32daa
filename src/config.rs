//! Connector configuration - passed from the embedding application

use crate::network::Network;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub network: Network,
    /// How long a connect waits before answering with the no-response advisory
    pub connect_timeout: Duration,
    /// Upper bound on the startup readiness poll
    pub readiness_timeout: Duration,
    pub readiness_poll_interval: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            readiness_poll_interval: DEFAULT_READINESS_POLL_INTERVAL,
        }
    }
}

impl ConnectorConfig {
    pub fn new(network: Network) -> Self { Self { network, ..Default::default() } }
    pub fn mainnet() -> Self { Self::new(Network::Mainnet) }
    pub fn testnet() -> Self { Self::new(Network::Testnet) }
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self { self.connect_timeout = timeout; self }
    pub fn with_readiness(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.readiness_timeout = timeout;
        self.readiness_poll_interval = poll_interval;
        self
    }

    /// Defaults overlaid with `ORD_CONNECT_NETWORK` and `ORD_CONNECT_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    fn overlay(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = var("ORD_CONNECT_NETWORK") {
            match Network::parse(&raw) {
                Some(network) => self.network = network,
                None => tracing::warn!("ignoring ORD_CONNECT_NETWORK={:?}", raw),
            }
        }
        if let Some(raw) = var("ORD_CONNECT_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.connect_timeout = Duration::from_millis(ms),
                _ => tracing::warn!("ignoring ORD_CONNECT_TIMEOUT_MS={:?}", raw),
            }
        }
        self
    }
}
