//! Client settings and service options
//!
//! This module holds the configuration applied to the underlying broker
//! client. Settings are ordered (key, value) string pairs, exactly what
//! librdkafka consumes; they are validated where librdkafka validates
//! them, at client creation time.
//!
//! Settings are write-once per subsystem: the service applies them when a
//! producer or consumer is first initialized, and later init calls for an
//! already-initialized subsystem are silent no-ops. Reconfiguration
//! requires tearing the service down first.

use std::time::Duration;

use rdkafka::config::ClientConfig;

use crate::constants::{
    BOOTSTRAP_SERVERS_KEY, DEFAULT_FLUSH_TIMEOUT, DEFAULT_POLL_INTERVAL, GROUP_ID_KEY,
};

/// Configuration pairs for the publish-side broker client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerSettings {
    pairs: Vec<(String, String)>,
}

impl ProducerSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the common single-pair case
    pub fn brokers(address_list: &str) -> Self {
        Self::new().set(BOOTSTRAP_SERVERS_KEY, address_list)
    }

    /// Add a configuration option name/value pair
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// The pairs applied so far, in insertion order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Build the librdkafka configuration object
    pub(crate) fn client_config(&self) -> ClientConfig {
        build_client_config(&self.pairs)
    }
}

/// Configuration pairs for the group consumer broker client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerSettings {
    pairs: Vec<(String, String)>,
}

impl ConsumerSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the common broker-list-plus-group case
    pub fn group(address_list: &str, group_id: &str) -> Self {
        Self::new()
            .set(BOOTSTRAP_SERVERS_KEY, address_list)
            .set(GROUP_ID_KEY, group_id)
    }

    /// Add a configuration option name/value pair
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// The pairs applied so far, in insertion order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// The group id, if one of the pairs carries it
    pub fn group_id(&self) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == GROUP_ID_KEY)
            .map(|(_, v)| v.as_str())
    }

    /// Build the librdkafka configuration object
    pub(crate) fn client_config(&self) -> ClientConfig {
        build_client_config(&self.pairs)
    }
}

fn build_client_config(pairs: &[(String, String)]) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in pairs {
        config.set(key, value);
    }
    config
}

/// Tunables owned by the service itself rather than the broker client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Bounded timeout for each dispatch-loop poll
    pub poll_interval: Duration,
    /// Bounded wait for flushing outstanding deliveries on shutdown
    pub flush_timeout: Duration,
}

impl ServiceOptions {
    /// Set the dispatch-loop poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the shutdown flush timeout
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}
