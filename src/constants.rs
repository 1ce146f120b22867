//! Shared constants for the service facade
//!
//! Defaults and bounds used across the producer and consumer paths.
//! Values can be overridden per service via `ServiceOptions`.

use std::time::Duration;

// ===== Configuration Keys =====

/// Conventional librdkafka key for the broker address list
pub const BOOTSTRAP_SERVERS_KEY: &str = "bootstrap.servers";

/// Conventional librdkafka key for the consumer group id
pub const GROUP_ID_KEY: &str = "group.id";

// ===== Dispatch Loop =====

/// Default bounded timeout for each consumer poll (milliseconds).
///
/// This also bounds the latency of a cooperative loop stop: the dispatch
/// thread notices a cleared stop token within one poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Lower bound for the poll interval; below this the loop busy-spins
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

// ===== Producer Teardown =====

/// Default bounded wait for flushing outstanding deliveries on shutdown
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 10_000;

/// Timeout for the metadata fetch used by the producer health probe
pub const HEALTH_CHECK_TIMEOUT_MS: u64 = 5_000;

/// Default poll interval as a `Duration`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

/// Default flush timeout as a `Duration`
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_millis(DEFAULT_FLUSH_TIMEOUT_MS);
