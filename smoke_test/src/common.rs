//! Common utilities shared across smoke-test modules
//!
//! Service construction, environment handling and the polling helpers
//! the scenarios use to wait for asynchronous outcomes.

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use kafka_service::{KafkaService, ServiceOptions};

/// Test result type alias for cleaner function signatures
pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Default poll timeout used by the scenarios' wait loops
pub const WAIT_INTERVAL: Duration = Duration::from_millis(100);

/// Default per-scenario timeout
pub const TEST_TIMEOUT: Duration = Duration::from_secs(15);

static TOPIC_SEQ: AtomicU64 = AtomicU64::new(0);

/// Get the broker address list from KAFKA_BROKERS or use the default
pub fn broker_list() -> String {
    env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string())
}

/// A unique topic name per scenario run, so reruns never see stale data
pub fn unique_topic(prefix: &str) -> String {
    let seq = TOPIC_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", prefix, std::process::id(), seq)
}

/// Create a service tuned for quick smoke iterations
pub fn create_service() -> KafkaService {
    KafkaService::with_options(
        ServiceOptions::default()
            .poll_interval(Duration::from_millis(250))
            .flush_timeout(Duration::from_secs(10)),
    )
}

/// Poll `condition` until it returns true or `timeout` elapses
pub fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(WAIT_INTERVAL);
    }
    condition()
}
