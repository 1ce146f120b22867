//! kafka-service E2E smoke suite
//!
//! End-to-end scenarios exercised against a live Kafka broker. These are
//! not `cargo test` tests: they need a reachable cluster and verify the
//! asynchronous parts of the contract (delivery reports, message round
//! trips, subscription replacement) that the broker-less integration
//! tests cannot observe.
//!
//! ## Test Categories
//!
//! - **producer**: delivery-report accounting for fire-and-forget sends
//! - **consumer**: handler round trips and subscription replacement
//! - **lifecycle**: init idempotency and flush-on-shutdown under load
//!
//! ## Usage
//!
//! ```bash
//! # Against localhost:9092
//! cargo run --release -p smoke_test
//!
//! # Against another cluster
//! KAFKA_BROKERS=kafka1:9092 cargo run --release -p smoke_test
//! ```

pub mod common;

pub mod consumer;
pub mod lifecycle;
pub mod producer;

pub use common::TestResult;
pub use consumer::{test_callback_replacement, test_callback_roundtrip};
pub use lifecycle::{test_flush_on_shutdown, test_reinit_is_noop};
pub use producer::{test_delivery_report_failure, test_delivery_report_success};
