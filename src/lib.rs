//! kafka-service: a client-side producer/consumer facade over Apache Kafka
//!
//! This crate wraps the rdkafka client library behind a single service
//! object, [`KafkaService`], exposing:
//!
//! - a **producer path**: fire-and-forget publishing with asynchronous
//!   delivery acknowledgment, flushed with a bounded wait on shutdown;
//! - a **consumer path**: a background dispatch loop that polls with a
//!   bounded timeout and routes each message to the handler registered
//!   for its topic, with safe start/stop of that loop.
//!
//! The service is caller-constructed and caller-owned; running one per
//! process is a convention, not an enforced singleton. The crate installs
//! no signal handlers: an embedding application asserts its own
//! [`StopToken`] and calls [`KafkaService::shutdown`] on interrupt.
//!
//! ```no_run
//! use kafka_service::KafkaService;
//!
//! let service = KafkaService::new();
//! service.producer_init("bootstrap.servers", "localhost:9092");
//! service.produce("orders", b"hello");
//!
//! service.consumer_init("bootstrap.servers", "localhost:9092", "group.id", "g1");
//! service.set_consumer_callback("orders", 1, |msg: &rdkafka::message::OwnedMessage| {
//!     // handle the message
//!     let _ = msg;
//! });
//!
//! service.shutdown();
//! ```

pub mod config;
pub mod constants;
pub mod consumer;
pub mod dispatch;
pub mod error;
pub mod producer;
pub mod registry;
pub mod service;

// Test utilities (only compiled in test builds)
#[cfg(test)]
pub mod testing;

pub use config::{ConsumerSettings, ProducerSettings, ServiceOptions};
pub use consumer::ConsumerHandle;
pub use dispatch::StopToken;
pub use error::{Result, ServiceError};
pub use producer::{DeliveryStats, ProducerHandle};
pub use registry::{HandlerRegistry, MessageHandler};
pub use service::KafkaService;
