//! Publish-side broker client wrapper
//!
//! This module wraps rdkafka's `ThreadedProducer` behind a handle that
//! registers a delivery-report context at creation time. Every submitted
//! message is later acknowledged asynchronously by the broker client
//! through [`DeliveryTracker::delivery`], which runs on a librdkafka
//! internal thread.
//!
//! ## Thread Safety
//!
//! The delivery callback must be reentrant-safe and must not take locks
//! shared with the foreground path. The tracker therefore only bumps its
//! own atomic counters and writes to the logger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rdkafka::client::ClientContext;
use rdkafka::message::Message;
use rdkafka::producer::{BaseRecord, DeliveryResult, Producer, ProducerContext, ThreadedProducer};

use crate::config::ProducerSettings;
use crate::constants::HEALTH_CHECK_TIMEOUT_MS;
use crate::error::{Result, ServiceError};

/// Counters for asynchronous delivery reports
///
/// One report arrives per submitted message, success or failure; the
/// counters together account for every acknowledged message.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Messages the broker confirmed as committed
    pub delivered: AtomicU64,
    /// Messages the broker reported as failed
    pub failed: AtomicU64,
}

impl DeliveryStats {
    /// Create new stats with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of (delivered, failed)
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.delivered.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

/// Producer context receiving per-message delivery reports
pub(crate) struct DeliveryTracker {
    stats: Arc<DeliveryStats>,
}

impl DeliveryTracker {
    fn new(stats: Arc<DeliveryStats>) -> Self {
        Self { stats }
    }
}

impl ClientContext for DeliveryTracker {}

impl ProducerContext for DeliveryTracker {
    type DeliveryOpaque = ();

    // Runs on a librdkafka thread: counters and logging only, no locks.
    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _delivery_opaque: ()) {
        match delivery_result {
            Ok(message) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    topic = message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    "message delivered"
                );
            }
            Err((err, message)) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    topic = message.topic(),
                    partition = message.partition(),
                    %err,
                    "message delivery failed"
                );
            }
        }
    }
}

/// Broker connection configured for publishing
pub struct ProducerHandle {
    producer: ThreadedProducer<DeliveryTracker>,
    stats: Arc<DeliveryStats>,
    settings: ProducerSettings,
}

impl ProducerHandle {
    /// Create a new producer from the given settings
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the broker client rejects a settings
    /// pair, `Connection` if handle creation fails.
    pub(crate) fn new(settings: ProducerSettings) -> Result<Self> {
        let stats = Arc::new(DeliveryStats::new());
        let producer = settings
            .client_config()
            .create_with_context(DeliveryTracker::new(stats.clone()))
            .map_err(|e| ServiceError::from_client_error("producer", e))?;

        Ok(Self {
            producer,
            stats,
            settings,
        })
    }

    /// Submit a payload to a topic without waiting for acknowledgment
    ///
    /// Acknowledgment arrives later through the delivery-report context.
    /// An immediate local submission error (e.g. the client queue is
    /// full) is returned for the caller to report; it is never a process
    /// failure.
    pub(crate) fn send(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let record = BaseRecord::<(), [u8]>::to(topic).payload(payload);
        self.producer
            .send(record)
            .map_err(|(err, _record)| ServiceError::Delivery {
                topic: topic.to_string(),
                reason: err.to_string(),
            })
    }

    /// Wait up to `timeout` for outstanding deliveries to complete
    pub(crate) fn flush(&self, timeout: Duration) -> rdkafka::error::KafkaResult<()> {
        self.producer.flush(timeout)
    }

    /// Check broker connectivity by attempting a metadata fetch
    ///
    /// Uses a short timeout to avoid blocking long on an unhealthy
    /// connection.
    pub fn is_healthy(&self) -> bool {
        let timeout = Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS);
        match self.producer.client().fetch_metadata(None, timeout) {
            Ok(metadata) => !metadata.brokers().is_empty(),
            Err(_) => false,
        }
    }

    /// Delivery-report counters for this producer
    pub fn stats(&self) -> &Arc<DeliveryStats> {
        &self.stats
    }

    /// The settings this producer was built from
    pub fn settings(&self) -> &ProducerSettings {
        &self.settings
    }
}

impl std::fmt::Debug for ProducerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerHandle")
            .field("settings", &self.settings)
            .finish()
    }
}
