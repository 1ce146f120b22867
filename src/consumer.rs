//! Group consumer wrapper
//!
//! Wraps rdkafka's `BaseConsumer` configured for a consumer group.
//! Creating the handle establishes group configuration only; it does not
//! subscribe to any topic. The subscription set is replaced wholesale by
//! [`ConsumerHandle::subscribe`] whenever a registration changes the
//! desired topic set.

use std::sync::Arc;

use rdkafka::consumer::{BaseConsumer, Consumer};

use crate::config::ConsumerSettings;
use crate::error::{Result, ServiceError};

/// Broker connection configured for a consumer group
pub struct ConsumerHandle {
    consumer: Arc<BaseConsumer>,
    settings: ConsumerSettings,
}

impl ConsumerHandle {
    /// Create a new group consumer from the given settings
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the broker client rejects a settings
    /// pair, `Connection` if handle creation fails.
    pub(crate) fn new(settings: ConsumerSettings) -> Result<Self> {
        let consumer: BaseConsumer = settings
            .client_config()
            .create()
            .map_err(|e| ServiceError::from_client_error("consumer", e))?;

        Ok(Self {
            consumer: Arc::new(consumer),
            settings,
        })
    }

    /// Replace the broker subscription with the given topic set.
    ///
    /// The partition counts are informational hints and are logged only;
    /// partition assignment stays with the broker's group coordinator.
    pub(crate) fn subscribe(&self, topics: &[(String, i32)]) -> Result<()> {
        let names: Vec<&str> = topics.iter().map(|(name, _)| name.as_str()).collect();
        self.consumer
            .subscribe(&names)
            .map_err(|err| ServiceError::Subscription {
                topics: names.iter().map(|n| n.to_string()).collect(),
                reason: err.to_string(),
            })?;

        tracing::debug!(?topics, "subscription replaced");
        Ok(())
    }

    /// Drop the current subscription entirely
    pub(crate) fn unsubscribe(&self) {
        self.consumer.unsubscribe();
    }

    /// Shared reference to the underlying consumer for a dispatch loop
    pub(crate) fn shared(&self) -> Arc<BaseConsumer> {
        self.consumer.clone()
    }

    /// The settings this consumer was built from
    pub fn settings(&self) -> &ConsumerSettings {
        &self.settings
    }

    /// The consumer group id, when configured
    pub fn group_id(&self) -> Option<&str> {
        self.settings.group_id()
    }
}

impl std::fmt::Debug for ConsumerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerHandle")
            .field("settings", &self.settings)
            .finish()
    }
}
