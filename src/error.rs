//! Service error types
//!
//! This module defines a custom error type for the facade's operations,
//! providing better type safety and more informative error messages than
//! using `Box<dyn std::error::Error>`.
//!
//! Errors are handled locally by the void facade methods (logged, current
//! call aborted); the typed `init_*` variants return them to the caller.
//! None of these terminate the process.

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors that can occur during service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The broker client rejected a configuration key/value pair
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    /// Creating a broker client handle failed
    #[error("Failed to create {client} client: {reason}")]
    Connection { client: &'static str, reason: String },

    /// The broker client rejected the topic subscription list
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    Subscription { topics: Vec<String>, reason: String },

    /// A message could not be handed to the broker client (e.g. queue full)
    #[error("Delivery failed for topic {topic}: {reason}")]
    Delivery { topic: String, reason: String },

    /// An operation was invoked before the owning subsystem was initialized
    #[error("The {client} is not initialized")]
    NotInitialized { client: &'static str },

    /// The blocking consume variant and the callback dispatch path were
    /// used concurrently against the same consumer handle
    #[error("The consumer handle is busy with a conflicting polling mode")]
    Busy,
}

impl ServiceError {
    /// Map a client creation failure to the matching error kind.
    ///
    /// librdkafka validates configuration pairs when the client handle is
    /// created, so a rejected key/value surfaces here as a `ClientConfig`
    /// error; anything else is a connection-level failure.
    pub(crate) fn from_client_error(client: &'static str, err: KafkaError) -> Self {
        match err {
            KafkaError::ClientConfig(_, desc, key, value) => {
                ServiceError::Configuration(format!("{key}={value}: {desc}"))
            }
            KafkaError::ClientCreation(reason) => ServiceError::Connection { client, reason },
            other => ServiceError::Connection {
                client,
                reason: other.to_string(),
            },
        }
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ServiceError::Configuration("no.such.property=1: unknown".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid client configuration"));
        assert!(msg.contains("no.such.property"));
    }

    #[test]
    fn test_connection_error_display() {
        let err = ServiceError::Connection {
            client: "producer",
            reason: "out of memory".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Failed to create producer client"));
        assert!(msg.contains("out of memory"));
    }

    #[test]
    fn test_subscription_error_display() {
        let err = ServiceError::Subscription {
            topics: vec!["orders".to_string(), "payments".to_string()],
            reason: "invalid topic".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("orders"));
        assert!(msg.contains("payments"));
        assert!(msg.contains("invalid topic"));
    }

    #[test]
    fn test_delivery_error_display() {
        let err = ServiceError::Delivery {
            topic: "orders".to_string(),
            reason: "queue full".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("orders"));
        assert!(msg.contains("queue full"));
    }

    #[test]
    fn test_not_initialized_display() {
        let err = ServiceError::NotInitialized { client: "consumer" };
        assert_eq!(err.to_string(), "The consumer is not initialized");
    }

    #[test]
    fn test_busy_display() {
        let err = ServiceError::Busy;
        assert!(err.to_string().contains("conflicting polling mode"));
    }

    #[test]
    fn test_client_creation_maps_to_connection() {
        let err = ServiceError::from_client_error(
            "producer",
            KafkaError::ClientCreation("boom".to_string()),
        );
        assert!(matches!(err, ServiceError::Connection { client: "producer", .. }));
    }

    #[test]
    fn test_service_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}

        let err = ServiceError::NotInitialized { client: "producer" };
        assert_error(&err);
    }
}
