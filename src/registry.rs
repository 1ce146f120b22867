//! Per-topic handler registry
//!
//! Maps topic names to message handlers. The registry is owned by the
//! service manager and only mutated from the foreground path while the
//! dispatch loop is confirmed stopped; the loop reads an owned snapshot
//! taken at (re)start, so registration never races dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use rdkafka::message::OwnedMessage;

/// A per-topic message handler.
///
/// Implementations carry their own context (a closure capture, struct
/// fields, an `Arc` to shared state); there is no separate opaque context
/// pointer. Handlers are invoked synchronously on the dispatch thread,
/// one message at a time.
pub trait MessageHandler: Send + Sync {
    /// Called for every message arriving on the registered topic
    fn on_message(&self, message: &OwnedMessage);
}

/// Any `Fn(&OwnedMessage)` closure is a handler.
impl<F> MessageHandler for F
where
    F: Fn(&OwnedMessage) + Send + Sync,
{
    fn on_message(&self, message: &OwnedMessage) {
        self(message)
    }
}

struct TopicRegistration {
    /// Informational partition-count hint supplied at registration
    partitions: i32,
    handler: Arc<dyn MessageHandler>,
}

/// Topic name → handler map with insert-or-replace semantics
#[derive(Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, TopicRegistration>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a topic, replacing any existing entry.
    ///
    /// Returns `true` when an existing registration was replaced.
    pub fn insert(&mut self, topic: &str, partitions: i32, handler: Arc<dyn MessageHandler>) -> bool {
        self.entries
            .insert(
                topic.to_string(),
                TopicRegistration { partitions, handler },
            )
            .is_some()
    }

    /// Remove the registration for a topic, if any
    pub fn remove(&mut self, topic: &str) -> bool {
        self.entries.remove(topic).is_some()
    }

    /// The handler registered for a topic
    pub fn handler_for(&self, topic: &str) -> Option<Arc<dyn MessageHandler>> {
        self.entries.get(topic).map(|r| r.handler.clone())
    }

    /// The desired subscription set: every registered (topic, hint) pair
    pub fn topics(&self) -> Vec<(String, i32)> {
        self.entries
            .iter()
            .map(|(topic, reg)| (topic.clone(), reg.partitions))
            .collect()
    }

    /// Owned snapshot of the topic → handler map for a dispatch loop
    pub fn snapshot(&self) -> HashMap<String, Arc<dyn MessageHandler>> {
        self.entries
            .iter()
            .map(|(topic, reg)| (topic.clone(), reg.handler.clone()))
            .collect()
    }

    /// Number of registered topics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no topic is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::{owned_message, CountingHandler};

    #[test]
    fn test_empty_registry() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.handler_for("orders").is_none());
        assert!(registry.topics().is_empty());
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut registry = HandlerRegistry::new();
        let handler = Arc::new(CountingHandler::new());
        let replaced = registry.insert("orders", 1, handler.clone());

        assert!(!replaced);
        assert_eq!(registry.len(), 1);

        let found = registry.handler_for("orders").expect("handler registered");
        found.on_message(&owned_message("orders", b"x"));
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        let mut registry = HandlerRegistry::new();
        let first = Arc::new(CountingHandler::new());
        let second = Arc::new(CountingHandler::new());

        registry.insert("orders", 1, first.clone());
        let replaced = registry.insert("orders", 1, second.clone());
        assert!(replaced);
        assert_eq!(registry.len(), 1);

        let found = registry.handler_for("orders").unwrap();
        found.on_message(&owned_message("orders", b"x"));

        // Only the replacement handler is invoked, never both.
        assert_eq!(first.count(), 0);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn test_topics_reflect_partition_hints() {
        let mut registry = HandlerRegistry::new();
        registry.insert("orders", 3, Arc::new(CountingHandler::new()));
        registry.insert("payments", 1, Arc::new(CountingHandler::new()));

        let mut topics = registry.topics();
        topics.sort();
        assert_eq!(
            topics,
            vec![("orders".to_string(), 3), ("payments".to_string(), 1)]
        );
    }

    #[test]
    fn test_remove() {
        let mut registry = HandlerRegistry::new();
        registry.insert("orders", 1, Arc::new(CountingHandler::new()));

        assert!(registry.remove("orders"));
        assert!(!registry.remove("orders"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut registry = HandlerRegistry::new();
        let handler = Arc::new(CountingHandler::new());
        registry.insert("orders", 1, handler.clone());

        let snapshot = registry.snapshot();
        registry.remove("orders");

        // The snapshot keeps the handler alive and routable even after
        // the registry entry is gone.
        assert!(snapshot.contains_key("orders"));
        snapshot["orders"].on_message(&owned_message("orders", b"x"));
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn test_closure_handler() {
        let mut registry = HandlerRegistry::new();
        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen_in_handler = seen.clone();

        registry.insert(
            "orders",
            1,
            Arc::new(move |_msg: &OwnedMessage| {
                seen_in_handler.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }),
        );

        registry
            .handler_for("orders")
            .unwrap()
            .on_message(&owned_message("orders", b"x"));
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
