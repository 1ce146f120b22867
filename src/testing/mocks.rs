//! Mock handlers and message factories
//!
//! These doubles stand in for application callbacks; `owned_message`
//! builds the same message shape the dispatch loop detaches from the
//! broker client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rdkafka::message::{Message, OwnedMessage};
use rdkafka::Timestamp;

use crate::registry::MessageHandler;

/// Build a broker-shaped message for a topic with the given payload
pub fn owned_message(topic: &str, payload: &[u8]) -> OwnedMessage {
    OwnedMessage::new(
        Some(payload.to_vec()),
        None,
        topic.to_string(),
        Timestamp::NotAvailable,
        0,
        0,
        None,
    )
}

/// Handler that counts invocations
#[derive(Debug, Default)]
pub struct CountingHandler {
    count: AtomicUsize,
}

impl CountingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl MessageHandler for CountingHandler {
    fn on_message(&self, _message: &OwnedMessage) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler that records (topic, payload) for every invocation
#[derive(Debug, Default)]
pub struct RecordingHandler {
    received: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(String, Vec<u8>)> {
        self.received.lock().expect("received lock poisoned").clone()
    }
}

impl MessageHandler for RecordingHandler {
    fn on_message(&self, message: &OwnedMessage) {
        self.received
            .lock()
            .expect("received lock poisoned")
            .push((
                message.topic().to_string(),
                message.payload().unwrap_or_default().to_vec(),
            ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_message_shape() {
        let msg = owned_message("orders", b"abc");
        assert_eq!(msg.topic(), "orders");
        assert_eq!(msg.payload(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_counting_handler() {
        let handler = CountingHandler::new();
        handler.on_message(&owned_message("orders", b"x"));
        handler.on_message(&owned_message("orders", b"y"));
        assert_eq!(handler.count(), 2);
    }

    #[test]
    fn test_recording_handler() {
        let handler = RecordingHandler::new();
        handler.on_message(&owned_message("orders", b"abc"));

        let received = handler.received();
        assert_eq!(received, vec![("orders".to_string(), b"abc".to_vec())]);
    }
}
