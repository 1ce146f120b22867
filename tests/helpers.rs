// Test helpers shared by the integration tests
//
// These handlers mirror what an embedding application registers: a
// counter and a recorder, both safe to share across the dispatch thread
// and the test thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use kafka_service::{KafkaService, MessageHandler, ServiceOptions};
use rdkafka::message::{Message, OwnedMessage};

/// Broker address used by every test; nothing needs to listen there.
pub const LOCAL_BROKER: &str = "localhost:9092";

/// A service with a short poll interval so loop stop latency stays small
pub fn test_service() -> KafkaService {
    KafkaService::with_options(
        ServiceOptions::default()
            .poll_interval(Duration::from_millis(50))
            .flush_timeout(Duration::from_millis(200)),
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

/// Handler that records (topic, payload) pairs
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
