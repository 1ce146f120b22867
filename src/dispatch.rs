//! Background dispatch loop
//!
//! This module implements the background task that repeatedly polls the
//! group consumer with a bounded timeout and routes each received message
//! to the handler registered for its topic.
//!
//! Cancellation is cooperative: the loop observes a [`StopToken`] at each
//! iteration boundary, so stop latency is bounded by one poll interval.
//! Stopping joins the loop thread before returning, which is what lets
//! the foreground path mutate the subscription set and registry safely.
//! The loop installs no signal handling and owns no process-exit logic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rdkafka::consumer::BaseConsumer;
use rdkafka::message::Message;

use crate::registry::MessageHandler;

/// Shared cancellation flag for a polling loop.
///
/// The embedding application owns the token for the blocking consume
/// variant and asserts it on interrupt; the service owns one per dispatch
/// loop. Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Create a token in the running (not stopped) state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the observing loop to stop at its next iteration boundary
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// State of one running dispatch loop: its stop token and thread handle
pub(crate) struct DispatchLoop {
    stop: StopToken,
    handle: Option<JoinHandle<()>>,
}

impl DispatchLoop {
    /// Spawn a dispatch loop over a snapshot of the handler registry.
    ///
    /// The snapshot is owned by the loop thread; the registry itself is
    /// never read from the background.
    pub fn spawn(
        consumer: Arc<BaseConsumer>,
        handlers: HashMap<String, Arc<dyn MessageHandler>>,
        poll_interval: Duration,
    ) -> Self {
        let stop = StopToken::new();
        let token = stop.clone();
        let handle = thread::spawn(move || run_loop(consumer, handlers, poll_interval, token));

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Whether the loop has not been asked to stop
    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped() && self.handle.is_some()
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// Idempotent. When invoked from the dispatch thread itself (a
    /// handler tearing down its own loop), the join is skipped to avoid
    /// self-deadlock; the thread still exits at the iteration boundary.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop.stop();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!("dispatch thread panicked");
            }
        }
    }
}

impl Drop for DispatchLoop {
    fn drop(&mut self) {
        self.halt();
    }
}

fn run_loop(
    consumer: Arc<BaseConsumer>,
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
    poll_interval: Duration,
    stop: StopToken,
) {
    let topics: Vec<&String> = handlers.keys().collect();
    tracing::debug!(?topics, "dispatch loop started");

    while !stop.is_stopped() {
        match consumer.poll(poll_interval) {
            // Poll timeout: a normal iteration, not an error.
            None => continue,
            Some(Err(err)) => {
                tracing::warn!(%err, "consumer poll error");
            }
            Some(Ok(message)) => {
                // Detach copies the message out of the broker-owned
                // buffer; dropping the borrowed form releases it.
                let owned = message.detach();
                drop(message);
                dispatch_message(&handlers, &owned);
            }
        }
    }

    tracing::debug!("dispatch loop stopped");
}

/// Route one message to the handler registered for its topic.
///
/// A message for an unregistered topic (possible during resubscription)
/// is logged and dropped; it never fails the loop.
pub(crate) fn dispatch_message(
    handlers: &HashMap<String, Arc<dyn MessageHandler>>,
    message: &rdkafka::message::OwnedMessage,
) {
    match handlers.get(message.topic()) {
        Some(handler) => handler.on_message(message),
        None => {
            tracing::debug!(topic = message.topic(), "no handler for topic, dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::{owned_message, CountingHandler, RecordingHandler};

    fn snapshot_with(
        topic: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> HashMap<String, Arc<dyn MessageHandler>> {
        let mut handlers: HashMap<String, Arc<dyn MessageHandler>> = HashMap::new();
        handlers.insert(topic.to_string(), handler);
        handlers
    }

    // ========== StopToken Tests ==========

    #[test]
    fn test_stop_token_starts_running() {
        let token = StopToken::new();
        assert!(!token.is_stopped());
    }

    #[test]
    fn test_stop_token_stop_is_idempotent() {
        let token = StopToken::new();
        token.stop();
        token.stop();
        assert!(token.is_stopped());
    }

    #[test]
    fn test_stop_token_clones_share_state() {
        let token = StopToken::new();
        let observer = token.clone();
        token.stop();
        assert!(observer.is_stopped());
    }

    // ========== Message Routing Tests ==========

    #[test]
    fn test_dispatch_invokes_registered_handler() {
        let handler = Arc::new(RecordingHandler::new());
        let handlers = snapshot_with("orders", handler.clone());

        dispatch_message(&handlers, &owned_message("orders", b"abc"));

        let received = handler.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "orders");
        assert_eq!(received[0].1, b"abc");
    }

    #[test]
    fn test_dispatch_drops_unregistered_topic() {
        let handler = Arc::new(CountingHandler::new());
        let handlers = snapshot_with("orders", handler.clone());

        // A message for a topic with no registration is released without
        // invoking anything and without crashing.
        dispatch_message(&handlers, &owned_message("payments", b"x"));
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn test_dispatch_with_empty_snapshot() {
        let handlers: HashMap<String, Arc<dyn MessageHandler>> = HashMap::new();
        dispatch_message(&handlers, &owned_message("orders", b"x"));
    }

    #[test]
    fn test_dispatch_routes_by_topic() {
        let orders = Arc::new(CountingHandler::new());
        let payments = Arc::new(CountingHandler::new());
        let mut handlers: HashMap<String, Arc<dyn MessageHandler>> = HashMap::new();
        handlers.insert("orders".to_string(), orders.clone());
        handlers.insert("payments".to_string(), payments.clone());

        dispatch_message(&handlers, &owned_message("orders", b"a"));
        dispatch_message(&handlers, &owned_message("orders", b"b"));
        dispatch_message(&handlers, &owned_message("payments", b"c"));

        assert_eq!(orders.count(), 2);
        assert_eq!(payments.count(), 1);
    }

    // ========== Loop Lifecycle Tests ==========

    fn test_consumer() -> Arc<BaseConsumer> {
        use rdkafka::config::ClientConfig;

        // No broker needs to listen on this address; creation is local.
        let consumer: BaseConsumer = ClientConfig::new()
            .set("bootstrap.servers", "localhost:9092")
            .set("group.id", "dispatch-loop-tests")
            .create()
            .expect("consumer creation should not require a live broker");
        Arc::new(consumer)
    }

    #[test]
    fn test_loop_spawn_and_stop() {
        let handler: Arc<dyn MessageHandler> = Arc::new(CountingHandler::new());
        let dispatch = DispatchLoop::spawn(
            test_consumer(),
            snapshot_with("orders", handler),
            Duration::from_millis(50),
        );

        assert!(dispatch.is_running());
        dispatch.stop();
        // stop() joins the thread, so reaching this point proves the loop
        // exited within one poll interval.
    }

    #[test]
    fn test_loop_stop_via_drop() {
        let handler: Arc<dyn MessageHandler> = Arc::new(CountingHandler::new());
        let dispatch = DispatchLoop::spawn(
            test_consumer(),
            snapshot_with("orders", handler),
            Duration::from_millis(50),
        );
        drop(dispatch);
    }

    #[test]
    fn test_loop_reports_not_running_after_stop_request() {
        let handler: Arc<dyn MessageHandler> = Arc::new(CountingHandler::new());
        let mut dispatch = DispatchLoop::spawn(
            test_consumer(),
            snapshot_with("orders", handler),
            Duration::from_millis(50),
        );

        dispatch.halt();
        assert!(!dispatch.is_running());
        // Second halt is a no-op.
        dispatch.halt();
        assert!(!dispatch.is_running());
    }
}
