//! The Kafka service manager
//!
//! Single entry point composing the producer path, the consumer registry
//! and the dispatch loop. The service is an explicit, caller-constructed
//! object with an explicit lifecycle; running one instance per process is
//! a caller convention, not a language-enforced singleton.
//!
//! ## Locking discipline
//!
//! One foreground call path plus at most one background dispatch thread.
//! The registry and the broker subscription are only mutated while the
//! dispatch loop is confirmed stopped (stop-before-mutate); the loop
//! itself reads an owned snapshot and takes no service locks. The
//! delivery-report context runs on a broker-internal thread and also
//! takes no service locks.
//!
//! Teardown runs at most once, whether triggered by `shutdown()` or by
//! `Drop`, guarded by an atomic flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rdkafka::consumer::Consumer;
use rdkafka::message::Message;

use crate::config::{ConsumerSettings, ProducerSettings, ServiceOptions};
use crate::consumer::ConsumerHandle;
use crate::dispatch::{DispatchLoop, StopToken};
use crate::error::{Result, ServiceError};
use crate::producer::ProducerHandle;
use crate::registry::{HandlerRegistry, MessageHandler};

/// Client-side facade over a Kafka cluster.
///
/// Owns at most one producer and at most one consumer, each independently
/// initialized exactly once. Initializing one subsystem never requires or
/// affects the other.
pub struct KafkaService {
    options: ServiceOptions,
    producer: RwLock<Option<ProducerHandle>>,
    consumer: RwLock<Option<ConsumerHandle>>,
    registry: Mutex<HandlerRegistry>,
    dispatch: Mutex<Option<DispatchLoop>>,
    /// Set while the blocking consume variant occupies the consumer
    consume_active: AtomicBool,
    /// Teardown once-guard
    closed: AtomicBool,
}

impl KafkaService {
    /// Create a service with default options; all handles start absent
    pub fn new() -> Self {
        Self::with_options(ServiceOptions::default())
    }

    /// Create a service with explicit options
    pub fn with_options(options: ServiceOptions) -> Self {
        Self {
            options,
            producer: RwLock::new(None),
            consumer: RwLock::new(None),
            registry: Mutex::new(HandlerRegistry::new()),
            dispatch: Mutex::new(None),
            consume_active: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    // ===== Producer Path =====

    /// Initialize the producer from a single configuration pair.
    ///
    /// Non-fatal by contract: configuration and connection errors are
    /// logged and swallowed so the caller may retry. A second call while
    /// a producer exists is a silent no-op.
    pub fn producer_init(&self, config_key: &str, config_value: &str) {
        let settings = ProducerSettings::new().set(config_key, config_value);
        if let Err(err) = self.init_producer(settings) {
            tracing::error!(%err, "producer initialization failed");
        }
    }

    /// Typed producer initialization; idempotent like `producer_init`
    pub fn init_producer(&self, settings: ProducerSettings) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            tracing::warn!("service already shut down, ignoring producer init");
            return Ok(());
        }

        let mut guard = self.producer.write().expect("producer lock poisoned");
        if guard.is_some() {
            tracing::debug!("producer already initialized, ignoring re-init");
            return Ok(());
        }

        *guard = Some(ProducerHandle::new(settings)?);
        tracing::info!("producer initialized");
        Ok(())
    }

    /// Submit a payload to a topic, fire-and-forget.
    ///
    /// No-op when the producer is not initialized. Does not block for
    /// acknowledgment; the delivery report arrives asynchronously and is
    /// accounted in [`KafkaService::delivery_stats`]. An immediate local
    /// submission error (e.g. queue full) is logged, not raised.
    pub fn produce(&self, topic: &str, payload: &[u8]) {
        let guard = self.producer.read().expect("producer lock poisoned");
        let Some(producer) = guard.as_ref() else {
            tracing::debug!(topic, "produce ignored, producer not initialized");
            return;
        };

        if let Err(err) = producer.send(topic, payload) {
            tracing::warn!(topic, %err, "produce failed locally");
        }
    }

    // ===== Consumer Path =====

    /// Initialize the group consumer from two configuration pairs.
    ///
    /// Establishes group membership configuration only; no topic is
    /// subscribed until a callback is registered. Idempotent and
    /// non-fatal like `producer_init`.
    pub fn consumer_init(
        &self,
        config_key: &str,
        config_value: &str,
        group_config_key: &str,
        group_id: &str,
    ) {
        let settings = ConsumerSettings::new()
            .set(config_key, config_value)
            .set(group_config_key, group_id);
        if let Err(err) = self.init_consumer(settings) {
            tracing::error!(%err, "consumer initialization failed");
        }
    }

    /// Typed consumer initialization; idempotent like `consumer_init`
    pub fn init_consumer(&self, settings: ConsumerSettings) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            tracing::warn!("service already shut down, ignoring consumer init");
            return Ok(());
        }

        let mut guard = self.consumer.write().expect("consumer lock poisoned");
        if guard.is_some() {
            tracing::debug!("consumer already initialized, ignoring re-init");
            return Ok(());
        }

        let handle = ConsumerHandle::new(settings)?;
        tracing::info!(group = handle.group_id(), "consumer initialized");
        *guard = Some(handle);
        Ok(())
    }

    /// Register a handler for every message arriving on `topic`.
    ///
    /// Stops and joins a running dispatch loop first, replaces the broker
    /// subscription with the rebuilt topic set, updates the registry
    /// (insert-or-replace by topic), and starts a fresh loop. A
    /// subscription failure is logged and aborts the call, leaving the
    /// consumer unsubscribed until a corrected registration succeeds.
    ///
    /// `partition_count` is an informational hint.
    pub fn set_consumer_callback<H>(&self, topic: &str, partition_count: i32, handler: H)
    where
        H: MessageHandler + 'static,
    {
        if let Err(err) = self.register_handler(topic, partition_count, Arc::new(handler)) {
            tracing::error!(topic, %err, "callback registration failed");
        }
    }

    /// Typed registration path behind [`KafkaService::set_consumer_callback`]
    pub fn register_handler(
        &self,
        topic: &str,
        partition_count: i32,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()> {
        let consumer_guard = self.consumer.read().expect("consumer lock poisoned");
        let consumer = consumer_guard
            .as_ref()
            .ok_or(ServiceError::NotInitialized { client: "consumer" })?;

        let mut dispatch = self.dispatch.lock().expect("dispatch lock poisoned");
        if self.consume_active.load(Ordering::SeqCst) {
            return Err(ServiceError::Busy);
        }

        // (a) The subscription set and registry are never mutated while
        // being read: stop and join any running loop before touching them.
        if let Some(running) = dispatch.take() {
            running.stop();
        }

        let mut registry = self.registry.lock().expect("registry lock poisoned");

        // (b) Rebuild the desired subscription list to include the topic.
        let mut desired = registry.topics();
        match desired.iter_mut().find(|(name, _)| name.as_str() == topic) {
            Some(entry) => entry.1 = partition_count,
            None => desired.push((topic.to_string(), partition_count)),
        }

        // (c) Replace the broker subscription; on failure the previous
        // loop stays stopped and the registry stays unchanged.
        consumer.subscribe(&desired)?;

        // (d) Insert-or-replace the registry entry.
        if registry.insert(topic, partition_count, handler) {
            tracing::debug!(topic, "replaced existing handler registration");
        }

        // (e) Start a new dispatch loop over a snapshot of the registry.
        *dispatch = Some(DispatchLoop::spawn(
            consumer.shared(),
            registry.snapshot(),
            self.options.poll_interval,
        ));
        tracing::info!(topic, partition_count, "handler registered, dispatch loop started");
        Ok(())
    }

    /// Drop the registration for `topic` and resubscribe to the rest.
    ///
    /// Stops and joins the loop, removes the registry entry, replaces the
    /// subscription with the remaining topic set (unsubscribing entirely
    /// when none remain) and restarts the loop only if the registry is
    /// non-empty.
    pub fn remove_consumer_callback(&self, topic: &str) {
        if let Err(err) = self.deregister_handler(topic) {
            tracing::error!(topic, %err, "callback removal failed");
        }
    }

    /// Typed removal path behind [`KafkaService::remove_consumer_callback`]
    pub fn deregister_handler(&self, topic: &str) -> Result<()> {
        let consumer_guard = self.consumer.read().expect("consumer lock poisoned");
        let consumer = consumer_guard
            .as_ref()
            .ok_or(ServiceError::NotInitialized { client: "consumer" })?;

        let mut dispatch = self.dispatch.lock().expect("dispatch lock poisoned");
        if let Some(running) = dispatch.take() {
            running.stop();
        }

        let mut registry = self.registry.lock().expect("registry lock poisoned");
        if !registry.remove(topic) {
            tracing::debug!(topic, "no handler registered for topic");
        }

        let desired = registry.topics();
        if desired.is_empty() {
            consumer.unsubscribe();
            tracing::info!(topic, "last handler removed, consumer unsubscribed");
            return Ok(());
        }

        consumer.subscribe(&desired)?;
        *dispatch = Some(DispatchLoop::spawn(
            consumer.shared(),
            registry.snapshot(),
            self.options.poll_interval,
        ));
        tracing::info!(topic, "handler removed, dispatch loop restarted");
        Ok(())
    }

    /// Blocking consume variant.
    ///
    /// Subscribes to `topic` alone and polls on the calling thread until
    /// `stop` is asserted, logging each received message. Mutually
    /// exclusive with the callback dispatch path on the same consumer
    /// handle; the call refuses (with a warning) while a dispatch loop is
    /// running, and vice versa.
    pub fn consume(&self, topic: &str, stop: &StopToken) {
        let consumer_guard = self.consumer.read().expect("consumer lock poisoned");
        let Some(consumer) = consumer_guard.as_ref() else {
            tracing::warn!(topic, "consume ignored, consumer not initialized");
            return;
        };

        {
            let dispatch = self.dispatch.lock().expect("dispatch lock poisoned");
            if dispatch.is_some() {
                tracing::warn!(topic, "dispatch loop active, blocking consume refused");
                return;
            }
            if self.consume_active.swap(true, Ordering::SeqCst) {
                tracing::warn!(topic, "blocking consume already active");
                return;
            }
        }

        if let Err(err) = consumer.subscribe(&[(topic.to_string(), 0)]) {
            tracing::error!(topic, %err, "blocking consume could not subscribe");
            self.consume_active.store(false, Ordering::SeqCst);
            return;
        }

        let client = consumer.shared();
        drop(consumer_guard);

        tracing::info!(topic, "blocking consume started");
        while !stop.is_stopped() {
            match client.poll(self.options.poll_interval) {
                None => continue,
                Some(Err(err)) => tracing::warn!(%err, "consumer poll error"),
                Some(Ok(message)) => {
                    let payload = message.payload().unwrap_or_default();
                    tracing::info!(
                        topic = message.topic(),
                        partition = message.partition(),
                        offset = message.offset(),
                        payload = %String::from_utf8_lossy(payload),
                        "received message"
                    );
                }
            }
        }

        client.unsubscribe();
        self.consume_active.store(false, Ordering::SeqCst);
        tracing::info!(topic, "blocking consume stopped");
    }

    // ===== Lifecycle =====

    /// Release everything the service owns, exactly once.
    ///
    /// Stops and joins the dispatch loop, unsubscribes and drops the
    /// consumer, then flushes the producer with a bounded wait and drops
    /// it. Safe to call concurrently with `Drop`; the sequence never runs
    /// twice.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("kafka service shutting down");

        let dispatch = self.dispatch.lock().expect("dispatch lock poisoned").take();
        if let Some(running) = dispatch {
            running.stop();
        }

        if let Some(consumer) = self.consumer.write().expect("consumer lock poisoned").take() {
            consumer.unsubscribe();
        }

        if let Some(producer) = self.producer.write().expect("producer lock poisoned").take() {
            if let Err(err) = producer.flush(self.options.flush_timeout) {
                tracing::warn!(%err, "producer flush on shutdown did not complete");
            }
        }
    }

    // ===== Introspection =====

    /// Whether the producer subsystem is initialized
    pub fn producer_initialized(&self) -> bool {
        self.producer.read().expect("producer lock poisoned").is_some()
    }

    /// Whether the consumer subsystem is initialized
    pub fn consumer_initialized(&self) -> bool {
        self.consumer.read().expect("consumer lock poisoned").is_some()
    }

    /// Whether a dispatch loop is currently alive
    pub fn dispatch_running(&self) -> bool {
        self.dispatch
            .lock()
            .expect("dispatch lock poisoned")
            .as_ref()
            .is_some_and(DispatchLoop::is_running)
    }

    /// Snapshot of (delivered, failed) delivery-report counters
    pub fn delivery_stats(&self) -> Option<(u64, u64)> {
        self.producer
            .read()
            .expect("producer lock poisoned")
            .as_ref()
            .map(|p| p.stats().snapshot())
    }

    /// The settings the producer was initialized with, if any
    pub fn producer_settings(&self) -> Option<ProducerSettings> {
        self.producer
            .read()
            .expect("producer lock poisoned")
            .as_ref()
            .map(|p| p.settings().clone())
    }

    /// The consumer group id, if the consumer is initialized with one
    pub fn consumer_group(&self) -> Option<String> {
        self.consumer
            .read()
            .expect("consumer lock poisoned")
            .as_ref()
            .and_then(|c| c.group_id().map(str::to_string))
    }

    /// Currently registered (topic, partition-hint) pairs
    pub fn registered_topics(&self) -> Vec<(String, i32)> {
        self.registry.lock().expect("registry lock poisoned").topics()
    }

    /// Metadata-fetch health probe against the producer connection
    pub fn producer_healthy(&self) -> bool {
        self.producer
            .read()
            .expect("producer lock poisoned")
            .as_ref()
            .is_some_and(ProducerHandle::is_healthy)
    }
}

impl Default for KafkaService {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KafkaService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
