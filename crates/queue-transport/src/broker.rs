//! # In-Memory Broker
//!
//! A single-process queue implementing [`TransportConnector`].
//!
//! - Each topic is an append-only log of [`RawMessage`]s.
//! - Each consumer group keeps one committed offset per topic. A group that
//!   joins a topic for the first time starts at the end of the log, so it only
//!   sees messages published afterwards.
//! - Reading a message commits it immediately (at-most-once).
//! - `set_available(false)` makes connects, sends and connectivity checks fail
//!   until the broker is made available again.
//! - `set_topic_writable(topic, false)` rejects writes to one topic only,
//!   leaving reads and every other topic untouched.

use crate::consumer::MessageConsumer;
use crate::error::{TransportError, TransportResult};
use crate::message::RawMessage;
use crate::producer::MessageProducer;
use crate::TransportConnector;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Default)]
struct BrokerState {
    /// Topic logs.
    topics: HashMap<String, Vec<RawMessage>>,
    /// Committed offsets keyed by (group, topic).
    offsets: HashMap<(String, String), usize>,
    /// Open consumer sessions per group.
    active_sessions: HashMap<String, usize>,
    /// Consumer sessions ever opened per group.
    opened_sessions: HashMap<String, u64>,
    /// Topics currently rejecting writes.
    read_only: HashSet<String>,
}

struct BrokerInner {
    address: String,
    available: AtomicBool,
    state: Mutex<BrokerState>,
    /// Wakes consumers blocked in `next_message`.
    notify: Notify,
}

/// In-memory queue broker. Cloning yields another handle to the same broker.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    /// Create an empty, available broker.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                address: address.into(),
                available: AtomicBool::new(true),
                state: Mutex::new(BrokerState::default()),
                notify: Notify::new(),
            }),
        }
    }

    /// Simulate the broker going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
        debug!(address = %self.inner.address, available, "Broker availability changed");
    }

    /// Whether the broker currently accepts connections.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    /// Stop or resume accepting writes on a single topic.
    pub fn set_topic_writable(&self, topic: &str, writable: bool) {
        let mut state = self.inner.state.lock();
        if writable {
            state.read_only.remove(topic);
        } else {
            state.read_only.insert(topic.to_string());
        }
        debug!(topic, writable, "Topic writability changed");
    }

    /// Append a message to a topic, creating the topic if needed.
    ///
    /// Returns the offset of the appended message.
    pub fn publish(&self, topic: &str, message: RawMessage) -> TransportResult<u64> {
        self.ensure_available()?;

        let offset = {
            let mut state = self.inner.state.lock();
            if state.read_only.contains(topic) {
                return Err(TransportError::Send {
                    topic: topic.to_string(),
                    reason: "topic is not accepting writes".to_string(),
                });
            }
            let log = state.topics.entry(topic.to_string()).or_default();
            log.push(message);
            log.len() - 1
        };
        self.inner.notify.notify_waiters();

        debug!(topic, offset, "Message appended");
        Ok(offset as u64)
    }

    /// Snapshot of every message ever published to a topic.
    #[must_use]
    pub fn messages(&self, topic: &str) -> Vec<RawMessage> {
        self.inner
            .state
            .lock()
            .topics
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of messages in a topic.
    #[must_use]
    pub fn end_offset(&self, topic: &str) -> u64 {
        let state = self.inner.state.lock();
        state.topics.get(topic).map_or(0, Vec::len) as u64
    }

    /// Committed offset of a group on a topic, if the group has joined it.
    #[must_use]
    pub fn committed_offset(&self, group: &str, topic: &str) -> Option<u64> {
        let state = self.inner.state.lock();
        state
            .offsets
            .get(&(group.to_string(), topic.to_string()))
            .map(|offset| *offset as u64)
    }

    /// Messages a group has yet to read on a topic.
    #[must_use]
    pub fn lag(&self, group: &str, topic: &str) -> u64 {
        let end = self.end_offset(topic);
        let committed = self.committed_offset(group, topic).unwrap_or(end);
        end.saturating_sub(committed)
    }

    /// Consumer sessions currently open for a group.
    #[must_use]
    pub fn active_sessions(&self, group: &str) -> usize {
        let state = self.inner.state.lock();
        state.active_sessions.get(group).copied().unwrap_or(0)
    }

    /// Consumer sessions opened for a group since the broker started.
    #[must_use]
    pub fn sessions_opened(&self, group: &str) -> u64 {
        let state = self.inner.state.lock();
        state.opened_sessions.get(group).copied().unwrap_or(0)
    }

    fn ensure_available(&self) -> TransportResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(TransportError::Unavailable {
                address: self.inner.address.clone(),
            })
        }
    }

    fn release_session(&self, group: &str) {
        let mut state = self.inner.state.lock();
        let Some(count) = state.active_sessions.get_mut(group) else {
            return;
        };

        *count = count.saturating_sub(1);
        if *count == 0 {
            state.active_sessions.remove(group);
        }
    }
}

#[async_trait]
impl TransportConnector for InMemoryBroker {
    type Producer = MemoryProducer;
    type Consumer = MemoryConsumer;

    async fn connect_producer(&self, topic: &str) -> TransportResult<MemoryProducer> {
        self.ensure_available()?;
        debug!(address = %self.inner.address, topic, "Producer session opened");

        Ok(MemoryProducer {
            broker: self.clone(),
            topic: topic.to_string(),
            closed: AtomicBool::new(false),
        })
    }

    async fn connect_consumer(
        &self,
        group: &str,
        topics: &[String],
    ) -> TransportResult<MemoryConsumer> {
        self.ensure_available()?;

        {
            let mut state = self.inner.state.lock();
            for topic in topics {
                let end = state.topics.get(topic).map_or(0, Vec::len);
                state
                    .offsets
                    .entry((group.to_string(), topic.clone()))
                    .or_insert(end);
            }
            *state.active_sessions.entry(group.to_string()).or_insert(0) += 1;
            *state.opened_sessions.entry(group.to_string()).or_insert(0) += 1;
        }

        debug!(address = %self.inner.address, group, topics = ?topics, "Consumer session opened");

        Ok(MemoryConsumer {
            broker: self.clone(),
            group: group.to_string(),
            topics: topics.to_vec(),
            closed: AtomicBool::new(false),
        })
    }

    fn address(&self) -> &str {
        &self.inner.address
    }
}

/// Producer session on an [`InMemoryBroker`] topic.
pub struct MemoryProducer {
    broker: InMemoryBroker,
    topic: String,
    closed: AtomicBool,
}

#[async_trait]
impl MessageProducer for MemoryProducer {
    async fn send_message(&self, message: RawMessage) -> TransportResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        self.broker
            .publish(&self.topic, message)
            .map(|_| ())
            .map_err(|e| TransportError::Send {
                topic: self.topic.clone(),
                reason: e.to_string(),
            })
    }

    async fn connectivity_check(&self) -> TransportResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.broker.ensure_available()
    }

    async fn close(&self) -> TransportResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        debug!(topic = %self.topic, "Producer session closed");
        Ok(())
    }
}

/// Consumer session on an [`InMemoryBroker`].
///
/// Dropping an open session releases it, same as `close`.
pub struct MemoryConsumer {
    broker: InMemoryBroker,
    group: String,
    topics: Vec<String>,
    closed: AtomicBool,
}

impl MemoryConsumer {
    /// Take the next unread message across subscribed topics, in topic order.
    fn poll_once(&self) -> Option<RawMessage> {
        let mut state = self.broker.inner.state.lock();
        let BrokerState {
            topics, offsets, ..
        } = &mut *state;

        for topic in &self.topics {
            let Some(log) = topics.get(topic) else {
                continue;
            };
            let offset = offsets
                .entry((self.group.clone(), topic.clone()))
                .or_insert(log.len());

            if let Some(message) = log.get(*offset) {
                *offset += 1;
                return Some(message.clone());
            }
        }
        None
    }

    fn shut(&self) -> bool {
        let was_open = !self.closed.swap(true, Ordering::SeqCst);
        if was_open {
            self.broker.release_session(&self.group);
            self.broker.inner.notify.notify_waiters();
        }
        was_open
    }
}

#[async_trait]
impl MessageConsumer for MemoryConsumer {
    async fn next_message(&self) -> TransportResult<Option<RawMessage>> {
        loop {
            // Register interest before checking so a publish in between is not missed.
            let notified = self.broker.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            if let Some(message) = self.poll_once() {
                return Ok(Some(message));
            }

            notified.await;
        }
    }

    async fn connectivity_check(&self) -> TransportResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.broker.ensure_available()
    }

    async fn monitor_check(&self, tolerance: u64) -> TransportResult<()> {
        for topic in &self.topics {
            let lag = self.broker.lag(&self.group, topic);
            if lag > tolerance {
                return Err(TransportError::LagExceeded {
                    topic: topic.clone(),
                    lag,
                    tolerance,
                });
            }
        }
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        if self.shut() {
            debug!(group = %self.group, "Consumer session closed");
        }
        Ok(())
    }
}

impl Drop for MemoryConsumer {
    fn drop(&mut self) {
        self.shut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::headers;
    use std::time::Duration;
    use tokio::time::timeout;

    const TOPIC: &str = "NativeCmsMetadataPublicationEvents";

    fn message(body: &str) -> RawMessage {
        RawMessage::new(HashMap::new(), body)
            .with_header(headers::REQUEST_ID, "tid_test")
            .with_header(headers::ORIGIN_SYSTEM_ID, "http://cmdb.ft.com/systems/pac")
            .with_header(headers::CONTENT_TYPE, "application/json")
    }

    fn topics() -> Vec<String> {
        vec![TOPIC.to_string()]
    }

    #[tokio::test]
    async fn test_produce_then_consume() {
        let broker = InMemoryBroker::new("memory:9092");
        let consumer = broker.connect_consumer("mapper", &topics()).await.unwrap();
        let producer = broker.connect_producer(TOPIC).await.unwrap();

        producer.send_message(message("first")).await.unwrap();
        producer.send_message(message("second")).await.unwrap();

        let first = consumer.next_message().await.unwrap().unwrap();
        let second = consumer.next_message().await.unwrap().unwrap();

        assert_eq!(first.body, "first");
        assert_eq!(second.body, "second");
        assert_eq!(broker.lag("mapper", TOPIC), 0);
    }

    #[tokio::test]
    async fn test_new_group_starts_at_end_of_log() {
        let broker = InMemoryBroker::new("memory:9092");
        broker.publish(TOPIC, message("old")).unwrap();

        let consumer = broker.connect_consumer("late", &topics()).await.unwrap();
        assert_eq!(broker.committed_offset("late", TOPIC), Some(1));

        broker.publish(TOPIC, message("new")).unwrap();
        let received = consumer.next_message().await.unwrap().unwrap();
        assert_eq!(received.body, "new");
    }

    #[tokio::test]
    async fn test_waiting_consumer_is_woken_by_publish() {
        let broker = InMemoryBroker::new("memory:9092");
        let consumer = broker.connect_consumer("mapper", &topics()).await.unwrap();

        let publisher = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.publish(TOPIC, message("late arrival")).unwrap();
        });

        let received = timeout(Duration::from_secs(1), consumer.next_message())
            .await
            .expect("timeout")
            .unwrap()
            .unwrap();
        assert_eq!(received.body, "late arrival");
    }

    #[tokio::test]
    async fn test_groups_read_independently() {
        let broker = InMemoryBroker::new("memory:9092");
        let a = broker.connect_consumer("group-a", &topics()).await.unwrap();
        let b = broker.connect_consumer("group-b", &topics()).await.unwrap();

        broker.publish(TOPIC, message("shared")).unwrap();

        assert_eq!(a.next_message().await.unwrap().unwrap().body, "shared");
        assert_eq!(b.next_message().await.unwrap().unwrap().body, "shared");
    }

    #[tokio::test]
    async fn test_close_wakes_pending_consumer() {
        let broker = InMemoryBroker::new("memory:9092");
        let consumer = Arc::new(broker.connect_consumer("mapper", &topics()).await.unwrap());

        let waiting = Arc::clone(&consumer);
        let handle = tokio::spawn(async move { waiting.next_message().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        consumer.close().await.unwrap();

        let result = timeout(Duration::from_secs(1), handle)
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(result, Ok(None));
        assert_eq!(broker.active_sessions("mapper"), 0);
    }

    #[tokio::test]
    async fn test_unavailable_broker_rejects_connects_and_sends() {
        let broker = InMemoryBroker::new("memory:9092");
        let producer = broker.connect_producer(TOPIC).await.unwrap();

        broker.set_available(false);

        assert!(matches!(
            broker.connect_producer(TOPIC).await,
            Err(TransportError::Unavailable { .. })
        ));
        assert!(matches!(
            broker.connect_consumer("mapper", &topics()).await,
            Err(TransportError::Unavailable { .. })
        ));
        assert!(matches!(
            producer.send_message(message("lost")).await,
            Err(TransportError::Send { .. })
        ));
        assert!(producer.connectivity_check().await.is_err());

        broker.set_available(true);
        assert!(producer.connectivity_check().await.is_ok());
        assert!(producer.send_message(message("kept")).await.is_ok());
    }

    #[tokio::test]
    async fn test_read_only_topic_rejects_writes() {
        let broker = InMemoryBroker::new("memory:9092");
        let consumer = broker.connect_consumer("mapper", &topics()).await.unwrap();
        let producer = broker.connect_producer("ConceptAnnotations").await.unwrap();

        broker.set_topic_writable("ConceptAnnotations", false);

        assert!(matches!(
            producer.send_message(message("lost")).await,
            Err(TransportError::Send { .. })
        ));
        // Other topics still accept and deliver
        broker.publish(TOPIC, message("inbound")).unwrap();
        assert_eq!(consumer.next_message().await.unwrap().unwrap().body, "inbound");

        broker.set_topic_writable("ConceptAnnotations", true);
        assert!(producer.send_message(message("kept")).await.is_ok());
        assert_eq!(broker.end_offset("ConceptAnnotations"), 1);
    }

    #[tokio::test]
    async fn test_closed_producer_rejects_sends() {
        let broker = InMemoryBroker::new("memory:9092");
        let producer = broker.connect_producer(TOPIC).await.unwrap();

        producer.close().await.unwrap();

        assert_eq!(
            producer.send_message(message("x")).await,
            Err(TransportError::Closed)
        );
        assert_eq!(broker.end_offset(TOPIC), 0);
    }

    #[tokio::test]
    async fn test_monitor_check_reports_lag() {
        let broker = InMemoryBroker::new("memory:9092");
        let consumer = broker.connect_consumer("mapper", &topics()).await.unwrap();

        for i in 0..3 {
            broker.publish(TOPIC, message(&i.to_string())).unwrap();
        }

        assert_eq!(broker.lag("mapper", TOPIC), 3);
        assert!(consumer.monitor_check(5).await.is_ok());
        assert_eq!(
            consumer.monitor_check(2).await,
            Err(TransportError::LagExceeded {
                topic: TOPIC.to_string(),
                lag: 3,
                tolerance: 2,
            })
        );

        consumer.next_message().await.unwrap();
        assert!(consumer.monitor_check(2).await.is_ok());
    }

    #[tokio::test]
    async fn test_session_tracking_and_drop_cleanup() {
        let broker = InMemoryBroker::new("memory:9092");

        {
            let _first = broker.connect_consumer("mapper", &topics()).await.unwrap();
            let _second = broker.connect_consumer("mapper", &topics()).await.unwrap();
            assert_eq!(broker.active_sessions("mapper"), 2);
        }

        // After drop, count should be 0
        assert_eq!(broker.active_sessions("mapper"), 0);
        assert_eq!(broker.sessions_opened("mapper"), 2);
    }

    #[test]
    fn test_address() {
        let broker = InMemoryBroker::new("kafka:9092");
        assert_eq!(broker.address(), "kafka:9092");
    }
}
