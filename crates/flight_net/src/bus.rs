//! The bus abstraction.
//!
//! Actors never hold a global connection: a [`Bus`] is constructed at
//! start-up, shared as `Arc<dyn Bus>` and closed on shutdown. [`NatsBus`]
//! is the networked implementation; [`MemoryBus`] routes in-process and
//! records every publish, which is what the tests assert against.
//!
//! [`NatsBus`]: crate::NatsBus

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;

use crate::codec;
use crate::error::{NetError, ParseError};
use crate::messages::Message;
use crate::subjects::subject_matches;

/// A raw delivery: the subject it arrived on and the undecoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The concrete subject the payload was published on.
    pub subject: String,
    /// UTF-8 text payload (not yet validated).
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Create an envelope from a subject and a payload.
    #[must_use]
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }

    /// Decode the payload into a typed message.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the payload is malformed.
    pub fn decode(&self) -> Result<Message, ParseError> {
        codec::decode(&self.payload)
    }
}

/// A stream of deliveries matching one subscription pattern.
pub type Subscription = BoxStream<'static, Envelope>;

/// Topic-routed publish/subscribe transport.
///
/// Delivery is at-least-once at best and unordered across subjects;
/// callers must tolerate loss and duplicates.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publish a message on a subject.
    async fn publish(&self, subject: &str, message: &Message) -> Result<(), NetError>;

    /// Subscribe to a subject pattern (`*` and `>` wildcards allowed).
    async fn subscribe(&self, pattern: &str) -> Result<Subscription, NetError>;

    /// Flush and release the transport. Subscriptions end afterwards.
    async fn close(&self) -> Result<(), NetError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    subscribers: Vec<(String, mpsc::UnboundedSender<Envelope>)>,
    published: Vec<Envelope>,
    recording: bool,
    closed: bool,
}

/// In-process bus routing by subject pattern.
///
/// Cloning yields another handle to the same bus.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryBus {
    /// Create an empty bus that routes without keeping history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bus that also keeps every published envelope, for
    /// [`published`](Self::published) and [`published_on`](Self::published_on).
    #[must_use]
    pub fn recording() -> Self {
        let bus = Self::default();
        bus.lock().recording = true;
        bus
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish raw bytes, bypassing the codec. Useful for injecting
    /// malformed payloads.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Closed`] once the bus has been closed.
    pub fn publish_raw(&self, subject: &str, payload: impl Into<Vec<u8>>) -> Result<(), NetError> {
        let envelope = Envelope::new(subject, payload);
        let mut inner = self.lock();
        if inner.closed {
            return Err(NetError::Closed);
        }
        if inner.recording {
            inner.published.push(envelope.clone());
        }
        inner
            .subscribers
            .retain(|(pattern, tx)| !subject_matches(pattern, subject) || tx.send(envelope.clone()).is_ok());
        Ok(())
    }

    /// Every envelope published so far, in publish order. Empty unless the
    /// bus was created with [`recording`](Self::recording).
    #[must_use]
    pub fn published(&self) -> Vec<Envelope> {
        self.lock().published.clone()
    }

    /// The decoded messages published on one subject, in publish order.
    /// Undecodable payloads are skipped.
    #[must_use]
    pub fn published_on(&self, subject: &str) -> Vec<Message> {
        self.lock()
            .published
            .iter()
            .filter(|e| e.subject == subject)
            .filter_map(|e| e.decode().ok())
            .collect()
    }

    /// Forget the publish history.
    pub fn clear_history(&self) {
        self.lock().published.clear();
    }
}

#[async_trait]
impl Bus for MemoryBus {
    async fn publish(&self, subject: &str, message: &Message) -> Result<(), NetError> {
        self.publish_raw(subject, codec::encode(message))
    }

    async fn subscribe(&self, pattern: &str) -> Result<Subscription, NetError> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut inner = self.lock();
            if inner.closed {
                return Err(NetError::Closed);
            }
            inner.subscribers.push((pattern.to_string(), tx));
        }
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|envelope| (envelope, rx))
        });
        Ok(stream.boxed())
    }

    async fn close(&self) -> Result<(), NetError> {
        let mut inner = self.lock();
        inner.closed = true;
        inner.subscribers.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Direction, Sensor, SensorDelta};
    use crate::subjects::{ALL_DATA, ACTUATOR_UPDATE, SENSOR_DATA};

    fn delta() -> Message {
        SensorDelta::new(Sensor::Speed, Direction::Increased, 20).into()
    }

    #[tokio::test]
    async fn test_memory_bus_routes_by_pattern() {
        let bus = MemoryBus::new();
        let mut data = bus.subscribe(ALL_DATA).await.unwrap();
        let mut updates = bus.subscribe(ACTUATOR_UPDATE).await.unwrap();

        bus.publish(SENSOR_DATA, &delta()).await.unwrap();

        let envelope = data.next().await.unwrap();
        assert_eq!(envelope.subject, SENSOR_DATA);
        assert_eq!(envelope.decode().unwrap(), delta());

        bus.close().await.unwrap();
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn test_memory_bus_records_history() {
        let bus = MemoryBus::recording();
        bus.publish(SENSOR_DATA, &delta()).await.unwrap();
        bus.publish_raw(SENSOR_DATA, "garbage").unwrap();

        assert_eq!(bus.published().len(), 2);
        assert_eq!(bus.published_on(SENSOR_DATA), vec![delta()]);
        assert!(bus.published_on(ACTUATOR_UPDATE).is_empty());
    }

    #[tokio::test]
    async fn test_plain_bus_keeps_no_history() {
        let bus = MemoryBus::new();
        let mut data = bus.subscribe(ALL_DATA).await.unwrap();
        for _ in 0..3 {
            bus.publish(SENSOR_DATA, &delta()).await.unwrap();
        }
        assert_eq!(data.next().await.unwrap().decode().unwrap(), delta());
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        let bus = MemoryBus::new();
        bus.close().await.unwrap();
        assert!(matches!(
            bus.publish(SENSOR_DATA, &delta()).await,
            Err(NetError::Closed)
        ));
    }
}
