//! Change notifications.
//!
//! All stores of one [`XrefStores`](crate::XrefStores) share a broadcast
//! channel. Observers subscribe per resource and re-read the snapshot when
//! notified; events carry no payload beyond what changed.

use std::fmt;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, trace};

use crate::pair_key::PairKey;

/// Events buffered per receiver before it lags.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Kind of a keyed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Entity,
    Collection,
    Index,
}

/// Reference to one observable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// An entity by id
    Entity(String),
    /// A collection by id
    Collection(String),
    /// The cross-reference index of a collection
    Index(String),
    /// The match pages of a collection pair
    Matches(PairKey),
}

impl ResourceRef {
    /// Build a reference to a keyed resource.
    pub fn keyed(kind: ResourceKind, id: impl Into<String>) -> Self {
        let id = id.into();
        match kind {
            ResourceKind::Entity => Self::Entity(id),
            ResourceKind::Collection => Self::Collection(id),
            ResourceKind::Index => Self::Index(id),
        }
    }

    /// Reference to the matches between two collections.
    pub fn matches(a: &str, b: &str) -> Self {
        Self::Matches(PairKey::derive(a, b))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(id) => write!(f, "entity:{}", id),
            Self::Collection(id) => write!(f, "collection:{}", id),
            Self::Index(id) => write!(f, "index:{}", id),
            Self::Matches(key) => write!(f, "matches:{}", key),
        }
    }
}

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Fetch dispatched
    Pending,
    /// Value stored or replaced
    Ready,
    /// Fetch failed
    Failed,
    /// Continuation fetch dispatched
    Expanding,
    /// Continuation page appended
    Appended,
    /// Continuation fetch failed; items kept
    ExpandFailed,
    /// Entry dropped
    Invalidated,
    /// The observer missed events and must re-read
    Resync,
}

/// A single store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub resource: ResourceRef,
    pub change: ChangeKind,
}

/// Sending half shared by all stores.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, resource: ResourceRef, change: ChangeKind) {
        trace!(%resource, ?change, "store event");
        if self
            .sender
            .send(StoreEvent { resource, change })
            .is_err()
        {
            trace!("no subscribers for store event");
        }
    }

    /// Receive every event.
    pub fn subscribe_all(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Receive events for one resource.
    pub fn subscribe(&self, resource: ResourceRef) -> Subscription {
        Subscription {
            resource,
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Per-resource change feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    resource: ResourceRef,
    receiver: broadcast::Receiver<StoreEvent>,
}

impl Subscription {
    /// The observed resource.
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Wait for the next change of the observed resource.
    ///
    /// Returns `None` once the stores are gone. A lagged receiver yields
    /// [`ChangeKind::Resync`].
    pub async fn changed(&mut self) -> Option<ChangeKind> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.resource == self.resource => return Some(event.change),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(resource = %self.resource, skipped, "subscription lagged");
                    return Some(ChangeKind::Resync);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered change of the observed resource, without waiting.
    pub fn try_changed(&mut self) -> Option<ChangeKind> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.resource == self.resource => return Some(event.change),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(_)) => return Some(ChangeKind::Resync),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_filters_resource() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe(ResourceRef::Entity("e1".into()));

        bus.publish(ResourceRef::Entity("e2".into()), ChangeKind::Ready);
        bus.publish(ResourceRef::Entity("e1".into()), ChangeKind::Pending);

        assert_eq!(sub.try_changed(), Some(ChangeKind::Pending));
        assert_eq!(sub.try_changed(), None);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(ResourceRef::Index("c1".into()), ChangeKind::Ready);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new(4);
        let sub = bus.subscribe(ResourceRef::Collection("c1".into()));
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_lagged_subscription_resyncs() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe(ResourceRef::Entity("e1".into()));
        for _ in 0..5 {
            bus.publish(ResourceRef::Entity("e1".into()), ChangeKind::Ready);
        }
        assert_eq!(sub.try_changed(), Some(ChangeKind::Resync));
    }

    #[tokio::test]
    async fn test_changed_closes_with_bus() {
        let bus = EventBus::new(4);
        let mut sub = bus.subscribe(ResourceRef::matches("c1", "c2"));

        bus.publish(ResourceRef::matches("c2", "c1"), ChangeKind::Appended);
        assert_eq!(sub.changed().await, Some(ChangeKind::Appended));

        drop(bus);
        assert_eq!(sub.changed().await, None);
    }

    #[test]
    fn test_resource_display() {
        assert_eq!(ResourceRef::Entity("e1".into()).to_string(), "entity:e1");
        assert_eq!(
            ResourceRef::matches("b", "a").to_string(),
            "matches:a<->b"
        );
    }
}
