//! The full set of stores of one client session.

use tokio::sync::broadcast;

use crate::entity::{Collection, Entity};
use crate::events::{EventBus, ResourceKind, ResourceRef, StoreEvent, Subscription};
use crate::index::{IndexAvailability, IndexEntry, XrefIndexStore};
use crate::paged::{PagedResultStore, ResultPage};
use crate::pair_key::PairKey;
use crate::state::LoadState;
use crate::store::KeyedStore;
use crate::xref::XrefMatch;

/// Point-in-time copy of one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Entity(LoadState<Entity>),
    Collection(LoadState<Collection>),
    Index(LoadState<IndexEntry>),
    Matches(LoadState<ResultPage<XrefMatch>>),
}

impl Snapshot {
    /// Short name of the load state.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Entity(state) => state.label(),
            Self::Collection(state) => state.label(),
            Self::Index(state) => state.label(),
            Self::Matches(state) => state.label(),
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            Self::Entity(state) => state.is_ready(),
            Self::Collection(state) => state.is_ready(),
            Self::Index(state) => state.is_ready(),
            Self::Matches(state) => state.is_ready(),
        }
    }
}

/// Everything needed to render the matches between two collections.
#[derive(Debug, Clone, PartialEq)]
pub struct XrefScreen {
    pub key: PairKey,
    pub collection: LoadState<Collection>,
    pub other: LoadState<Collection>,
    pub index: LoadState<IndexEntry>,
    pub matches: LoadState<ResultPage<XrefMatch>>,
}

impl XrefScreen {
    /// Both collections, the anchor's index and the first page are present.
    pub fn is_ready(&self) -> bool {
        self.collection.is_ready()
            && self.other.is_ready()
            && self.index.is_ready()
            && self.matches.is_ready()
    }

    /// Whether "load more" would dispatch a request.
    pub fn can_load_more(&self) -> bool {
        self.matches.value().is_some_and(ResultPage::can_expand)
    }

    /// First failure among the parts, in display order.
    pub fn error(&self) -> Option<&crate::error::FetchError> {
        self.collection
            .error()
            .or_else(|| self.other.error())
            .or_else(|| self.index.error())
            .or_else(|| self.matches.error())
    }
}

/// Entity, collection, index and match stores sharing one event bus.
pub struct XrefStores {
    bus: EventBus,
    pub entities: KeyedStore<Entity>,
    pub collections: KeyedStore<Collection>,
    pub index: XrefIndexStore,
    pub matches: PagedResultStore<XrefMatch>,
}

impl XrefStores {
    /// Create empty stores whose subscribers buffer up to `event_capacity`
    /// events.
    pub fn new(event_capacity: usize) -> Self {
        let bus = EventBus::new(event_capacity);
        Self {
            entities: KeyedStore::new(ResourceKind::Entity, bus.clone()),
            collections: KeyedStore::new(ResourceKind::Collection, bus.clone()),
            index: XrefIndexStore::new(bus.clone()),
            matches: PagedResultStore::new(bus.clone()),
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Read the current state of `resource`.
    pub fn observe(&self, resource: &ResourceRef) -> Snapshot {
        match resource {
            ResourceRef::Entity(id) => Snapshot::Entity(self.entities.get(id)),
            ResourceRef::Collection(id) => Snapshot::Collection(self.collections.get(id)),
            ResourceRef::Index(id) => Snapshot::Index(self.index.get(id)),
            ResourceRef::Matches(key) => Snapshot::Matches(self.matches.state(key)),
        }
    }

    /// Subscribe to changes of `resource`.
    pub fn subscribe(&self, resource: ResourceRef) -> Subscription {
        self.bus.subscribe(resource)
    }

    /// Subscribe to every store event.
    pub fn subscribe_all(&self) -> broadcast::Receiver<StoreEvent> {
        self.bus.subscribe_all()
    }

    /// Index availability of `collection_id`.
    pub fn index_availability(&self, collection_id: &str) -> IndexAvailability {
        self.index.availability(collection_id)
    }

    /// Snapshot of the match screen for `collection_id` against `other_id`.
    pub fn xref_screen(&self, collection_id: &str, other_id: &str) -> XrefScreen {
        let key = PairKey::derive(collection_id, other_id);
        XrefScreen {
            collection: self.collections.get(collection_id),
            other: self.collections.get(other_id),
            index: self.index.get(collection_id),
            matches: self.matches.state(&key),
            key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChangeKind, DEFAULT_EVENT_CAPACITY};

    fn stores() -> XrefStores {
        XrefStores::new(DEFAULT_EVENT_CAPACITY)
    }

    #[test]
    fn test_observe_each_resource() {
        let stores = stores();
        stores.entities.put("e1", Entity::new("e1", "Person"));
        stores.collections.mark_loading("c1");

        assert!(stores.observe(&ResourceRef::Entity("e1".into())).is_ready());
        assert_eq!(
            stores.observe(&ResourceRef::Collection("c1".into())).label(),
            "pending"
        );
        assert_eq!(
            stores.observe(&ResourceRef::Index("c1".into())),
            Snapshot::Index(LoadState::Unrequested)
        );
        assert_eq!(
            stores.observe(&ResourceRef::matches("c1", "c2")),
            Snapshot::Matches(LoadState::Unrequested)
        );
    }

    #[test]
    fn test_shared_bus() {
        let stores = stores();
        let mut events = stores.subscribe_all();

        stores.entities.put("e1", Entity::new("e1", "Person"));
        stores.index.begin_load("c1");
        stores.matches.begin_load(&PairKey::derive("c1", "c2"));

        let resources: Vec<ResourceRef> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|event| event.resource)
            .collect();
        assert_eq!(
            resources,
            vec![
                ResourceRef::Entity("e1".into()),
                ResourceRef::Index("c1".into()),
                ResourceRef::matches("c1", "c2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_subscription_sees_collection() {
        let stores = stores();
        let mut sub = stores.subscribe(ResourceRef::Collection("c1".into()));
        stores.collections.put("c1", Collection::new("c1", "Leaks"));
        assert_eq!(sub.changed().await, Some(ChangeKind::Ready));
    }

    #[test]
    fn test_xref_screen_readiness() {
        let stores = stores();
        let key = PairKey::derive("c1", "c2");

        let screen = stores.xref_screen("c1", "c2");
        assert!(!screen.is_ready());
        assert!(!screen.can_load_more());
        assert_eq!(screen.key, key);

        stores.collections.put("c1", Collection::new("c1", "Leaks"));
        stores.collections.put("c2", Collection::new("c2", "Registry"));
        stores.index.put("c1", IndexEntry::default());
        let ticket = stores.matches.begin_load(&key);
        assert!(!stores.xref_screen("c1", "c2").is_ready());

        let _ = stores.matches.apply_first_page(
            &ticket,
            ResultPage::new(vec![XrefMatch::new("m1", 0.9, "c1", "e1", "e2")], 10, Some("p2".into())),
        );
        let screen = stores.xref_screen("c1", "c2");
        assert!(screen.is_ready());
        assert!(screen.can_load_more());
        assert!(screen.error().is_none());

        // the reverse direction reads the same page
        assert_eq!(stores.xref_screen("c2", "c1").matches, screen.matches);
    }
}
