//! Per-collection cross-reference index.
//!
//! For an anchor collection the index lists every other collection that has
//! matches against it, with the match count. An index that loaded with zero
//! counterparts is a real answer, distinct from one never requested.

use serde::{Deserialize, Serialize};

use crate::entity::Collection;
use crate::error::FetchError;
use crate::events::{EventBus, ResourceKind};
use crate::state::LoadState;
use crate::store::KeyedStore;

/// A counterpart collection and the number of matches against the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCounterpart {
    pub collection: Collection,
    #[serde(default)]
    pub matches: u64,
}

/// Aggregate match counts for one anchor collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Counterparts in server order
    #[serde(default)]
    pub results: Vec<IndexCounterpart>,

    /// Number of counterparts reported by the server
    #[serde(default)]
    pub total: u64,
}

impl IndexEntry {
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.results.is_empty()
    }

    /// Counterpart entry for `collection_id`.
    pub fn counterpart(&self, collection_id: &str) -> Option<&IndexCounterpart> {
        self.results
            .iter()
            .find(|res| res.collection.id == collection_id)
    }

    /// Counterpart with the most matches; ties keep server order.
    pub fn best_counterpart(&self) -> Option<&IndexCounterpart> {
        self.results
            .iter()
            .fold(None, |best: Option<&IndexCounterpart>, res| match best {
                Some(b) if b.matches >= res.matches => Some(b),
                _ => Some(res),
            })
    }
}

/// Observable availability of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexAvailability {
    Unrequested,
    Pending,
    Failed,
    /// Loaded and the anchor has no counterparts
    LoadedEmpty,
    LoadedNonEmpty,
}

impl IndexAvailability {
    /// Whether a fetch should be dispatched.
    pub fn should_load(self) -> bool {
        matches!(self, Self::Unrequested | Self::Failed)
    }

    pub fn is_loaded(self) -> bool {
        matches!(self, Self::LoadedEmpty | Self::LoadedNonEmpty)
    }
}

/// Store of index entries keyed by anchor collection id.
pub struct XrefIndexStore {
    inner: KeyedStore<IndexEntry>,
}

impl XrefIndexStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: KeyedStore::new(ResourceKind::Index, bus),
        }
    }

    pub fn standalone() -> Self {
        Self {
            inner: KeyedStore::standalone(ResourceKind::Index),
        }
    }

    pub fn bus(&self) -> &EventBus {
        self.inner.bus()
    }

    /// Current state of the index for `collection_id`.
    pub fn get(&self, collection_id: &str) -> LoadState<IndexEntry> {
        self.inner.get(collection_id)
    }

    /// Transition to pending. Returns false when the index is pending or
    /// loaded, including loaded empty.
    pub fn begin_load(&self, collection_id: &str) -> bool {
        self.inner.mark_loading(collection_id)
    }

    pub fn put(&self, collection_id: &str, entry: IndexEntry) {
        self.inner.put(collection_id, entry)
    }

    pub fn mark_error(&self, collection_id: &str, err: FetchError) -> bool {
        self.inner.mark_error(collection_id, err)
    }

    pub fn availability(&self, collection_id: &str) -> IndexAvailability {
        match self.inner.get(collection_id) {
            LoadState::Unrequested => IndexAvailability::Unrequested,
            LoadState::Pending => IndexAvailability::Pending,
            LoadState::Failed(_) => IndexAvailability::Failed,
            LoadState::Ready(entry) if entry.is_empty() => IndexAvailability::LoadedEmpty,
            LoadState::Ready(_) => IndexAvailability::LoadedNonEmpty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn counterpart(id: &str, matches: u64) -> IndexCounterpart {
        IndexCounterpart {
            collection: Collection::new(id, format!("Collection {}", id)),
            matches,
        }
    }

    #[test]
    fn test_availability_transitions() {
        let store = XrefIndexStore::standalone();
        assert_eq!(store.availability("c1"), IndexAvailability::Unrequested);

        assert!(store.begin_load("c1"));
        assert_eq!(store.availability("c1"), IndexAvailability::Pending);

        store.mark_error("c1", FetchError::server(502, "bad gateway"));
        assert_eq!(store.availability("c1"), IndexAvailability::Failed);
        assert!(store.availability("c1").should_load());

        assert!(store.begin_load("c1"));
        store.put(
            "c1",
            IndexEntry {
                results: vec![counterpart("c2", 3)],
                total: 1,
            },
        );
        assert_eq!(store.availability("c1"), IndexAvailability::LoadedNonEmpty);
    }

    #[test]
    fn test_empty_index_is_confirmed() {
        let store = XrefIndexStore::standalone();
        assert!(store.begin_load("c1"));
        store.put("c1", IndexEntry::default());

        assert_eq!(store.availability("c1"), IndexAvailability::LoadedEmpty);
        assert!(!store.availability("c1").should_load());
        assert!(!store.begin_load("c1"));
    }

    #[test]
    fn test_best_counterpart_keeps_order_on_ties() {
        let entry = IndexEntry {
            results: vec![counterpart("c2", 5), counterpart("c3", 9), counterpart("c4", 9)],
            total: 3,
        };
        assert_eq!(entry.best_counterpart().unwrap().collection.id, "c3");
        assert_eq!(entry.counterpart("c4").unwrap().matches, 9);
        assert!(entry.counterpart("c9").is_none());
        assert!(IndexEntry::default().best_counterpart().is_none());
    }

    #[test]
    fn test_deserialize_wire_entry() {
        let entry: IndexEntry = serde_json::from_value(json!({
            "total": 1,
            "results": [
                {"collection": {"id": 7, "label": "Leaks", "links": {"ui": "/collections/7"}}, "matches": 12}
            ]
        }))
        .unwrap();
        assert_eq!(entry.total, 1);
        assert_eq!(entry.results[0].collection.id, "7");
        assert_eq!(entry.results[0].matches, 12);
    }
}
