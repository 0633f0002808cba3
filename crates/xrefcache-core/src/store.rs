//! Keyed load-state store.
//!
//! Shared primitive behind the entity, collection and index caches: a map
//! from string id to [`LoadState`] with change notifications.
//!
//! Thread-safe via DashMap. Every transition is decided and applied while
//! the entry is locked, so two callers racing on `mark_loading` cannot both
//! win.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::FetchError;
use crate::events::{ChangeKind, EventBus, ResourceKind, ResourceRef, DEFAULT_EVENT_CAPACITY};
use crate::state::LoadState;

/// Map from id to load state, publishing every transition.
pub struct KeyedStore<V> {
    kind: ResourceKind,
    bus: EventBus,
    entries: DashMap<String, LoadState<V>>,
}

impl<V: Clone + PartialEq> KeyedStore<V> {
    /// Create a store publishing on `bus`.
    pub fn new(kind: ResourceKind, bus: EventBus) -> Self {
        Self {
            kind,
            bus,
            entries: DashMap::new(),
        }
    }

    /// Create a store with its own event bus.
    pub fn standalone(kind: ResourceKind) -> Self {
        Self::new(kind, EventBus::new(DEFAULT_EVENT_CAPACITY))
    }

    /// Resource kind stored here.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The event bus this store publishes on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Current state of `id`; `Unrequested` if never seen. Never blocks on I/O.
    pub fn get(&self, id: &str) -> LoadState<V> {
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Transition `unrequested | failed -> pending`.
    ///
    /// Returns false (and changes nothing) when the entry is already pending
    /// or ready; the caller must not dispatch a fetch in that case.
    pub fn mark_loading(&self, id: &str) -> bool {
        {
            let mut entry = self.entries.entry(id.to_string()).or_default();
            if !entry.should_load() {
                trace!(kind = ?self.kind, id, state = entry.label(), "load already in progress or done");
                return false;
            }
            *entry = LoadState::Pending;
        }
        self.publish(id, ChangeKind::Pending);
        true
    }

    /// Store a loaded value, replacing any prior state.
    ///
    /// Storing a value identical to the current one changes nothing and
    /// publishes nothing.
    pub fn put(&self, id: &str, value: V) {
        let changed = match self.entries.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().value() == Some(&value) {
                    false
                } else {
                    occupied.insert(LoadState::Ready(value));
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(LoadState::Ready(value));
                true
            }
        };
        if changed {
            self.publish(id, ChangeKind::Ready);
        }
    }

    /// Transition `pending -> failed`, recording the cause.
    ///
    /// Returns false when the entry was not pending (e.g. a concurrent `put`
    /// already stored a value).
    pub fn mark_error(&self, id: &str, err: FetchError) -> bool {
        {
            let Some(mut entry) = self.entries.get_mut(id) else {
                return false;
            };
            if !entry.is_pending() {
                debug!(kind = ?self.kind, id, state = entry.label(), "ignoring error for entry that is not pending");
                return false;
            }
            *entry = LoadState::Failed(err);
        }
        self.publish(id, ChangeKind::Failed);
        true
    }

    /// Whether `id` has ever been referenced through a mutation.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of all entries currently ready.
    pub fn ready_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_ready())
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Reference to the resource stored under `id`.
    pub fn resource(&self, id: &str) -> ResourceRef {
        ResourceRef::keyed(self.kind, id)
    }

    fn publish(&self, id: &str, change: ChangeKind) {
        self.bus.publish(self.resource(id), change);
    }
}
