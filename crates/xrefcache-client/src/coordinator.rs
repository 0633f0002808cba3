//! Fetch coordination.
//!
//! Decides, from the current store state, whether a requested resource
//! needs a network fetch, dispatches at most one request per resource and
//! writes the response back into the stores.
//!
//! Every `request_*` method re-checks its decision through the store's
//! compare-and-set begin operation before awaiting the API, so concurrent
//! triggers for the same resource collapse into a single request. Failures
//! never escape: they are recorded in the store, logged and returned as
//! [`FetchOutcome::Failed`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use xrefcache_core::{
    Applied, Entity, FetchError, LoadState, PairKey, ResourceRef, Snapshot, Subscription,
    Ticket, XrefScreen, XrefStores,
};

use crate::traits::XrefApi;

/// A resource someone asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Entity(String),
    Collection(String),
    Index(String),
    /// First page of matches of `collection_id` against `other_id`
    FirstPage {
        collection_id: String,
        other_id: String,
    },
    /// Next page of matches of an already loaded pair
    Continuation {
        collection_id: String,
        other_id: String,
    },
}

impl FetchRequest {
    pub fn first_page(collection_id: impl Into<String>, other_id: impl Into<String>) -> Self {
        Self::FirstPage {
            collection_id: collection_id.into(),
            other_id: other_id.into(),
        }
    }

    pub fn continuation(collection_id: impl Into<String>, other_id: impl Into<String>) -> Self {
        Self::Continuation {
            collection_id: collection_id.into(),
            other_id: other_id.into(),
        }
    }
}

/// Why no request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The value is already present
    Loaded,
    /// A request for the same resource is outstanding
    InFlight,
    /// The result set has no further pages
    Exhausted,
    /// No first page to continue from
    NotLoaded,
    /// The pair is not the one currently on display
    InactivePair,
}

/// What a request should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    Skip(SkipReason),
    FetchEntity,
    FetchCollection,
    FetchIndex,
    FetchFirstPage,
    FetchContinuation { cursor: String },
}

impl FetchDecision {
    pub fn should_fetch(&self) -> bool {
        !matches!(self, Self::Skip(_))
    }
}

/// Result of a `request_*` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Nothing was dispatched
    Skipped(SkipReason),
    /// The response was stored
    Loaded,
    /// The fetch failed; the cause is recorded in the store
    Failed(FetchError),
    /// The response arrived for a superseded request and was dropped
    Discarded,
}

impl FetchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// The pair on display, in the direction it was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActivePair {
    key: PairKey,
    collection_id: String,
    other_id: String,
    /// Direction the stored page was fetched in; continuation cursors
    /// belong to it
    fetched_as: (String, String),
}

/// Drives fetches for a set of stores.
pub struct FetchCoordinator {
    api: Arc<dyn XrefApi>,
    stores: Arc<XrefStores>,
    active: Mutex<Option<ActivePair>>,
}

impl FetchCoordinator {
    pub fn new(api: Arc<dyn XrefApi>, stores: Arc<XrefStores>) -> Self {
        Self {
            api,
            stores,
            active: Mutex::new(None),
        }
    }

    pub fn stores(&self) -> &Arc<XrefStores> {
        &self.stores
    }

    /// Read the current state of `resource`.
    pub fn observe(&self, resource: &ResourceRef) -> Snapshot {
        self.stores.observe(resource)
    }

    /// Subscribe to changes of `resource`.
    pub fn subscribe(&self, resource: ResourceRef) -> Subscription {
        self.stores.subscribe(resource)
    }

    /// The pair currently on display as `(collection_id, other_id)`.
    pub fn active_pair(&self) -> Option<(String, String)> {
        self.active
            .lock()
            .as_ref()
            .map(|pair| (pair.collection_id.clone(), pair.other_id.clone()))
    }

    /// Decide what `request` needs, from the current state alone.
    pub fn decide(&self, request: &FetchRequest) -> FetchDecision {
        match request {
            FetchRequest::Entity(id) => {
                keyed_decision(&self.stores.entities.get(id), FetchDecision::FetchEntity)
            }
            FetchRequest::Collection(id) => keyed_decision(
                &self.stores.collections.get(id),
                FetchDecision::FetchCollection,
            ),
            FetchRequest::Index(id) => {
                keyed_decision(&self.stores.index.get(id), FetchDecision::FetchIndex)
            }
            FetchRequest::FirstPage {
                collection_id,
                other_id,
            } => {
                let key = PairKey::derive(collection_id, other_id);
                if !self.is_active(&key) {
                    return FetchDecision::FetchFirstPage;
                }
                keyed_decision(&self.stores.matches.state(&key), FetchDecision::FetchFirstPage)
            }
            FetchRequest::Continuation {
                collection_id,
                other_id,
            } => {
                let key = PairKey::derive(collection_id, other_id);
                if !self.is_active(&key) {
                    return FetchDecision::Skip(SkipReason::InactivePair);
                }
                match self.stores.matches.state(&key) {
                    LoadState::Ready(page) if page.is_expanding => {
                        FetchDecision::Skip(SkipReason::InFlight)
                    }
                    LoadState::Ready(page) => match page.next {
                        Some(cursor) => FetchDecision::FetchContinuation { cursor },
                        None => FetchDecision::Skip(SkipReason::Exhausted),
                    },
                    _ => FetchDecision::Skip(SkipReason::NotLoaded),
                }
            }
        }
    }

    /// Dispatch `request` if needed.
    pub async fn request(&self, request: &FetchRequest) -> FetchOutcome {
        match request {
            FetchRequest::Entity(id) => self.request_entity(id).await,
            FetchRequest::Collection(id) => self.request_collection(id).await,
            FetchRequest::Index(id) => self.request_index(id).await,
            FetchRequest::FirstPage {
                collection_id,
                other_id,
            } => self.request_first_page(collection_id, other_id).await,
            FetchRequest::Continuation {
                collection_id,
                other_id,
            } => self.request_more(collection_id, other_id).await,
        }
    }

    /// Load `resource` if it is not present or pending.
    ///
    /// Match pages are requested in the direction of the active pair when
    /// the key matches it, otherwise in anchor order.
    pub async fn request_load(&self, resource: &ResourceRef) -> FetchOutcome {
        match resource {
            ResourceRef::Entity(id) => self.request_entity(id).await,
            ResourceRef::Collection(id) => self.request_collection(id).await,
            ResourceRef::Index(id) => self.request_index(id).await,
            ResourceRef::Matches(key) => {
                let (collection_id, other_id) = self.direction(key);
                self.request_first_page(&collection_id, &other_id).await
            }
        }
    }

    pub async fn request_entity(&self, id: &str) -> FetchOutcome {
        let entities = &self.stores.entities;
        if !entities.mark_loading(id) {
            return FetchOutcome::Skipped(keyed_skip(&entities.get(id)));
        }
        match self.api.fetch_entity(id).await {
            Ok(entity) => {
                entities.put(id, entity);
                FetchOutcome::Loaded
            }
            Err(err) => {
                warn!(id, error = %err, "entity fetch failed");
                entities.mark_error(id, err.clone());
                FetchOutcome::Failed(err)
            }
        }
    }

    pub async fn request_collection(&self, id: &str) -> FetchOutcome {
        let collections = &self.stores.collections;
        if !collections.mark_loading(id) {
            return FetchOutcome::Skipped(keyed_skip(&collections.get(id)));
        }
        match self.api.fetch_collection(id).await {
            Ok(collection) => {
                collections.put(id, collection);
                FetchOutcome::Loaded
            }
            Err(err) => {
                warn!(id, error = %err, "collection fetch failed");
                collections.mark_error(id, err.clone());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Load the index of `collection_id`. A loaded empty index is final.
    pub async fn request_index(&self, collection_id: &str) -> FetchOutcome {
        let index = &self.stores.index;
        if !index.begin_load(collection_id) {
            return FetchOutcome::Skipped(keyed_skip(&index.get(collection_id)));
        }
        match self.api.fetch_index(collection_id).await {
            Ok(entry) => {
                debug!(collection_id, counterparts = entry.total, "index loaded");
                index.put(collection_id, entry);
                FetchOutcome::Loaded
            }
            Err(err) => {
                warn!(collection_id, error = %err, "index fetch failed");
                index.mark_error(collection_id, err.clone());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Load the first page of matches and make the pair active.
    ///
    /// When the pair differs from the active one, the previous pair's page
    /// is dropped and the new pair is fetched fresh.
    pub async fn request_first_page(&self, collection_id: &str, other_id: &str) -> FetchOutcome {
        let ticket = match self.begin_first_page(collection_id, other_id) {
            Ok(ticket) => ticket,
            Err(reason) => return FetchOutcome::Skipped(reason),
        };

        match self.api.fetch_matches(collection_id, other_id, None).await {
            Ok(response) => {
                let (page, entities) = response.into_page(collection_id);
                self.put_entities(entities);
                let items = page.items.len();
                match self.stores.matches.apply_first_page(&ticket, page) {
                    Applied::Applied => {
                        debug!(key = %ticket.key(), items, "first page loaded");
                        FetchOutcome::Loaded
                    }
                    Applied::Stale => FetchOutcome::Discarded,
                }
            }
            Err(err) => match self.stores.matches.apply_load_error(&ticket, err.clone()) {
                Applied::Applied => {
                    warn!(key = %ticket.key(), error = %err, "first page fetch failed");
                    FetchOutcome::Failed(err)
                }
                Applied::Stale => FetchOutcome::Discarded,
            },
        }
    }

    /// Load the next page of the active pair.
    ///
    /// Suppressed while a continuation is in flight, when the result set is
    /// exhausted and for pairs not on display. Safe to call repeatedly.
    pub async fn request_more(&self, collection_id: &str, other_id: &str) -> FetchOutcome {
        let key = PairKey::derive(collection_id, other_id);
        let (pair, continuation) = {
            let active = self.active.lock();
            let Some(pair) = active.as_ref().filter(|pair| pair.key == key) else {
                debug!(%key, "continuation for inactive pair ignored");
                return FetchOutcome::Skipped(SkipReason::InactivePair);
            };
            match self.stores.matches.begin_expand(&key) {
                Some(continuation) => (pair.clone(), continuation),
                None => return FetchOutcome::Skipped(self.expand_skip(&key)),
            }
        };

        let (anchor, counterpart) = &pair.fetched_as;
        let result = self
            .api
            .fetch_matches(anchor, counterpart, Some(&continuation.cursor))
            .await;
        let ticket = &continuation.ticket;
        match result {
            Ok(response) => {
                let (page, entities) = response.into_page(anchor);
                self.put_entities(entities);
                match self.stores.matches.apply_next_page(ticket, page) {
                    Applied::Applied => FetchOutcome::Loaded,
                    Applied::Stale => FetchOutcome::Discarded,
                }
            }
            Err(err) => match self.stores.matches.apply_expand_error(ticket, err.clone()) {
                Applied::Applied => {
                    warn!(%key, error = %err, "continuation fetch failed");
                    FetchOutcome::Failed(err)
                }
                Applied::Stale => FetchOutcome::Discarded,
            },
        }
    }

    /// Load everything the match screen needs, concurrently.
    ///
    /// Requests both collections, the anchor's index and the first match
    /// page; parts already present are not refetched. Failures are recorded
    /// in the returned snapshot.
    pub async fn load_xref_screen(&self, collection_id: &str, other_id: &str) -> XrefScreen {
        info!(collection_id, other_id, "loading cross-reference screen");
        let (collection, other, index, matches) = futures::join!(
            self.request_collection(collection_id),
            self.request_collection(other_id),
            self.request_index(collection_id),
            self.request_first_page(collection_id, other_id),
        );
        debug!(
            ?collection,
            ?other,
            ?index,
            ?matches,
            "cross-reference screen requests settled"
        );
        self.stores.xref_screen(collection_id, other_id)
    }

    /// Switch the active pair to `other_id` against the current anchor.
    pub async fn select_counterpart(&self, other_id: &str) -> FetchOutcome {
        let Some((collection_id, current)) = self.active_pair() else {
            return FetchOutcome::Skipped(SkipReason::InactivePair);
        };
        if current == other_id {
            return FetchOutcome::Skipped(SkipReason::Loaded);
        }
        let (_, matches) = futures::join!(
            self.request_collection(other_id),
            self.request_first_page(&collection_id, other_id),
        );
        matches
    }

    fn is_active(&self, key: &PairKey) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|pair| &pair.key == key)
    }

    fn direction(&self, key: &PairKey) -> (String, String) {
        if let Some(pair) = self.active.lock().as_ref().filter(|pair| &pair.key == key) {
            return (pair.collection_id.clone(), pair.other_id.clone());
        }
        let (low, high) = key.anchors();
        (low.to_string(), high.to_string())
    }

    /// Switch the active pair if needed and mark the first page pending.
    fn begin_first_page(&self, collection_id: &str, other_id: &str) -> Result<Ticket, SkipReason> {
        let key = PairKey::derive(collection_id, other_id);
        let matches = &self.stores.matches;
        let mut active = self.active.lock();

        let requested = (collection_id.to_string(), other_id.to_string());
        let previous = active.take();

        let (result, fetched_as) = match previous {
            Some(pair) if pair.key == key => match matches.try_begin_load(&key) {
                Some(ticket) => (Ok(ticket), requested.clone()),
                // The stored page keeps the direction it was fetched in
                None => (Err(keyed_skip(&matches.state(&key))), pair.fetched_as),
            },
            previous => {
                if let Some(previous) = previous {
                    info!(from = %previous.key, to = %key, "active pair changed");
                    matches.invalidate(&previous.key);
                }
                matches.invalidate(&key);
                (Ok(matches.begin_load(&key)), requested.clone())
            }
        };

        *active = Some(ActivePair {
            key,
            collection_id: requested.0,
            other_id: requested.1,
            fetched_as,
        });
        result
    }

    fn expand_skip(&self, key: &PairKey) -> SkipReason {
        match self.stores.matches.state(key) {
            LoadState::Ready(page) if page.is_expanding => SkipReason::InFlight,
            LoadState::Ready(_) => SkipReason::Exhausted,
            _ => SkipReason::NotLoaded,
        }
    }

    fn put_entities(&self, entities: Vec<Entity>) {
        for entity in entities {
            let id = entity.id.clone();
            self.stores.entities.put(&id, entity);
        }
    }
}

fn keyed_decision<T>(state: &LoadState<T>, fetch: FetchDecision) -> FetchDecision {
    if state.should_load() {
        fetch
    } else {
        FetchDecision::Skip(keyed_skip(state))
    }
}

fn keyed_skip<T>(state: &LoadState<T>) -> SkipReason {
    if state.is_pending() {
        SkipReason::InFlight
    } else {
        SkipReason::Loaded
    }
}
