//! Incremental result pages.
//!
//! A result set is fetched as a first page followed by continuation pages.
//! Continuations are appended after the existing items, never merged or
//! reordered, so what a reader has already seen stays in place.
//!
//! Two mechanisms keep the item order intact:
//! - `is_expanding` admits at most one continuation in flight per key, so
//!   responses arrive in request order.
//! - every begin operation hands out a [`Ticket`] carrying the entry's
//!   generation; `invalidate` bumps the generation, and responses holding an
//!   older ticket are reported [`Applied::Stale`] without touching state.
//!
//! Thread-safe via interior mutability using parking_lot::Mutex.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::FetchError;
use crate::events::{ChangeKind, EventBus, ResourceRef, DEFAULT_EVENT_CAPACITY};
use crate::pair_key::PairKey;
use crate::state::LoadState;

/// An ordered, growing result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage<T> {
    /// Items in server order
    pub items: Vec<T>,

    /// Total match count reported by the server (may be an estimate)
    pub total: u64,

    /// Continuation cursor; `None` when the result set is exhausted
    pub next: Option<String>,

    /// True while a continuation fetch is in flight
    pub is_expanding: bool,

    /// Cause of the last failed continuation, cleared by the next append
    pub expand_error: Option<FetchError>,
}

impl<T> ResultPage<T> {
    /// Create a page as received from the server.
    pub fn new(items: Vec<T>, total: u64, next: Option<String>) -> Self {
        Self {
            items,
            total,
            next,
            is_expanding: false,
            expand_error: None,
        }
    }

    /// Whether a continuation may be requested right now.
    pub fn can_expand(&self) -> bool {
        self.next.is_some() && !self.is_expanding
    }

    /// Whether the server reported no further pages.
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Proof that a fetch for a specific generation of an entry was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: PairKey,
    generation: u64,
}

impl Ticket {
    pub fn key(&self) -> &PairKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A started continuation: the ticket plus the cursor to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub ticket: Ticket,
    pub cursor: String,
}

/// Result of applying a response.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// State was updated
    Applied,
    /// The response belongs to an invalidated or superseded request; ignored
    Stale,
}

impl Applied {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

struct Slot<T> {
    generation: u64,
    state: LoadState<ResultPage<T>>,
}

struct PagedState<T> {
    slots: HashMap<PairKey, Slot<T>>,
    next_generation: u64,
}

impl<T> PagedState<T> {
    fn fresh_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Slot for `ticket` if it is still the live generation.
    fn live_slot(&mut self, ticket: &Ticket) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(&ticket.key)
            .filter(|slot| slot.generation == ticket.generation)
    }
}

/// Store of incremental result pages keyed by [`PairKey`].
pub struct PagedResultStore<T> {
    bus: EventBus,
    state: Mutex<PagedState<T>>,
}

impl<T: Clone> PagedResultStore<T> {
    /// Create a store publishing on `bus`.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            state: Mutex::new(PagedState {
                slots: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// Create a store with its own event bus.
    pub fn standalone() -> Self {
        Self::new(EventBus::new(DEFAULT_EVENT_CAPACITY))
    }

    /// The event bus this store publishes on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Current state of `key`.
    pub fn state(&self, key: &PairKey) -> LoadState<ResultPage<T>> {
        self.state
            .lock()
            .slots
            .get(key)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    /// The loaded page for `key`, if any.
    pub fn get_page(&self, key: &PairKey) -> Option<ResultPage<T>> {
        self.state(key).into_value()
    }

    /// Whether a continuation for `key` is in flight.
    pub fn is_expanding(&self, key: &PairKey) -> bool {
        matches!(
            self.state.lock().slots.get(key).map(|slot| &slot.state),
            Some(LoadState::Ready(page)) if page.is_expanding
        )
    }

    /// Mark the initial fetch for `key` outstanding.
    ///
    /// Idempotent while the fetch is pending: repeated calls return the same
    /// ticket. On an unrequested, failed or ready entry a new generation is
    /// started; a ready page is dropped in favour of the fresh query.
    pub fn begin_load(&self, key: &PairKey) -> Ticket {
        let ticket = {
            let mut state = self.state.lock();
            if let Some(slot) = state.slots.get(key) {
                if slot.state.is_pending() {
                    return Ticket {
                        key: key.clone(),
                        generation: slot.generation,
                    };
                }
            }
            let generation = state.fresh_generation();
            state.slots.insert(
                key.clone(),
                Slot {
                    generation,
                    state: LoadState::Pending,
                },
            );
            Ticket {
                key: key.clone(),
                generation,
            }
        };
        debug!(%key, generation = ticket.generation, "first page requested");
        self.publish(key, ChangeKind::Pending);
        ticket
    }

    /// Start the initial fetch only if none is pending and no page is loaded.
    ///
    /// Returns `None` when the caller must not dispatch a request.
    pub fn try_begin_load(&self, key: &PairKey) -> Option<Ticket> {
        {
            let state = self.state.lock();
            if let Some(slot) = state.slots.get(key) {
                if slot.state.is_pending() || slot.state.is_ready() {
                    return None;
                }
            }
        }
        Some(self.begin_load(key))
    }

    /// Store the first page, replacing whatever the entry held.
    pub fn apply_first_page(&self, ticket: &Ticket, page: ResultPage<T>) -> Applied {
        {
            let mut state = self.state.lock();
            let Some(slot) = state.live_slot(ticket) else {
                debug!(key = %ticket.key, generation = ticket.generation, "discarding stale first page");
                return Applied::Stale;
            };
            let page = ResultPage {
                is_expanding: false,
                expand_error: None,
                ..page
            };
            trace!(key = %ticket.key, items = page.items.len(), total = page.total, "first page applied");
            slot.state = LoadState::Ready(page);
        }
        self.publish(&ticket.key, ChangeKind::Ready);
        Applied::Applied
    }

    /// Record a failed initial fetch.
    pub fn apply_load_error(&self, ticket: &Ticket, err: FetchError) -> Applied {
        {
            let mut state = self.state.lock();
            let Some(slot) = state.live_slot(ticket) else {
                debug!(key = %ticket.key, "discarding stale first page error");
                return Applied::Stale;
            };
            if !slot.state.is_pending() {
                return Applied::Stale;
            }
            slot.state = LoadState::Failed(err);
        }
        self.publish(&ticket.key, ChangeKind::Failed);
        Applied::Applied
    }

    /// Mark a continuation fetch in flight.
    ///
    /// Only succeeds when the page is loaded, has a `next` cursor and no
    /// continuation is already in flight. Otherwise this is a no-op and
    /// returns `None`: the request is coalesced, not queued.
    pub fn begin_expand(&self, key: &PairKey) -> Option<Continuation> {
        let continuation = {
            let mut state = self.state.lock();
            let slot = state.slots.get_mut(key)?;
            let LoadState::Ready(page) = &mut slot.state else {
                return None;
            };
            if page.is_expanding {
                trace!(%key, "continuation already in flight");
                return None;
            }
            let cursor = page.next.clone()?;
            page.is_expanding = true;
            Continuation {
                ticket: Ticket {
                    key: key.clone(),
                    generation: slot.generation,
                },
                cursor,
            }
        };
        debug!(%key, cursor = %continuation.cursor, "continuation requested");
        self.publish(key, ChangeKind::Expanding);
        Some(continuation)
    }

    /// Append a continuation page.
    ///
    /// Items go after the existing ones; `total` and `next` are replaced by
    /// the new page's values.
    pub fn apply_next_page(&self, ticket: &Ticket, page: ResultPage<T>) -> Applied {
        {
            let mut state = self.state.lock();
            let Some(slot) = state.live_slot(ticket) else {
                debug!(key = %ticket.key, "discarding stale continuation");
                return Applied::Stale;
            };
            let LoadState::Ready(current) = &mut slot.state else {
                return Applied::Stale;
            };
            if !current.is_expanding {
                debug!(key = %ticket.key, "continuation arrived without one in flight");
                return Applied::Stale;
            }
            current.items.extend(page.items);
            current.total = page.total;
            current.next = page.next;
            current.is_expanding = false;
            current.expand_error = None;
            trace!(key = %ticket.key, items = current.items.len(), "continuation applied");
        }
        self.publish(&ticket.key, ChangeKind::Appended);
        Applied::Applied
    }

    /// Record a failed continuation. Loaded items are kept and the entry
    /// becomes expandable again.
    pub fn apply_expand_error(&self, ticket: &Ticket, err: FetchError) -> Applied {
        {
            let mut state = self.state.lock();
            let Some(slot) = state.live_slot(ticket) else {
                debug!(key = %ticket.key, "discarding stale continuation error");
                return Applied::Stale;
            };
            let LoadState::Ready(current) = &mut slot.state else {
                return Applied::Stale;
            };
            if !current.is_expanding {
                return Applied::Stale;
            }
            current.is_expanding = false;
            current.expand_error = Some(err);
        }
        self.publish(&ticket.key, ChangeKind::ExpandFailed);
        Applied::Applied
    }

    /// Drop the entry for `key`. Responses to requests started before this
    /// call are discarded when they arrive.
    pub fn invalidate(&self, key: &PairKey) -> bool {
        let removed = self.state.lock().slots.remove(key).is_some();
        if removed {
            debug!(%key, "result pages invalidated");
            self.publish(key, ChangeKind::Invalidated);
        }
        removed
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().slots.is_empty()
    }

    fn publish(&self, key: &PairKey, change: ChangeKind) {
        self.bus.publish(ResourceRef::Matches(key.clone()), change);
    }
}
