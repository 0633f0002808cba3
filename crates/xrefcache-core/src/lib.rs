//! xrefcache Core - Client-side entity cache and incremental pagination
//!
//! This crate holds the in-memory state of an investigation client:
//! - Entity and collection records with an explicit load lifecycle
//! - Order-independent keys for collection-vs-collection match lookups
//! - Growing, order-stable result pages with a single in-flight guard
//! - Per-collection cross-reference index counts
//! - Change notifications for observers
//!
//! The stores perform no I/O. Fetching is driven by the coordinator in
//! `xrefcache-client`, which writes responses back through the operations
//! exposed here.
//!
//! # Architecture
//!
//! ```text
//! XrefStores
//! ├── EntityCache      (KeyedStore<Entity>)
//! ├── CollectionCache  (KeyedStore<Collection>)
//! ├── XrefIndexStore   (KeyedStore<IndexEntry> + availability)
//! ├── PagedResultStore<XrefMatch> (keyed by PairKey)
//! └── EventBus         (broadcast of StoreEvent)
//! ```

pub mod entity;
pub mod error;
pub mod events;
pub mod index;
pub mod paged;
pub mod pair_key;
pub mod state;
pub mod store;
pub mod stores;
pub mod xref;

// Re-exports
pub use entity::{truncate_label, Collection, CollectionLinks, Entity};
pub use error::FetchError;
pub use events::{
    ChangeKind, EventBus, ResourceKind, ResourceRef, StoreEvent, Subscription,
    DEFAULT_EVENT_CAPACITY,
};
pub use index::{IndexAvailability, IndexCounterpart, IndexEntry, XrefIndexStore};
pub use paged::{Applied, Continuation, PagedResultStore, ResultPage, Ticket};
pub use pair_key::{PairKey, PAIR_SEPARATOR};
pub use state::LoadState;
pub use store::KeyedStore;
pub use stores::{Snapshot, XrefScreen, XrefStores};
pub use xref::XrefMatch;

/// Store of entity records keyed by entity id.
pub type EntityCache = KeyedStore<Entity>;

/// Store of collection records keyed by collection id.
pub type CollectionCache = KeyedStore<Collection>;
