//! xrefcache Client - Remote API access and fetch coordination
//!
//! This crate connects the in-memory stores of `xrefcache-core` to a
//! server:
//! - [`XrefApi`]: async interface for entity, collection, index and match
//!   requests
//! - [`RemoteApi`]: HTTP implementation over `reqwest`
//! - [`FetchCoordinator`]: decides which requests are needed, dispatches each
//!   at most once and writes responses back into the stores
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xrefcache_client::{FetchCoordinator, RemoteApi};
//! use xrefcache_config::XrefConfig;
//! use xrefcache_core::XrefStores;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = XrefConfig::default();
//!     let api = Arc::new(RemoteApi::from_config(&config.api)?);
//!     let stores = Arc::new(XrefStores::new(config.cache.event_capacity));
//!     let coordinator = FetchCoordinator::new(api, stores);
//!
//!     let screen = coordinator.load_xref_screen("1", "2").await;
//!     if screen.can_load_more() {
//!         coordinator.request_more("1", "2").await;
//!     }
//!     Ok(())
//! }
//! ```

mod coordinator;
mod error;
mod remote;
mod traits;
mod types;

pub use coordinator::{FetchCoordinator, FetchDecision, FetchOutcome, FetchRequest, SkipReason};
pub use error::ClientError;
pub use remote::RemoteApi;
pub use traits::XrefApi;
pub use types::{MatchRecord, MatchesResponse};

/// Result type for client setup.
pub type Result<T> = std::result::Result<T, ClientError>;
