//! API trait definition.
//!
//! Defines the async interface the fetch coordinator drives. The HTTP
//! implementation is [`RemoteApi`](crate::RemoteApi); tests substitute
//! in-memory implementations.

use async_trait::async_trait;
use xrefcache_core::{Collection, Entity, FetchError, IndexEntry};

use crate::types::MatchesResponse;

/// Remote source of entities, collections, indexes and match pages.
#[async_trait]
pub trait XrefApi: Send + Sync {
    /// Fetch a single entity.
    async fn fetch_entity(&self, id: &str) -> Result<Entity, FetchError>;

    /// Fetch a collection record.
    async fn fetch_collection(&self, id: &str) -> Result<Collection, FetchError>;

    /// Fetch the cross-reference index of an anchor collection.
    async fn fetch_index(&self, collection_id: &str) -> Result<IndexEntry, FetchError>;

    /// Fetch a page of matches between two collections.
    ///
    /// # Arguments
    /// * `collection_id` - Anchor collection
    /// * `other_id` - Counterpart collection
    /// * `cursor` - `None` for the first page, otherwise the `next` value of
    ///   the previous page
    async fn fetch_matches(
        &self,
        collection_id: &str,
        other_id: &str,
        cursor: Option<&str>,
    ) -> Result<MatchesResponse, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe
    fn _assert_object_safe(_: &dyn XrefApi) {}
}
