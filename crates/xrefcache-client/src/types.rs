//! Wire types of the match API.

use serde::{Deserialize, Serialize};
use xrefcache_core::entity::deserialize_id;
use xrefcache_core::{Entity, ResultPage, XrefMatch};

/// One match as returned by the server, with both entities embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default)]
    pub score: f64,

    /// Entity in the anchor collection
    pub entity: Entity,

    /// Matching entity in the counterpart collection
    #[serde(rename = "match")]
    pub matched: Entity,
}

/// A page of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(default)]
    pub results: Vec<MatchRecord>,

    #[serde(default)]
    pub total: u64,

    /// Continuation URL; absent or empty on the last page
    #[serde(default)]
    pub next: Option<String>,
}

impl MatchesResponse {
    /// Split into a page of match references and the embedded entities.
    ///
    /// `anchor` is the collection the page was requested for. Entities are
    /// returned in item order, anchor entity first.
    pub fn into_page(self, anchor: &str) -> (ResultPage<XrefMatch>, Vec<Entity>) {
        let mut entities = Vec::with_capacity(self.results.len() * 2);
        let items = self
            .results
            .into_iter()
            .map(|record| {
                let item = XrefMatch::new(
                    record.id,
                    record.score,
                    anchor,
                    record.entity.id.clone(),
                    record.matched.id.clone(),
                );
                entities.push(record.entity);
                entities.push(record.matched);
                item
            })
            .collect();
        let next = self.next.filter(|next| !next.is_empty());
        (ResultPage::new(items, self.total, next), entities)
    }
}

/// Error body returned by the server on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
