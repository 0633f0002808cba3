//! Cross-reference match items.

use serde::Serialize;

/// One match between an entity of the anchor collection and an entity of
/// the counterpart collection.
///
/// Entities are referenced by id; their records live in the entity cache.
/// A page is shared by both directions of a pair, so each item records the
/// collection it was fetched from. Use [`sides`](Self::sides) to read it
/// from either side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XrefMatch {
    /// Match id
    pub id: String,

    /// Similarity score reported by the server
    pub score: f64,

    /// Collection `entity_id` belongs to
    pub anchor: String,

    /// Entity in the anchor collection
    pub entity_id: String,

    /// Matching entity in the counterpart collection
    pub match_id: String,
}

impl XrefMatch {
    pub fn new(
        id: impl Into<String>,
        score: f64,
        anchor: impl Into<String>,
        entity_id: impl Into<String>,
        match_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            score,
            anchor: anchor.into(),
            entity_id: entity_id.into(),
            match_id: match_id.into(),
        }
    }

    /// Ids of both referenced entities.
    pub fn entity_ids(&self) -> [&str; 2] {
        [&self.entity_id, &self.match_id]
    }

    /// `(entity in collection_id, entity in the counterpart)`.
    pub fn sides(&self, collection_id: &str) -> (&str, &str) {
        if self.anchor == collection_id {
            (&self.entity_id, &self.match_id)
        } else {
            (&self.match_id, &self.entity_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sides_follow_requested_anchor() {
        let item = XrefMatch::new("m1", 0.8, "c1", "c1-e1", "c2-e1");

        assert_eq!(item.sides("c1"), ("c1-e1", "c2-e1"));
        assert_eq!(item.sides("c2"), ("c2-e1", "c1-e1"));
        assert_eq!(item.entity_ids(), ["c1-e1", "c2-e1"]);
    }

    #[test]
    fn test_self_pair_sides() {
        let item = XrefMatch::new("m1", 0.8, "c1", "a", "b");
        assert_eq!(item.sides("c1"), ("a", "b"));
    }
}
