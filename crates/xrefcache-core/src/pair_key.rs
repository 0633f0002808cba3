//! Order-independent keys for two-sided lookups.
//!
//! Matches between collection A and collection B are the same result set
//! whichever side the user navigated from, so both directions address one
//! shared page.

use std::fmt;

use serde::Serialize;

/// Separator between the two anchors. API identifiers never contain
/// control characters.
pub const PAIR_SEPARATOR: char = '\u{1f}';

/// Symmetric composite key of two identifiers.
///
/// `PairKey::derive(a, b) == PairKey::derive(b, a)` for all `a`, `b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey(String);

impl PairKey {
    /// Derive the key for a pair of identifiers.
    ///
    /// The anchors are sorted lexicographically and joined with
    /// [`PAIR_SEPARATOR`]. A self-pair (`a == b`) is a valid key.
    pub fn derive(a: &str, b: &str) -> Self {
        debug_assert!(
            !a.contains(PAIR_SEPARATOR) && !b.contains(PAIR_SEPARATOR),
            "identifiers must not contain the pair separator"
        );
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let mut key = String::with_capacity(low.len() + high.len() + PAIR_SEPARATOR.len_utf8());
        key.push_str(low);
        key.push(PAIR_SEPARATOR);
        key.push_str(high);
        Self(key)
    }

    /// The two anchors in sorted order.
    pub fn anchors(&self) -> (&str, &str) {
        self.0
            .split_once(PAIR_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }

    /// Whether `id` is one of the anchors.
    pub fn contains(&self, id: &str) -> bool {
        let (low, high) = self.anchors();
        low == id || high == id
    }

    /// The anchor opposite to `id`, if `id` is part of the pair.
    pub fn other(&self, id: &str) -> Option<&str> {
        match self.anchors() {
            (low, high) if low == id => Some(high),
            (low, high) if high == id => Some(low),
            _ => None,
        }
    }

    /// Whether both anchors are the same identifier.
    pub fn is_self_pair(&self) -> bool {
        let (low, high) = self.anchors();
        low == high
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (low, high) = self.anchors();
        write!(f, "{}<->{}", low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric() {
        let pairs = [("c1", "c2"), ("7", "12"), ("abc", "ab"), ("", "x"), ("é", "e")];
        for (a, b) in pairs {
            assert_eq!(PairKey::derive(a, b), PairKey::derive(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn test_distinct_counterparts() {
        let ids = ["c1", "c2", "c3", "c10", "c1c", "", "1", "12"];
        for a in ids {
            for b in ids {
                for c in ids {
                    if b != c {
                        assert_ne!(
                            PairKey::derive(a, b),
                            PairKey::derive(a, c),
                            "({a},{b}) vs ({a},{c})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_concatenation_is_not_ambiguous() {
        // "a" + "bc" and "ab" + "c" would collide without a separator
        assert_ne!(PairKey::derive("a", "bc"), PairKey::derive("ab", "c"));
    }

    #[test]
    fn test_self_pair() {
        let key = PairKey::derive("c1", "c1");
        assert!(key.is_self_pair());
        assert_eq!(key.anchors(), ("c1", "c1"));
        assert_eq!(key.other("c1"), Some("c1"));
    }

    #[test]
    fn test_anchors_sorted() {
        let key = PairKey::derive("zeta", "alpha");
        assert_eq!(key.anchors(), ("alpha", "zeta"));
        assert!(key.contains("zeta"));
        assert!(!key.contains("beta"));
        assert_eq!(key.other("alpha"), Some("zeta"));
        assert_eq!(key.other("beta"), None);
        assert_eq!(key.to_string(), "alpha<->zeta");
    }
}
