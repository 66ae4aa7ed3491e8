// src/index.rs
//! B-tree-backed ordered index (spec §4.4).
//!
//! Keys are normalized so the B-tree's natural `Ord` matches spec's ordering
//! rule: Null sorts below everything; bools as {0,1}; numbers numerically;
//! strings lexicographically (optionally lowercased); a compound key orders
//! lexicographically over its normalized components. Range bounds are typed
//! (`Option<IndexKey>`, `None` = open) rather than sentinel strings — the
//! idiomatic equivalent of the empty-string/`"￿"` sentinels spec.md
//! describes for a string-keyed implementation.

use crate::value::{DocumentId, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}
impl Eq for OrderedFloat {}
impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal),
        }
    }
}

/// A normalized index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKey {
    Null,
    Bool(bool),
    Number(OrderedFloat),
    String(String),
    Compound(Vec<IndexKey>),
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use IndexKey::*;
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Null, _) => std::cmp::Ordering::Less,
            (_, Null) => std::cmp::Ordering::Greater,

            (Bool(a), Bool(b)) => a.cmp(b),
            (Bool(_), _) => std::cmp::Ordering::Less,
            (_, Bool(_)) => std::cmp::Ordering::Greater,

            (Number(a), Number(b)) => a.cmp(b),
            (Number(_), _) => std::cmp::Ordering::Less,
            (_, Number(_)) => std::cmp::Ordering::Greater,

            (String(a), String(b)) => a.cmp(b),
            (String(_), Compound(_)) => std::cmp::Ordering::Less,

            (Compound(a), Compound(b)) => a.cmp(b),
            (Compound(_), _) => std::cmp::Ordering::Greater,
        }
    }
}

impl IndexKey {
    /// Normalize a `Value` into an `IndexKey`. Anything that isn't Null,
    /// Bool, Number or String (i.e. Array/Object) normalizes via its
    /// canonical JSON serialization, as spec.md's "everything else" rule
    /// requires.
    pub fn from_value(value: &Value, case_insensitive: bool) -> Self {
        match value {
            Value::Null => IndexKey::Null,
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Number(n) => IndexKey::Number(OrderedFloat(*n)),
            Value::String(s) => {
                if case_insensitive {
                    IndexKey::String(s.to_lowercase())
                } else {
                    IndexKey::String(s.clone())
                }
            }
            other => IndexKey::String(other.canonical_json()),
        }
    }

    pub fn compound(keys: Vec<IndexKey>) -> Self {
        IndexKey::Compound(keys)
    }
}

/// Ordered map from normalized key to the set of document IDs sharing it,
/// with range scan support.
#[derive(Debug, Clone, Default)]
pub struct BTreeIndex {
    tree: BTreeMap<IndexKey, HashSet<DocumentId>>,
}

impl BTreeIndex {
    pub fn new() -> Self {
        BTreeIndex { tree: BTreeMap::new() }
    }

    pub fn insert(&mut self, key: IndexKey, id: DocumentId) {
        self.tree.entry(key).or_default().insert(id);
    }

    pub fn remove(&mut self, key: &IndexKey, id: &DocumentId) {
        if let Some(ids) = self.tree.get_mut(key) {
            ids.remove(id);
            if ids.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    pub fn find(&self, key: &IndexKey) -> HashSet<DocumentId> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

    /// Inclusive/exclusive range scan; `None` bound means open-ended.
    pub fn range(
        &self,
        low: Option<&IndexKey>,
        high: Option<&IndexKey>,
        inclusive_low: bool,
        inclusive_high: bool,
    ) -> HashSet<DocumentId> {
        use std::ops::Bound::*;
        let lower = match low {
            None => Unbounded,
            Some(k) if inclusive_low => Included(k.clone()),
            Some(k) => Excluded(k.clone()),
        };
        let upper = match high {
            None => Unbounded,
            Some(k) if inclusive_high => Included(k.clone()),
            Some(k) => Excluded(k.clone()),
        };
        let mut out = HashSet::new();
        for (_, ids) in self.tree.range((lower, upper)) {
            out.extend(ids.iter().cloned());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.tree.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn all_ids(&self) -> HashSet<DocumentId> {
        let mut out = HashSet::new();
        for ids in self.tree.values() {
            out.extend(ids.iter().cloned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i64) -> DocumentId {
        DocumentId::Number(n)
    }

    #[test]
    fn ordering_places_null_lowest_and_compound_highest() {
        let mut keys = vec![
            IndexKey::Compound(vec![IndexKey::Number(OrderedFloat(1.0))]),
            IndexKey::Null,
            IndexKey::String("a".into()),
            IndexKey::Bool(true),
            IndexKey::Number(OrderedFloat(1.0)),
        ];
        keys.sort();
        assert_eq!(keys[0], IndexKey::Null);
        assert!(matches!(keys.last().unwrap(), IndexKey::Compound(_)));
    }

    #[test]
    fn insert_find_remove_roundtrip() {
        let mut idx = BTreeIndex::new();
        let k = IndexKey::String("a".into());
        idx.insert(k.clone(), id(1));
        idx.insert(k.clone(), id(2));
        assert_eq!(idx.find(&k).len(), 2);
        idx.remove(&k, &id(1));
        assert_eq!(idx.find(&k), HashSet::from([id(2)]));
        idx.remove(&k, &id(2));
        assert!(idx.find(&k).is_empty());
        assert!(idx.is_empty());
    }

    #[test]
    fn range_scan_respects_inclusivity() {
        let mut idx = BTreeIndex::new();
        for n in 0..10 {
            idx.insert(IndexKey::Number(OrderedFloat(n as f64)), id(n));
        }
        let low = IndexKey::Number(OrderedFloat(3.0));
        let high = IndexKey::Number(OrderedFloat(6.0));
        let inclusive = idx.range(Some(&low), Some(&high), true, true);
        assert_eq!(inclusive.len(), 4); // 3,4,5,6
        let exclusive = idx.range(Some(&low), Some(&high), false, false);
        assert_eq!(exclusive.len(), 2); // 4,5
    }

    #[test]
    fn case_insensitive_normalization_lowercases() {
        let k1 = IndexKey::from_value(&Value::String("Alice".into()), true);
        let k2 = IndexKey::from_value(&Value::String("alice".into()), true);
        assert_eq!(k1, k2);
    }
}
