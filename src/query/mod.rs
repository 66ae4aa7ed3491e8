// src/query/mod.rs
//! MongoDB-style query language (spec §3, §4.2).

pub mod operators;

use crate::error::Result;
use crate::value::{Document, Value};

/// A query filter, stored as the JSON-like `Value` it was built from. All
/// matching logic lives in `operators::matches`.
#[derive(Debug, Clone)]
pub struct Query {
    filter: Value,
}

impl Query {
    pub fn new() -> Self {
        Query { filter: Value::Object(Default::default()) }
    }

    pub fn from_value(filter: Value) -> Self {
        Query { filter }
    }

    /// `matches(doc, query) -> bool`. Invalid operators make the predicate
    /// false rather than raising (spec §7: "shape mismatches are predicate
    /// false, not errors").
    pub fn matches(&self, doc: &Document) -> bool {
        operators::matches(doc, &self.filter).unwrap_or(false)
    }

    /// Same as `matches` but surfaces the error (used by callers that want
    /// to distinguish "query couldn't be evaluated" from "didn't match",
    /// e.g. for `explain`).
    pub fn try_matches(&self, doc: &Document) -> Result<bool> {
        operators::matches(doc, &self.filter)
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.filter, Value::Object(o) if o.is_empty())
    }

    pub fn filter(&self) -> &Value {
        &self.filter
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use crate::value::DocumentId;

    fn doc(fields: Vec<(&str, Value)>) -> Document {
        let map: IndexMap<String, Value> =
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        Document::new(DocumentId::Number(1), map)
    }

    #[test]
    fn empty_query_matches_all() {
        let q = Query::new();
        assert!(q.is_empty());
        assert!(q.matches(&doc(vec![("a", Value::Number(1.0))])));
    }

    #[test]
    fn literal_equality_field_predicate() {
        let q = Query::from_value(Value::from_json(&serde_json::json!({"name": "Alice"})));
        assert!(q.matches(&doc(vec![("name", Value::String("Alice".into()))])));
        assert!(!q.matches(&doc(vec![("name", Value::String("Bob".into()))])));
    }
}
