// src/index_manager.rs
//! Index kinds, the index set, and the query-plan selector (spec §4.5, §4.6).

use crate::error::{DbError, Result};
use crate::index::{BTreeIndex, IndexKey};
use crate::path;
use crate::query::Query;
use crate::value::{Document, DocumentId, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Single,
    Compound,
    Unique,
    Multi,
    Text,
}

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub sparse: bool,
    pub case_insensitive: bool,
    pub partial_filter: Option<Query>,
    pub ttl_seconds: Option<u64>,
}

/// A single secondary index.
pub struct Index {
    pub name: String,
    pub fields: Vec<String>,
    pub kind: IndexKind,
    pub options: IndexOptions,
    creation_order: u64,
    tree: BTreeIndex,
    /// UNIQUE: auxiliary key -> id map enforcing the invariant.
    unique_map: HashMap<IndexKey, DocumentId>,
    /// Reverse map (doc id -> keys it currently contributes), needed to
    /// remove multi-valued/partial entries correctly on update/delete.
    doc_keys: HashMap<DocumentId, Vec<IndexKey>>,
    /// TTL: id -> expiry instant.
    ttl_map: HashMap<DocumentId, Instant>,
}

impl Index {
    fn new(name: String, fields: Vec<String>, kind: IndexKind, options: IndexOptions, creation_order: u64) -> Self {
        Index {
            name,
            fields,
            kind,
            options,
            creation_order,
            tree: BTreeIndex::new(),
            unique_map: HashMap::new(),
            doc_keys: HashMap::new(),
            ttl_map: HashMap::new(),
        }
    }

    fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }

    /// Whether `doc` is within the partial filter (or there is none).
    fn passes_partial(&self, doc: &Document) -> bool {
        match &self.options.partial_filter {
            Some(q) => q.matches(doc),
            None => true,
        }
    }

    /// Field values of `doc` at this index's field paths, or `None` if a
    /// sparse index finds any path absent.
    fn field_values<'a>(&self, doc: &'a Document) -> Option<Vec<&'a Value>> {
        let mut values = Vec::with_capacity(self.fields.len());
        for f in &self.fields {
            match doc.get(f) {
                Some(v) => values.push(v),
                None => {
                    if self.options.sparse {
                        return None;
                    }
                    values.push(&NULL_SENTINEL);
                }
            }
        }
        Some(values)
    }

    /// Compute the set of keys this document contributes. MULTI fans out
    /// over an Array at its (single) field path; everything else yields a
    /// single compound/single key.
    fn keys_for(&self, doc: &Document) -> Option<Vec<IndexKey>> {
        let values = self.field_values(doc)?;
        if self.kind == IndexKind::Multi {
            let v = values[0];
            if let Value::Array(arr) = v {
                if arr.is_empty() && self.options.sparse {
                    return None;
                }
                return Some(
                    arr.iter()
                        .map(|e| IndexKey::from_value(e, self.options.case_insensitive))
                        .collect(),
                );
            }
            return Some(vec![IndexKey::from_value(v, self.options.case_insensitive)]);
        }
        let key = if self.is_compound() {
            IndexKey::compound(
                values.iter().map(|v| IndexKey::from_value(v, self.options.case_insensitive)).collect(),
            )
        } else {
            IndexKey::from_value(values[0], self.options.case_insensitive)
        };
        Some(vec![key])
    }

    fn insert_keys(&mut self, id: DocumentId, keys: Vec<IndexKey>) -> Result<()> {
        if self.kind == IndexKind::Unique {
            if keys.len() == 1 {
                if let Some(existing) = self.unique_map.get(&keys[0]) {
                    if existing != &id {
                        return Err(DbError::DuplicateKey {
                            index: self.name.clone(),
                            key: format!("{:?}", keys[0]),
                        });
                    }
                }
            }
        }
        for key in &keys {
            self.tree.insert(key.clone(), id.clone());
            if self.kind == IndexKind::Unique {
                self.unique_map.insert(key.clone(), id.clone());
            }
        }
        if let Some(ttl) = self.options.ttl_seconds {
            self.ttl_map.insert(id.clone(), Instant::now() + Duration::from_secs(ttl));
        }
        self.doc_keys.insert(id, keys);
        Ok(())
    }

    fn remove_keys(&mut self, id: &DocumentId) {
        if let Some(keys) = self.doc_keys.remove(id) {
            for key in &keys {
                self.tree.remove(key, id);
                if self.kind == IndexKind::Unique {
                    if self.unique_map.get(key) == Some(id) {
                        self.unique_map.remove(key);
                    }
                }
            }
        }
        self.ttl_map.remove(id);
    }

    /// Add `doc` to the index at insert time.
    pub fn on_insert(&mut self, doc: &Document) -> Result<()> {
        if !self.passes_partial(doc) {
            return Ok(());
        }
        if let Some(keys) = self.keys_for(doc) {
            self.insert_keys(doc.id.clone(), keys)?;
        }
        Ok(())
    }

    pub fn on_delete(&mut self, doc: &Document) {
        let _ = doc;
        // `id` alone is enough; caller passes the pre-delete document only
        // to keep the call symmetric with on_insert/on_update.
        self.remove_keys(&doc.id);
    }

    /// Re-evaluate a document across the partial filter's four cases
    /// (spec §4.5: was-in/will-be-in).
    pub fn on_update(&mut self, old: &Document, new: &Document) -> Result<()> {
        let was_in = self.passes_partial(old);
        let will_be_in = self.passes_partial(new);
        match (was_in, will_be_in) {
            (false, false) => Ok(()),
            (true, false) => {
                self.remove_keys(&old.id);
                Ok(())
            }
            (false, true) => {
                if let Some(keys) = self.keys_for(new) {
                    self.insert_keys(new.id.clone(), keys)?;
                }
                Ok(())
            }
            (true, true) => {
                self.remove_keys(&old.id);
                if let Some(keys) = self.keys_for(new) {
                    self.insert_keys(new.id.clone(), keys)?;
                }
                Ok(())
            }
        }
    }

    pub fn clear(&mut self) {
        self.tree.clear();
        self.unique_map.clear();
        self.doc_keys.clear();
        self.ttl_map.clear();
    }

    pub fn find_equal(&self, values: &[&Value]) -> HashSet<DocumentId> {
        let key = if values.len() > 1 {
            IndexKey::compound(values.iter().map(|v| IndexKey::from_value(v, self.options.case_insensitive)).collect())
        } else {
            IndexKey::from_value(values[0], self.options.case_insensitive)
        };
        self.tree.find(&key)
    }

    pub fn range(&self, low: Option<&Value>, high: Option<&Value>, incl_low: bool, incl_high: bool) -> HashSet<DocumentId> {
        let low_key = low.map(|v| IndexKey::from_value(v, self.options.case_insensitive));
        let high_key = high.map(|v| IndexKey::from_value(v, self.options.case_insensitive));
        self.tree.range(low_key.as_ref(), high_key.as_ref(), incl_low, incl_high)
    }

    pub fn all_ids(&self) -> HashSet<DocumentId> {
        self.tree.all_ids()
    }

    /// IDs whose TTL has expired as of now.
    pub fn expired_ids(&self) -> Vec<DocumentId> {
        let now = Instant::now();
        self.ttl_map
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn key_count(&self) -> usize {
        self.tree.key_count()
    }
}

lazy_static::lazy_static! {
    static ref NULL_SENTINEL: Value = Value::Null;
}

/// Which index (if any) the planner picked, plus the candidate set it needs
/// re-filtering (spec §4.6: "the manager always re-filters").
pub enum QueryPlan {
    IndexScan { index_name: String, candidates: HashSet<DocumentId> },
    FullScan,
}

#[derive(Debug, Clone)]
enum FieldPredicate {
    Eq(Value),
    Range { gt: Option<Value>, gte: Option<Value>, lt: Option<Value>, lte: Option<Value> },
    In(Vec<Value>),
    Other,
}

fn collect_field_predicates(query: &Value) -> HashMap<String, FieldPredicate> {
    let mut out = HashMap::new();
    collect_into(query, &mut out);
    out
}

/// A partial index is only safe to consult when every document matching
/// `query` is provably also inside the partial filter — otherwise its
/// candidate set silently excludes matching-but-outside-the-filter
/// documents (spec §4.6 forbids errors of exclusion). Conservative: only
/// recognizes filters that are a conjunction of field equalities, and only
/// treats implication as proven when the query pins each such field to the
/// identical literal.
fn query_implies_filter(query_predicates: &HashMap<String, FieldPredicate>, filter: &Value) -> bool {
    let filter_predicates = collect_field_predicates(filter);
    if filter_predicates.is_empty() {
        return false;
    }
    filter_predicates.iter().all(|(field, pred)| {
        let required = match pred {
            FieldPredicate::Eq(v) => v,
            _ => return false,
        };
        matches!(query_predicates.get(field), Some(FieldPredicate::Eq(v)) if v == required)
    })
}

fn collect_into(query: &Value, out: &mut HashMap<String, FieldPredicate>) {
    let obj = match query.as_object() {
        Some(o) => o,
        None => return,
    };
    for (key, value) in obj {
        if key == "$and" {
            if let Value::Array(clauses) = value {
                for clause in clauses {
                    collect_into(clause, out);
                }
            }
            continue;
        }
        if key.starts_with('$') {
            continue; // $or/$not aren't index-safe conjunctions
        }
        let predicate = match value {
            Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
                if let Some(eq) = ops.get("$eq") {
                    FieldPredicate::Eq(eq.clone())
                } else if let Some(Value::Array(vals)) = ops.get("$in") {
                    FieldPredicate::In(vals.clone())
                } else if ops.keys().any(|k| matches!(k.as_str(), "$gt" | "$gte" | "$lt" | "$lte")) {
                    FieldPredicate::Range {
                        gt: ops.get("$gt").cloned(),
                        gte: ops.get("$gte").cloned(),
                        lt: ops.get("$lt").cloned(),
                        lte: ops.get("$lte").cloned(),
                    }
                } else {
                    FieldPredicate::Other
                }
            }
            literal => FieldPredicate::Eq(literal.clone()),
        };
        out.insert(key.clone(), predicate);
    }
}

/// The set of indexes on a Collection, plus the planner and the opt-in
/// self-tuning advisor (spec §4.6 last paragraph).
#[derive(Default)]
pub struct IndexManager {
    indexes: Vec<Index>,
    next_order: u64,
    recent_queries: VecDeque<Value>,
    max_recent: usize,
}

impl IndexManager {
    pub fn new() -> Self {
        IndexManager { indexes: Vec::new(), next_order: 0, recent_queries: VecDeque::new(), max_recent: 50 }
    }

    pub fn create_index(
        &mut self,
        name: String,
        fields: Vec<String>,
        kind: IndexKind,
        options: IndexOptions,
    ) -> Result<()> {
        if fields.is_empty() {
            return Err(DbError::InvalidArgument("index must have at least one field".into()));
        }
        if self.indexes.iter().any(|i| i.name == name) {
            return Err(DbError::InvalidArgument(format!("index '{}' already exists", name)));
        }
        let order = self.next_order;
        self.next_order += 1;
        self.indexes.push(Index::new(name, fields, kind, options, order));
        Ok(())
    }

    pub fn drop_index(&mut self, name: &str) -> Result<()> {
        let before = self.indexes.len();
        self.indexes.retain(|i| i.name != name);
        if self.indexes.len() == before {
            return Err(DbError::NotFound(format!("index '{}'", name)));
        }
        Ok(())
    }

    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn list_indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.iter()
    }

    pub fn on_insert(&mut self, doc: &Document) -> Result<()> {
        // Unique violations must leave every index untouched (rolled back).
        for idx in &self.indexes {
            if idx.kind == IndexKind::Unique && idx.passes_partial(doc) {
                if let Some(keys) = idx.keys_for(doc) {
                    if keys.len() == 1 {
                        if let Some(existing) = idx.unique_map.get(&keys[0]) {
                            if existing != &doc.id {
                                return Err(DbError::DuplicateKey {
                                    index: idx.name.clone(),
                                    key: format!("{:?}", keys[0]),
                                });
                            }
                        }
                    }
                }
            }
        }
        for idx in &mut self.indexes {
            idx.on_insert(doc)?;
        }
        Ok(())
    }

    pub fn on_delete(&mut self, doc: &Document) {
        for idx in &mut self.indexes {
            idx.on_delete(doc);
        }
    }

    pub fn on_update(&mut self, old: &Document, new: &Document) -> Result<()> {
        for idx in &self.indexes {
            if idx.kind == IndexKind::Unique {
                if idx.passes_partial(new) {
                    if let Some(keys) = idx.keys_for(new) {
                        if keys.len() == 1 {
                            if let Some(existing) = idx.unique_map.get(&keys[0]) {
                                if existing != &new.id {
                                    return Err(DbError::DuplicateKey {
                                        index: idx.name.clone(),
                                        key: format!("{:?}", keys[0]),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        for idx in &mut self.indexes {
            idx.on_update(old, new)?;
        }
        Ok(())
    }

    pub fn rebuild_all(&mut self, docs: &[Document]) -> Result<()> {
        for idx in &mut self.indexes {
            idx.clear();
        }
        for doc in docs {
            self.on_insert(doc)?;
        }
        Ok(())
    }

    pub fn expired_ids(&self) -> Vec<(String, DocumentId)> {
        let mut out = Vec::new();
        for idx in &self.indexes {
            for id in idx.expired_ids() {
                out.push((idx.name.clone(), id));
            }
        }
        out
    }

    /// Select at most one index per the scoring rules of spec §4.6.
    pub fn select_plan(&self, query: &Value) -> QueryPlan {
        let predicates = collect_field_predicates(query);
        if predicates.is_empty() {
            return QueryPlan::FullScan;
        }

        let mut best: Option<(f64, u64, &Index, HashSet<DocumentId>)> = None;

        for idx in &self.indexes {
            if let Some(filter) = &idx.options.partial_filter {
                if !query_implies_filter(&predicates, filter.filter()) {
                    continue;
                }
            }

            let leading = &idx.fields[0];
            let leading_pred = predicates.get(leading);

            let (weight, candidates) = if idx.fields.iter().all(|f| matches!(predicates.get(f), Some(FieldPredicate::Eq(_)))) {
                // Rule 1: compound exact match (also covers single-field exact match on a 1-field index).
                let values: Vec<Value> = idx
                    .fields
                    .iter()
                    .map(|f| match predicates.get(f) {
                        Some(FieldPredicate::Eq(v)) => v.clone(),
                        _ => unreachable!(),
                    })
                    .collect();
                let refs: Vec<&Value> = values.iter().collect();
                let weight = if idx.fields.len() == 1 { 1.5 } else { 2.0 };
                (weight, idx.find_equal(&refs))
            } else if idx.fields.len() == 1 {
                match leading_pred {
                    Some(FieldPredicate::Eq(v)) => (1.5, idx.find_equal(&[v])),
                    Some(FieldPredicate::Range { gt, gte, lt, lte }) => {
                        let low = gte.as_ref().or(gt.as_ref());
                        let high = lte.as_ref().or(lt.as_ref());
                        let incl_low = gte.is_some();
                        let incl_high = lte.is_some();
                        (1.0, idx.range(low, high, incl_low, incl_high))
                    }
                    Some(FieldPredicate::In(values)) => {
                        let mut set = HashSet::new();
                        for v in values {
                            set.extend(idx.find_equal(&[v]));
                        }
                        (1.0, set)
                    }
                    Some(FieldPredicate::Other) => (1.0, idx.all_ids()),
                    None => continue,
                }
            } else if leading_pred.is_some() {
                // Rule 3 for compound indexes: leading field participates,
                // but we can't safely prefix-scan a heterogeneous compound
                // key here, so over-include (safe per spec §4.6).
                (1.0, idx.all_ids())
            } else {
                continue;
            };

            let selectivity = 1.0 / (candidates.len() as f64 + 1.0);
            let score = weight * selectivity;
            let better = match &best {
                None => true,
                Some((best_score, best_order, _, _)) => {
                    score > *best_score || (score == *best_score && idx.creation_order < *best_order)
                }
            };
            if better {
                best = Some((score, idx.creation_order, idx, candidates));
            }
        }

        match best {
            Some((_, _, idx, candidates)) => QueryPlan::IndexScan { index_name: idx.name.clone(), candidates },
            None => QueryPlan::FullScan,
        }
    }

    pub fn observe_query(&mut self, query: &Value) {
        self.recent_queries.push_back(query.clone());
        if self.recent_queries.len() > self.max_recent {
            self.recent_queries.pop_front();
        }
    }

    /// A field appearing in >= 3 of the last N (>=10) queries earns a
    /// default SINGLE suggestion; a field-combination in >= 2 earns a
    /// COMPOUND suggestion (spec §4.6).
    pub fn suggest_indexes(&self) -> Vec<IndexSuggestion> {
        if self.recent_queries.len() < 10 {
            return Vec::new();
        }
        let mut field_counts: HashMap<String, usize> = HashMap::new();
        let mut combo_counts: HashMap<Vec<String>, usize> = HashMap::new();
        for q in &self.recent_queries {
            let preds = collect_field_predicates(q);
            let mut fields: Vec<String> = preds.keys().cloned().collect();
            fields.sort();
            for f in &fields {
                *field_counts.entry(f.clone()).or_insert(0) += 1;
            }
            if fields.len() > 1 {
                *combo_counts.entry(fields).or_insert(0) += 1;
            }
        }
        let mut out = Vec::new();
        for (field, count) in field_counts {
            if count >= 3 {
                out.push(IndexSuggestion::Single(field));
            }
        }
        for (fields, count) in combo_counts {
            if count >= 2 {
                out.push(IndexSuggestion::Compound(fields));
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSuggestion {
    Single(String),
    Compound(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn doc(id: i64, fields: serde_json::Value) -> Document {
        let map = match Value::from_json(&fields) {
            Value::Object(o) => o,
            _ => IndexMap::new(),
        };
        Document::new(DocumentId::Number(id), map)
    }

    #[test]
    fn unique_index_rejects_duplicate_then_leaves_state_untouched() {
        let mut mgr = IndexManager::new();
        mgr.create_index("email_idx".into(), vec!["email".into()], IndexKind::Unique, IndexOptions::default()).unwrap();
        let d1 = doc(1, json!({"email": "a@x"}));
        mgr.on_insert(&d1).unwrap();
        let d2 = doc(2, json!({"email": "a@x"}));
        let err = mgr.on_insert(&d2);
        assert!(err.is_err());
        let idx = mgr.get_index("email_idx").unwrap();
        assert_eq!(idx.key_count(), 1);
    }

    #[test]
    fn compound_exact_match_scores_higher_than_full_scan() {
        let mut mgr = IndexManager::new();
        mgr.create_index(
            "cat_stock".into(),
            vec!["category".into(), "inStock".into()],
            IndexKind::Compound,
            IndexOptions::default(),
        )
        .unwrap();
        for i in 0..10 {
            let cat = ["A", "B", "C"][i % 3];
            let in_stock = i % 2 == 0;
            mgr.on_insert(&doc(i as i64, json!({"category": cat, "inStock": in_stock}))).unwrap();
        }
        let query = Value::from_json(&json!({"category": "B", "inStock": true}));
        match mgr.select_plan(&query) {
            QueryPlan::IndexScan { index_name, candidates } => {
                assert_eq!(index_name, "cat_stock");
                for id in &candidates {
                    let n = match id {
                        DocumentId::Number(n) => *n,
                        _ => unreachable!(),
                    };
                    assert_eq!(["A", "B", "C"][n as usize % 3], "B");
                    assert!(n % 2 == 0);
                }
            }
            QueryPlan::FullScan => panic!("expected compound index to be selected"),
        }
    }

    #[test]
    fn partial_index_tracks_four_transition_cases() {
        let mut mgr = IndexManager::new();
        let active_filter = Query::from_value(Value::from_json(&json!({"active": true})));
        mgr.create_index(
            "active_last".into(),
            vec!["lastActive".into()],
            IndexKind::Single,
            IndexOptions { partial_filter: Some(active_filter), ..Default::default() },
        )
        .unwrap();

        let d1 = doc(1, json!({"lastActive": 10, "active": true}));
        let d2 = doc(2, json!({"lastActive": 20, "active": true}));
        let d3 = doc(3, json!({"lastActive": 30, "active": false}));
        mgr.on_insert(&d1).unwrap();
        mgr.on_insert(&d2).unwrap();
        mgr.on_insert(&d3).unwrap();
        assert_eq!(mgr.get_index("active_last").unwrap().key_count(), 2);

        let d2_off = doc(2, json!({"lastActive": 20, "active": false}));
        mgr.on_update(&d2, &d2_off).unwrap();
        assert_eq!(mgr.get_index("active_last").unwrap().key_count(), 1);

        let d3_on = doc(3, json!({"lastActive": 30, "active": true}));
        mgr.on_update(&d3, &d3_on).unwrap();
        assert_eq!(mgr.get_index("active_last").unwrap().key_count(), 2);
    }

    #[test]
    fn partial_index_is_not_consulted_for_a_query_that_does_not_imply_its_filter() {
        let mut mgr = IndexManager::new();
        let active_filter = Query::from_value(Value::from_json(&json!({"active": true})));
        mgr.create_index(
            "active_last".into(),
            vec!["lastActive".into()],
            IndexKind::Single,
            IndexOptions { partial_filter: Some(active_filter), ..Default::default() },
        )
        .unwrap();
        mgr.on_insert(&doc(1, json!({"lastActive": 10, "active": false}))).unwrap();

        // The document is outside the partial filter, so it has no entry in
        // the index. A query that doesn't also pin `active: true` must not
        // select this index, or the document would be silently excluded.
        let query = Value::from_json(&json!({"lastActive": 10}));
        assert!(matches!(mgr.select_plan(&query), QueryPlan::FullScan));

        // Pinning the same literal the partial filter requires makes the
        // index safe to use again.
        let entailed_query = Value::from_json(&json!({"lastActive": 10, "active": true}));
        assert!(matches!(mgr.select_plan(&entailed_query), QueryPlan::IndexScan { .. }));
    }

    #[test]
    fn sparse_index_skips_documents_missing_the_field() {
        let mut mgr = IndexManager::new();
        mgr.create_index(
            "sparse_phone".into(),
            vec!["phone".into()],
            IndexKind::Single,
            IndexOptions { sparse: true, ..Default::default() },
        )
        .unwrap();
        mgr.on_insert(&doc(1, json!({"phone": "555"}))).unwrap();
        mgr.on_insert(&doc(2, json!({"name": "no phone"}))).unwrap();
        assert_eq!(mgr.get_index("sparse_phone").unwrap().key_count(), 1);
    }

    #[test]
    fn multi_valued_index_fans_out_over_array_elements() {
        let mut mgr = IndexManager::new();
        mgr.create_index("tags_idx".into(), vec!["tags".into()], IndexKind::Multi, IndexOptions::default()).unwrap();
        mgr.on_insert(&doc(1, json!({"tags": ["a", "b"]}))).unwrap();
        let idx = mgr.get_index("tags_idx").unwrap();
        assert_eq!(idx.find_equal(&[&Value::String("a".into())]).len(), 1);
        assert_eq!(idx.find_equal(&[&Value::String("b".into())]).len(), 1);
    }

    #[test]
    fn self_tuning_advisor_requires_minimum_observations() {
        let mut mgr = IndexManager::new();
        for _ in 0..2 {
            mgr.observe_query(&Value::from_json(&json!({"age": 10})));
        }
        assert!(mgr.suggest_indexes().is_empty()); // fewer than 10 recent queries

        for _ in 0..10 {
            mgr.observe_query(&Value::from_json(&json!({"age": 10})));
        }
        let suggestions = mgr.suggest_indexes();
        assert!(suggestions.contains(&IndexSuggestion::Single("age".to_string())));
    }

    #[test]
    fn rebuild_clears_and_replays_from_document_set() {
        let mut mgr = IndexManager::new();
        mgr.create_index("name_idx".into(), vec!["name".into()], IndexKind::Single, IndexOptions::default()).unwrap();
        let docs = vec![doc(1, json!({"name": "Alice"})), doc(2, json!({"name": "Bob"}))];
        mgr.rebuild_all(&docs).unwrap();
        assert_eq!(mgr.get_index("name_idx").unwrap().key_count(), 2);
        mgr.rebuild_all(&docs[..1]).unwrap();
        assert_eq!(mgr.get_index("name_idx").unwrap().key_count(), 1);
    }
}
