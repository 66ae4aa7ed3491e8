// src/collection.rs
//! A named, ordered set of Documents plus its indexes, cache and policy
//! bundle (spec §3, §4.11). Every mutation is serialized by the
//! collection's writer-priority rw-lock; queries may run concurrently with
//! each other but never with a mutation.

use crate::compression;
use crate::config::CollectionConfig;
use crate::concurrency::RwLock;
use crate::error::{DbError, Result};
use crate::index::IndexKey;
use crate::index_manager::{IndexKind, IndexManager, IndexOptions, IndexSuggestion, QueryPlan};
use crate::query::Query;
use crate::query_cache::{QueryCache, QueryHash};
use crate::throttle::AdaptiveThrottle;
use crate::update;
use crate::value::{Document, DocumentId, Value};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Sort direction for a `FindOptions` sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Pagination/ordering controls layered on top of a filter (teacher's
/// `find_options.rs`, generalized to this crate's `Value`/`Query` types).
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub sort: Vec<(String, SortDirection)>,
}

/// What the planner chose for a given `find`, for observability (spec §8's
/// S2 scenario requires this to be checkable without peeking at internals).
#[derive(Debug, Clone)]
pub struct ExplainResult {
    pub index_name: Option<String>,
    pub candidate_count: usize,
    pub full_scan: bool,
}

struct CollectionState {
    documents: IndexMap<DocumentId, Document>,
    indexes: IndexManager,
}

/// A single change notification: the subscription's query re-evaluated
/// against the post-mutation document set.
pub struct ChangeEvent {
    pub matching: Vec<Document>,
}

struct SubscriptionEntry {
    id: u64,
    query: Query,
    callback: Box<dyn Fn(&ChangeEvent) + Send + Sync>,
}

/// An unsubscribe handle returned by `Collection::subscribe`.
pub struct Subscription {
    id: u64,
}

pub struct Collection {
    name: String,
    config: CollectionConfig,
    state: RwLock<CollectionState>,
    cache: QueryCache,
    subscriptions: Mutex<Vec<SubscriptionEntry>>,
    next_sub_id: AtomicU64,
    throttle: Mutex<AdaptiveThrottle>,
    index_scans: AtomicUsize,
    full_scans: AtomicUsize,
}

impl Collection {
    pub fn new(name: impl Into<String>, config: CollectionConfig) -> Self {
        let cache = QueryCache::new(config.cache.capacity, config.cache.ttl);
        let throttle = AdaptiveThrottle::new(&config.concurrency);
        Collection {
            name: name.into(),
            config,
            state: RwLock::new(CollectionState { documents: IndexMap::new(), indexes: IndexManager::new() }),
            cache,
            subscriptions: Mutex::new(Vec::new()),
            next_sub_id: AtomicU64::new(0),
            throttle: Mutex::new(throttle),
            index_scans: AtomicUsize::new(0),
            full_scans: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -- CRUD -----------------------------------------------------------

    pub fn insert(&self, value: Value) -> Result<Document> {
        let start = Instant::now();
        let obj = match value {
            Value::Object(o) => o,
            _ => return Err(DbError::InvalidArgument("insert requires a document object".into())),
        };
        let result = self.insert_one_locked(obj);
        self.record_latency(start);
        let doc = result?;
        self.cache.invalidate_all();
        self.fire_change_signal();
        Ok(doc)
    }

    pub fn insert_batch(&self, values: Vec<Value>) -> Result<Vec<Document>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(values.len());
        {
            let mut state = self.state.write();
            for value in values {
                let obj = match value {
                    Value::Object(o) => o,
                    _ => return Err(DbError::InvalidArgument("insert requires a document object".into())),
                };
                out.push(Self::insert_one(&mut state, &self.config, obj)?);
            }
        }
        self.record_latency(start);
        self.cache.invalidate_all();
        self.fire_change_signal();
        Ok(out)
    }

    fn insert_one_locked(&self, obj: IndexMap<String, Value>) -> Result<Document> {
        let mut state = self.state.write();
        Self::insert_one(&mut state, &self.config, obj)
    }

    fn insert_one(state: &mut CollectionState, config: &CollectionConfig, obj: IndexMap<String, Value>) -> Result<Document> {
        let id = match obj.get("id") {
            Some(Value::String(s)) => DocumentId::String(s.clone()),
            Some(Value::Number(n)) => DocumentId::Number(*n as i64),
            Some(_) => return Err(DbError::InvalidArgument("id must be a string or number".into())),
            None => DocumentId::generate(),
        };
        if state.documents.contains_key(&id) {
            return Err(DbError::DuplicateKey { index: "_id_".into(), key: id.to_string() });
        }
        let mut fields = obj;
        fields.shift_remove("id");
        let mut doc = Document::new(id.clone(), fields);

        state.indexes.on_insert(&doc)?;
        compression::compress(&mut doc, &config.compression);
        state.documents.insert(id, doc.clone());
        Ok(doc)
    }

    pub fn find(&self, query: &Query, options: &FindOptions) -> Result<Vec<Document>> {
        let start = Instant::now();
        let hash = QueryHash::new(query.filter());
        let cacheable = !query.is_empty();

        if cacheable {
            if let Some(ids) = self.cache.get(&hash) {
                let state = self.state.read();
                let docs: Vec<Document> = ids.iter().filter_map(|id| state.documents.get(id).cloned()).collect();
                self.record_latency(start);
                return Ok(Self::apply_options(docs, options));
            }
        }

        let state = self.state.read();
        let plan = state.indexes.select_plan(query.filter());
        let candidates: Vec<Document> = match &plan {
            QueryPlan::IndexScan { candidates, .. } => {
                self.index_scans.fetch_add(1, Ordering::Relaxed);
                candidates.iter().filter_map(|id| state.documents.get(id).cloned()).collect()
            }
            QueryPlan::FullScan => {
                self.full_scans.fetch_add(1, Ordering::Relaxed);
                state.documents.values().cloned().collect()
            }
        };
        let matched: Vec<Document> = candidates.into_iter().filter(|d| query.matches(d)).collect();
        drop(state);

        if cacheable {
            self.cache.insert(hash, matched.iter().map(|d| d.id.clone()).collect());
        }
        self.record_latency(start);
        Ok(Self::apply_options(matched, options))
    }

    pub fn find_one(&self, query: &Query) -> Result<Option<Document>> {
        let mut opts = FindOptions::default();
        opts.limit = Some(1);
        Ok(self.find(query, &opts)?.into_iter().next())
    }

    fn apply_options(mut docs: Vec<Document>, options: &FindOptions) -> Vec<Document> {
        for (path, dir) in options.sort.iter().rev() {
            docs.sort_by(|a, b| {
                let av = a.get(path);
                let bv = b.get(path);
                let ord = crate::path::compare_values(av.unwrap_or(&Value::Null), bv.unwrap_or(&Value::Null))
                    .unwrap_or(std::cmp::Ordering::Equal);
                match dir {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        let skip = options.skip.unwrap_or(0);
        let docs: Vec<Document> = docs.into_iter().skip(skip).collect();
        match options.limit {
            Some(n) => docs.into_iter().take(n).collect(),
            None => docs,
        }
    }

    pub fn update(&self, query: &Query, update_doc: &Value) -> Result<usize> {
        let start = Instant::now();
        let count = {
            let mut state = self.state.write();
            Self::update_locked(&mut state, query, update_doc)?
        };
        self.record_latency(start);
        if count > 0 {
            self.cache.invalidate_all();
            self.fire_change_signal();
        }
        Ok(count)
    }

    /// Undoes a prefix of already-applied `(id, old, new)` updates in
    /// reverse order, restoring both `documents` and every index to their
    /// exact pre-call state. `on_update`'s own unique pre-check means each
    /// step here only ever reverses to a configuration that was valid a
    /// moment ago, so it cannot itself fail.
    fn rollback(state: &mut CollectionState, applied: &[(DocumentId, Document, Document)]) {
        for (id, old, new) in applied.iter().rev() {
            state.indexes.on_update(new, old).expect("reverting a previously-applied update must not fail");
            state.documents.insert(id.clone(), old.clone());
        }
    }

    /// Applies `update_doc` to every document matching `query`. All-or-
    /// nothing within the single write-lock acquisition held by the
    /// caller: if any document in the matching set fails to update (e.g. a
    /// UNIQUE violation), every document touched so far in this call is
    /// rolled back before returning the error (spec §7).
    fn update_locked(state: &mut CollectionState, query: &Query, update_doc: &Value) -> Result<usize> {
        let ids: Vec<DocumentId> =
            state.documents.iter().filter(|(_, d)| query.matches(d)).map(|(id, _)| id.clone()).collect();
        let mut applied: Vec<(DocumentId, Document, Document)> = Vec::with_capacity(ids.len());
        for id in ids {
            let old = state.documents.get(&id).cloned().expect("id came from the same snapshot");
            let new = match update::apply(&old, update_doc) {
                Ok(new) => new,
                Err(e) => {
                    Self::rollback(state, &applied);
                    return Err(e);
                }
            };
            if let Err(e) = state.indexes.on_update(&old, &new) {
                Self::rollback(state, &applied);
                return Err(e);
            }
            state.documents.insert(id.clone(), new.clone());
            applied.push((id, old, new));
        }
        Ok(applied.len())
    }

    /// One write-lock acquisition, one change-signal fire; each
    /// `(query, update)` pair is applied in order, skipping documents an
    /// earlier pair already updated. Any failure anywhere in the batch
    /// rolls back every document the batch touched so far, leaving the
    /// Collection in its pre-call state (spec §7).
    pub fn update_batch(&self, pairs: Vec<(Query, Value)>) -> Result<usize> {
        let start = Instant::now();
        let result = {
            let mut state = self.state.write();
            let mut already_updated = std::collections::HashSet::new();
            let mut applied: Vec<(DocumentId, Document, Document)> = Vec::new();
            let mut failure = None;
            'pairs: for (query, update_doc) in pairs {
                let ids: Vec<DocumentId> = state
                    .documents
                    .iter()
                    .filter(|(id, d)| !already_updated.contains(*id) && query.matches(d))
                    .map(|(id, _)| id.clone())
                    .collect();
                for id in ids {
                    let old = state.documents.get(&id).cloned().expect("id came from the same snapshot");
                    let new = match update::apply(&old, &update_doc) {
                        Ok(new) => new,
                        Err(e) => {
                            failure = Some(e);
                            break 'pairs;
                        }
                    };
                    if let Err(e) = state.indexes.on_update(&old, &new) {
                        failure = Some(e);
                        break 'pairs;
                    }
                    state.documents.insert(id.clone(), new.clone());
                    already_updated.insert(id.clone());
                    applied.push((id, old, new));
                }
            }
            match failure {
                Some(e) => {
                    Self::rollback(&mut state, &applied);
                    Err(e)
                }
                None => Ok(applied.len()),
            }
        };
        self.record_latency(start);
        let total = *result.as_ref().unwrap_or(&0);
        if total > 0 {
            self.cache.invalidate_all();
            self.fire_change_signal();
        }
        result
    }

    pub fn delete(&self, query: &Query) -> Result<usize> {
        let start = Instant::now();
        let count = {
            let mut state = self.state.write();
            let ids: Vec<DocumentId> =
                state.documents.iter().filter(|(_, d)| query.matches(d)).map(|(id, _)| id.clone()).collect();
            for id in &ids {
                if let Some(doc) = state.documents.shift_remove(id) {
                    state.indexes.on_delete(&doc);
                }
            }
            ids.len()
        };
        self.record_latency(start);
        if count > 0 {
            self.cache.invalidate_all();
            self.fire_change_signal();
        }
        Ok(count)
    }

    pub fn delete_batch(&self, queries: Vec<Query>) -> Result<usize> {
        let start = Instant::now();
        let mut total = 0;
        {
            let mut state = self.state.write();
            for query in queries {
                let ids: Vec<DocumentId> =
                    state.documents.iter().filter(|(_, d)| query.matches(d)).map(|(id, _)| id.clone()).collect();
                for id in &ids {
                    if let Some(doc) = state.documents.shift_remove(id) {
                        state.indexes.on_delete(&doc);
                    }
                }
                total += ids.len();
            }
        }
        self.record_latency(start);
        if total > 0 {
            self.cache.invalidate_all();
            self.fire_change_signal();
        }
        Ok(total)
    }

    // -- Reads that never touch the mutation path -----------------------

    pub fn distinct(&self, field: &str, query: &Query) -> Vec<Value> {
        let state = self.state.read();
        let mut seen = Vec::new();
        for doc in state.documents.values() {
            if !query.matches(doc) {
                continue;
            }
            if let Some(v) = doc.get(field) {
                if !seen.iter().any(|existing: &Value| existing == v) {
                    seen.push(v.clone());
                }
            }
        }
        seen
    }

    pub fn explain(&self, query: &Query) -> ExplainResult {
        let state = self.state.read();
        match state.indexes.select_plan(query.filter()) {
            QueryPlan::IndexScan { index_name, candidates } => {
                ExplainResult { index_name: Some(index_name), candidate_count: candidates.len(), full_scan: false }
            }
            QueryPlan::FullScan => {
                ExplainResult { index_name: None, candidate_count: state.documents.len(), full_scan: true }
            }
        }
    }

    pub fn index_scan_count(&self) -> usize {
        self.index_scans.load(Ordering::Relaxed)
    }

    pub fn full_scan_count(&self) -> usize {
        self.full_scans.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Index lifecycle --------------------------------------------------

    pub fn create_index(&self, name: impl Into<String>, fields: Vec<String>, kind: IndexKind, options: IndexOptions) -> Result<()> {
        let mut state = self.state.write();
        state.indexes.create_index(name.into(), fields, kind, options)?;
        let docs: Vec<Document> = state.documents.values().cloned().collect();
        state.indexes.rebuild_all(&docs)?;
        drop(state);
        self.cache.invalidate_all();
        Ok(())
    }

    pub fn drop_index(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        state.indexes.drop_index(name)?;
        drop(state);
        self.cache.invalidate_all();
        Ok(())
    }

    pub fn list_index_names(&self) -> Vec<String> {
        self.state.read().indexes.list_indexes().map(|i| i.name.clone()).collect()
    }

    pub fn rebuild_indexes(&self) -> Result<()> {
        let mut state = self.state.write();
        let docs: Vec<Document> = state.documents.values().cloned().collect();
        state.indexes.rebuild_all(&docs)
    }

    /// Evict TTL-expired documents from every TTL index.
    pub fn refresh(&self) -> usize {
        let mut state = self.state.write();
        let expired = state.indexes.expired_ids();
        let mut removed = 0;
        for (_, id) in expired {
            if let Some(doc) = state.documents.shift_remove(&id) {
                state.indexes.on_delete(&doc);
                removed += 1;
            }
        }
        drop(state);
        if removed > 0 {
            self.cache.invalidate_all();
            self.fire_change_signal();
        }
        removed
    }

    pub fn suggest_indexes(&self) -> Vec<IndexSuggestion> {
        self.state.read().indexes.suggest_indexes()
    }

    pub fn observe_query(&self, query: &Query) {
        self.state.write().indexes.observe_query(query.filter());
    }

    // -- Reactive subscriptions -------------------------------------------

    pub fn subscribe(&self, query: Query, callback: Box<dyn Fn(&ChangeEvent) + Send + Sync>) -> Subscription {
        let id = self.next_sub_id.fetch_add(1, Ordering::SeqCst);
        let initial = {
            let state = self.state.read();
            state.documents.values().filter(|d| query.matches(d)).cloned().collect::<Vec<_>>()
        };
        callback(&ChangeEvent { matching: initial });
        self.subscriptions.lock().push(SubscriptionEntry { id, query, callback });
        Subscription { id }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscriptions.lock().retain(|s| s.id != subscription.id);
    }

    fn fire_change_signal(&self) {
        let docs: Vec<Document> = self.state.read().documents.values().cloned().collect();
        let subscriptions = self.subscriptions.lock();
        for sub in subscriptions.iter() {
            let matching: Vec<Document> = docs.iter().filter(|d| sub.query.matches(d)).cloned().collect();
            (sub.callback)(&ChangeEvent { matching });
        }
    }

    fn record_latency(&self, start: Instant) {
        self.throttle.lock().record(start.elapsed());
    }

    pub fn current_concurrency(&self) -> usize {
        self.throttle.lock().concurrency()
    }

    /// Normalize a value the way the active indexes would, for callers that
    /// want to predict index membership without mutating anything.
    pub fn normalize_for_index(value: &Value, case_insensitive: bool) -> IndexKey {
        IndexKey::from_value(value, case_insensitive)
    }
}
