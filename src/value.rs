// src/value.rs
//! The tagged-union document value model (spec §3).
//!
//! Unlike `serde_json::Value`, `Object` here is insertion-order preserving
//! (`IndexMap`) because spec.md requires key order to survive a round-trip
//! even though it is semantically irrelevant.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A JSON-like value. Numeric equality follows total IEEE-754 semantics:
/// `NaN != NaN`, matching `f64`'s native `PartialEq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Number(a), Number(b)) => a == b, // NaN != NaN, by design
            (String(a), String(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Canonical JSON serialization, keys sorted recursively. Used by the
    /// query cache and by compound-index key normalization.
    pub fn canonical_json(&self) -> String {
        let sorted = Self::sort_keys(self.to_json());
        sorted.to_string()
    }

    fn sort_keys(v: serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Object(map) => {
                let mut entries: Vec<(String, serde_json::Value)> =
                    map.into_iter().map(|(k, v)| (k, Self::sort_keys(v))).collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                let mut out = serde_json::Map::new();
                for (k, v) in entries {
                    out.insert(k, v);
                }
                serde_json::Value::Object(out)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(Self::sort_keys).collect())
            }
            other => other,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::json!(n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Object(obj) => {
                let mut map = serde_json::Map::new();
                for (k, v) in obj {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    pub fn from_json(v: &serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => Value::Array(arr.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => {
                let mut obj = IndexMap::new();
                for (k, v) in map {
                    obj.insert(k.clone(), Value::from_json(v));
                }
                Value::Object(obj)
            }
        }
    }
}

/// Document primary key: string or number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum DocumentId {
    String(String),
    Number(i64),
}

impl DocumentId {
    /// Collision-resistant random identifier, used when an insert omits `id`.
    pub fn generate() -> Self {
        DocumentId::String(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentId::String(s) => write!(f, "{}", s),
            DocumentId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Per-field compression envelope (spec §4.8). Invisible to queries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompressedEnvelope {
    pub fields: Vec<String>,
    pub original_size: usize,
    /// field name -> compressed bytes
    pub data: IndexMap<String, Vec<u8>>,
}

/// Distributed metadata envelope (spec §3, §4.13). Invisible to queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedMeta {
    pub vector: crate::vector_clock::VectorClock,
    pub timestamp: i64,
    pub peer_id: String,
    pub deleted: bool,
}

/// A Document: an Object plus a mandatory `id`, and two optional reserved
/// envelopes that never participate in matching (`__compressed`,
/// `_vector`/`_timestamp`/`_peerId`/`_deleted`).
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub fields: IndexMap<String, Value>,
    pub compressed: Option<CompressedEnvelope>,
    pub distributed: Option<DistributedMeta>,
}

impl Document {
    pub fn new(id: DocumentId, fields: IndexMap<String, Value>) -> Self {
        Document {
            id,
            fields,
            compressed: None,
            distributed: None,
        }
    }

    /// The `toJSON` projection (spec §9): a pure function of the stored
    /// document that elides the reserved envelopes.
    pub fn to_projection(&self) -> Value {
        let mut obj = IndexMap::new();
        obj.insert("id".to_string(), match &self.id {
            DocumentId::String(s) => Value::String(s.clone()),
            DocumentId::Number(n) => Value::Number(*n as f64),
        });
        for (k, v) in &self.fields {
            obj.insert(k.clone(), v.clone());
        }
        Value::Object(obj)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        crate::path::get(&self.fields, field)
    }
}
