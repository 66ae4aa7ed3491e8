// src/compression.rs
//! Per-field compression (spec §4.8).
//!
//! Opt-in: a field is only compressed when it would actually shrink, so
//! compression never changes observable semantics — a document read back
//! through `Document::get`/`to_projection` looks identical whether or not
//! any field happened to compress.
//!
//! `doc.fields` deliberately keeps the live, decompressed value alongside
//! the envelope rather than replacing it — every other module (the
//! matcher, the update executor, the index key builder) reads fields
//! straight out of `doc.fields`, so storing only compressed bytes there
//! would mean threading decompression through each of those call sites.
//! This means the envelope is additive, not size-reducing, in memory; it
//! earns its keep by being the thing actually persisted by a
//! `PersistenceBackend` that wants the smaller on-disk form, and by giving
//! `verify_envelope` something to check.

use crate::config::CompressionConfig;
use crate::value::{CompressedEnvelope, Document, Value};
use indexmap::IndexMap;

/// Compress eligible top-level fields of `doc`. `doc.fields` always keeps
/// the live decompressed value; the envelope records which fields
/// qualified, their combined original size, and a compressed copy of each.
pub fn compress(doc: &mut Document, config: &CompressionConfig) {
    if !config.enabled {
        doc.compressed = None;
        return;
    }
    let mut envelope = CompressedEnvelope::default();
    for (field, value) in &doc.fields {
        let serialized = value.canonical_json();
        if serialized.len() < config.threshold_bytes {
            continue;
        }
        let compressed = zstd::encode_all(serialized.as_bytes(), 0).unwrap_or_default();
        if compressed.len() >= serialized.len() {
            continue; // compression didn't shrink it; leave field uncompressed
        }
        envelope.original_size += serialized.len();
        envelope.fields.push(field.clone());
        envelope.data.insert(field.clone(), compressed);
    }
    doc.compressed = if envelope.fields.is_empty() { None } else { Some(envelope) };
}

/// Verify the envelope's recorded bytes still round-trip to the live field
/// value. Used by tests and by integrity checks; not on the read hot path,
/// since `doc.fields` already holds the decompressed view.
pub fn verify_envelope(doc: &Document) -> bool {
    let envelope = match &doc.compressed {
        Some(e) => e,
        None => return true,
    };
    for field in &envelope.fields {
        let bytes = match envelope.data.get(field) {
            Some(b) => b,
            None => return false,
        };
        let decoded = match zstd::decode_all(bytes.as_slice()) {
            Ok(d) => d,
            Err(_) => return false,
        };
        let current = match doc.fields.get(field) {
            Some(v) => v.canonical_json(),
            None => return false,
        };
        if decoded != current.as_bytes() {
            return false;
        }
    }
    true
}

/// Reconstruct the decompressed field map — identity here since `fields`
/// always holds the live, uncompressed values; exposed for symmetry with
/// backends that might serialize only the envelope to storage.
pub fn decompressed_fields(doc: &Document) -> IndexMap<String, Value> {
    doc.fields.clone()
}
