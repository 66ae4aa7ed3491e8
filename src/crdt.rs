// src/crdt.rs
//! Vector-clock-based conflict resolution for distributed collections
//! (spec §4.13).

use crate::path;
use crate::value::{Document, DocumentId, Value};
use crate::vector_clock::{ClockOrdering, VectorClock};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document plus the replication metadata the sync engine needs:
/// its vector clock, last-touch wall-clock timestamp, originating peer,
/// and tombstone bit. Deleted documents are kept (as tombstones) so a
/// late-arriving concurrent update can still be ordered against them.
/// `field_meta` records, per field, the (timestamp, peer ID) of the
/// operation that last wrote it — the per-field LWW provenance
/// `apply_operation` needs to resolve two concurrent writes to the same
/// field the same way regardless of application order.
#[derive(Debug, Clone)]
pub struct DistributedDocument {
    pub id: DocumentId,
    pub fields: IndexMap<String, Value>,
    pub vector: VectorClock,
    pub timestamp: i64,
    pub peer_id: String,
    pub deleted: bool,
    pub field_meta: HashMap<String, (i64, String)>,
}

impl DistributedDocument {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new(self.id.clone(), self.fields.clone());
        doc.distributed = Some(crate::value::DistributedMeta {
            vector: self.vector.clone(),
            timestamp: self.timestamp,
            peer_id: self.peer_id.clone(),
            deleted: self.deleted,
        });
        doc
    }
}

/// The kind of replicated mutation an `Operation` carries (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub kind: OperationKind,
    pub collection: String,
    pub document_id: DocumentId,
    pub payload: Option<IndexMap<String, Value>>,
    pub vector: VectorClock,
    pub timestamp: i64,
    pub peer_id: String,
}

/// Deterministic conflict resolution between two `DistributedDocument`s for
/// the same ID, and the operation-application rules of spec §4.13.
pub struct CrdtResolver;

impl CrdtResolver {
    /// Decide which of `local`/`remote` survives (or how they merge).
    /// Returns the winning document, with the loser's non-conflicting
    /// fields absorbed into it.
    pub fn resolve(local: &DistributedDocument, remote: &DistributedDocument) -> DistributedDocument {
        if local.deleted != remote.deleted {
            let (tombstone, other) = if local.deleted { (local, remote) } else { (remote, local) };
            if tombstone.vector.compare(&other.vector) != ClockOrdering::Before {
                return tombstone.clone();
            }
            return other.clone();
        }

        match local.vector.compare(&remote.vector) {
            ClockOrdering::After => local.clone(),
            ClockOrdering::Before => remote.clone(),
            ClockOrdering::Equal => local.clone(),
            ClockOrdering::Concurrent => {
                let (winner, loser) = Self::tiebreak(local, remote);
                Self::merge_non_conflicting(winner, loser)
            }
        }
    }

    /// Timestamp wins; ties broken by peer ID, lexicographically.
    fn tiebreak<'a>(
        a: &'a DistributedDocument,
        b: &'a DistributedDocument,
    ) -> (&'a DistributedDocument, &'a DistributedDocument) {
        if a.timestamp > b.timestamp {
            (a, b)
        } else if b.timestamp > a.timestamp {
            (b, a)
        } else if a.peer_id >= b.peer_id {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// The winner keeps its own field values; fields the winner lacks are
    /// absorbed from the loser. The winner's vector clock is advanced by
    /// pointwise max over both.
    fn merge_non_conflicting(winner: &DistributedDocument, loser: &DistributedDocument) -> DistributedDocument {
        let mut merged = winner.clone();
        for (field, value) in &loser.fields {
            if !merged.fields.contains_key(field) {
                merged.fields.insert(field.clone(), value.clone());
                if let Some(meta) = loser.field_meta.get(field) {
                    merged.field_meta.insert(field.clone(), meta.clone());
                }
            }
        }
        merged.vector = winner.vector.merge(&loser.vector);
        merged
    }

    /// Apply a remote `Operation` to the (possibly absent) current document,
    /// per spec §4.13's INSERT/UPDATE/DELETE rules. Returns `None` if the
    /// operation was stale (current strictly dominates) and should be
    /// ignored.
    pub fn apply_operation(
        current: Option<&DistributedDocument>,
        op: &Operation,
    ) -> Option<DistributedDocument> {
        match op.kind {
            OperationKind::Insert | OperationKind::Update => {
                let payload = op.payload.clone().unwrap_or_default();
                match current {
                    None => {
                        let field_meta =
                            payload.keys().map(|f| (f.clone(), (op.timestamp, op.peer_id.clone()))).collect();
                        Some(DistributedDocument {
                            id: op.document_id.clone(),
                            fields: payload,
                            vector: op.vector.clone(),
                            timestamp: op.timestamp,
                            peer_id: op.peer_id.clone(),
                            deleted: false,
                            field_meta,
                        })
                    }
                    Some(cur) => {
                        let ordering = op.vector.compare(&cur.vector);
                        if matches!(ordering, ClockOrdering::Before) {
                            return None; // current dominates: stale op
                        }
                        // A field this op touches only genuinely conflicts
                        // with a prior write that ALSO touched it. Decide
                        // each such conflict with the same timestamp-then-
                        // peer-id rule `tiebreak` uses, rather than letting
                        // whichever side calls `apply_operation` last win
                        // by arrival order — two peers applying the same
                        // two concurrent ops in opposite orders must
                        // converge on every field, not just disjoint ones.
                        let mut merged_fields = cur.fields.clone();
                        let mut merged_meta = cur.field_meta.clone();
                        for (field, value) in &payload {
                            let op_wins = match ordering {
                                // Causally later (or equal): op dominates
                                // every operation already reflected in
                                // `cur`, so it always wins.
                                ClockOrdering::After | ClockOrdering::Equal => true,
                                ClockOrdering::Concurrent => match cur.field_meta.get(field) {
                                    Some((ts, peer)) => {
                                        op.timestamp > *ts || (op.timestamp == *ts && &op.peer_id >= peer)
                                    }
                                    None => true, // no recorded prior writer for this field
                                },
                                ClockOrdering::Before => unreachable!("handled above"),
                            };
                            if op_wins {
                                merged_fields.insert(field.clone(), value.clone());
                                merged_meta.insert(field.clone(), (op.timestamp, op.peer_id.clone()));
                            }
                        }
                        Some(DistributedDocument {
                            id: cur.id.clone(),
                            fields: merged_fields,
                            vector: cur.vector.merge(&op.vector),
                            timestamp: op.timestamp.max(cur.timestamp),
                            peer_id: if op.timestamp >= cur.timestamp { op.peer_id.clone() } else { cur.peer_id.clone() },
                            deleted: false,
                            field_meta: merged_meta,
                        })
                    }
                }
            }
            OperationKind::Delete => {
                let base = current.cloned().unwrap_or(DistributedDocument {
                    id: op.document_id.clone(),
                    fields: IndexMap::new(),
                    vector: VectorClock::default(),
                    timestamp: op.timestamp,
                    peer_id: op.peer_id.clone(),
                    deleted: false,
                    field_meta: HashMap::new(),
                });
                Some(DistributedDocument {
                    vector: base.vector.merge(&op.vector),
                    timestamp: op.timestamp.max(base.timestamp),
                    peer_id: op.peer_id.clone(),
                    deleted: true,
                    ..base
                })
            }
        }
    }
}

pub fn get_field<'a>(doc: &'a DistributedDocument, path_str: &str) -> Option<&'a Value> {
    path::get(&doc.fields, path_str)
}
