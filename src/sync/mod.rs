// src/sync/mod.rs
//! The distributed sync engine (spec §4.14, §6.3, §6.4).

mod messages;
mod oplog;
mod transport;

pub use messages::{SyncMessage, SyncPayload};
pub use oplog::OperationLog;
pub use transport::Transport;

use crate::crdt::{CrdtResolver, DistributedDocument, Operation, OperationKind};
use crate::error::Result;
use crate::value::DocumentId;
use crate::vector_clock::VectorClock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-Collection sync bookkeeping: {collection, networkId, lastSync,
/// syncInProgress}.
pub struct SyncState {
    pub collection: String,
    pub network_id: String,
    pub last_sync: Option<Instant>,
    pub sync_in_progress: bool,
    started_at: Option<Instant>,
}

const QUIET_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives replication for one distributed collection: tracks the local
/// vector clock, the bounded operation log, and applies inbound operations
/// through the CRDT resolver without re-broadcasting them.
pub struct SyncEngine {
    peer_id: String,
    collection: String,
    network_id: String,
    local_vector: Mutex<VectorClock>,
    log: OperationLog,
    state: Mutex<SyncState>,
    documents: Mutex<HashMap<DocumentId, DistributedDocument>>,
    transport: Arc<dyn Transport>,
}

impl SyncEngine {
    pub fn new(
        peer_id: String,
        collection: String,
        network_id: String,
        log_capacity: usize,
        transport: Arc<dyn Transport>,
    ) -> Self {
        SyncEngine {
            peer_id,
            collection: collection.clone(),
            network_id: network_id.clone(),
            local_vector: Mutex::new(VectorClock::new()),
            log: OperationLog::new(log_capacity),
            state: Mutex::new(SyncState {
                collection,
                network_id,
                last_sync: None,
                sync_in_progress: false,
                started_at: None,
            }),
            documents: Mutex::new(HashMap::new()),
            transport,
        }
    }

    pub fn local_vector(&self) -> VectorClock {
        self.local_vector.lock().clone()
    }

    pub fn document(&self, id: &DocumentId) -> Option<DistributedDocument> {
        self.documents.lock().get(id).cloned()
    }

    /// Local mutation path (spec §4.14): apply, advance the clock at our
    /// own slot, append to the log, then broadcast.
    pub fn apply_local(&self, kind: OperationKind, id: DocumentId, payload: Option<indexmap::IndexMap<String, crate::value::Value>>) -> Result<()> {
        let mut vector = self.local_vector.lock();
        *vector = vector.increment(&self.peer_id);
        let op = Operation {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            collection: self.collection.clone(),
            document_id: id.clone(),
            payload,
            vector: vector.clone(),
            timestamp: now_millis(),
            peer_id: self.peer_id.clone(),
        };
        drop(vector);

        let current = self.documents.lock().get(&id).cloned();
        if let Some(updated) = CrdtResolver::apply_operation(current.as_ref(), &op) {
            self.documents.lock().insert(id, updated);
        }
        self.log.push(op.clone());

        let message = SyncMessage::operation(&self.network_id, &self.peer_id, &self.collection, op);
        if let Err(e) = self.transport.broadcast(&self.network_id, message) {
            crate::log_warn!("sync broadcast failed for collection {}: {}", self.collection, e);
        }
        Ok(())
    }

    /// Remote operation path: deliver to the resolver, persist without
    /// re-broadcasting, then merge clocks.
    pub fn apply_remote(&self, op: Operation) -> Result<()> {
        let current = self.documents.lock().get(&op.document_id).cloned();
        if let Some(updated) = CrdtResolver::apply_operation(current.as_ref(), &op) {
            self.documents.lock().insert(op.document_id.clone(), updated);
        }
        let mut vector = self.local_vector.lock();
        *vector = vector.merge(&op.vector);
        self.log.push(op);
        Ok(())
    }

    /// Initiate a pull-sync: send our vector, expect SYNC_RESPONSE(s).
    pub fn begin_pull_sync(&self) -> SyncMessage {
        let mut state = self.state.lock();
        state.sync_in_progress = true;
        state.started_at = Some(Instant::now());
        SyncMessage::sync_request(&self.network_id, &self.peer_id, &self.collection, self.local_vector())
    }

    /// Answer an inbound SYNC_REQUEST: every op whose originating peer-slot
    /// clock exceeds the requester's knowledge for that peer.
    pub fn respond_to_request(&self, requester_vector: &VectorClock) -> SyncMessage {
        let missing = self.log.operations_since(requester_vector);
        SyncMessage::sync_response(&self.network_id, &self.peer_id, &self.collection, missing, self.local_vector())
    }

    /// Apply a SYNC_RESPONSE's operations in order, then merge the
    /// responder's vector and clear `syncInProgress`.
    pub fn apply_sync_response(&self, operations: Vec<Operation>, responder_vector: VectorClock) -> Result<()> {
        for op in operations {
            self.apply_remote(op)?;
        }
        let mut vector = self.local_vector.lock();
        *vector = vector.merge(&responder_vector);
        drop(vector);

        let mut state = self.state.lock();
        state.sync_in_progress = false;
        state.last_sync = Some(Instant::now());
        state.started_at = None;
        Ok(())
    }

    /// A sync is abandoned after a 10s quiet timeout; call periodically to
    /// expire a stalled `syncInProgress` flag.
    pub fn expire_if_stalled(&self) {
        let mut state = self.state.lock();
        if state.sync_in_progress {
            if let Some(started) = state.started_at {
                if started.elapsed() > QUIET_TIMEOUT {
                    crate::log_info!("sync for collection {} timed out after quiet period", self.collection);
                    state.sync_in_progress = false;
                    state.started_at = None;
                }
            }
        }
    }

    pub fn handle_message(&self, message: SyncMessage) -> Result<Option<SyncMessage>> {
        match message.payload {
            SyncPayload::Operation { operation, .. } => {
                self.apply_remote(operation)?;
                Ok(None)
            }
            SyncPayload::SyncRequest { vector, .. } => Ok(Some(self.respond_to_request(&vector))),
            SyncPayload::SyncResponse { operations, vector, .. } => {
                self.apply_sync_response(operations, vector)?;
                Ok(None)
            }
            SyncPayload::CollectionAnnounce { .. }
            | SyncPayload::CollectionRequest { .. }
            | SyncPayload::Heartbeat => Ok(None),
        }
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
