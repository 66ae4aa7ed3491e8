// src/sync/messages.rs
//! Wire format of sync messages (spec §6.4): `{ type, networkId, senderId,
//! timestamp, payload }`, transmitted as JSON and agnostic to transport.

use crate::crdt::Operation;
use crate::vector_clock::VectorClock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMessage {
    pub network_id: String,
    pub sender_id: String,
    pub timestamp: i64,
    pub payload: SyncPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncPayload {
    #[serde(rename = "OPERATION")]
    Operation { collection: String, operation: Operation },
    #[serde(rename = "SYNC_REQUEST")]
    SyncRequest { collection: String, vector: VectorClock },
    #[serde(rename = "SYNC_RESPONSE")]
    SyncResponse { collection: String, operations: Vec<Operation>, vector: VectorClock },
    #[serde(rename = "COLLECTION_ANNOUNCE")]
    CollectionAnnounce { collection: String },
    #[serde(rename = "COLLECTION_REQUEST")]
    CollectionRequest { collection: String },
    #[serde(rename = "HEARTBEAT")]
    Heartbeat,
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl SyncMessage {
    pub fn operation(network_id: &str, sender_id: &str, collection: &str, operation: Operation) -> Self {
        SyncMessage {
            network_id: network_id.to_string(),
            sender_id: sender_id.to_string(),
            timestamp: now_millis(),
            payload: SyncPayload::Operation { collection: collection.to_string(), operation },
        }
    }

    pub fn sync_request(network_id: &str, sender_id: &str, collection: &str, vector: VectorClock) -> Self {
        SyncMessage {
            network_id: network_id.to_string(),
            sender_id: sender_id.to_string(),
            timestamp: now_millis(),
            payload: SyncPayload::SyncRequest { collection: collection.to_string(), vector },
        }
    }

    pub fn sync_response(
        network_id: &str,
        sender_id: &str,
        collection: &str,
        operations: Vec<Operation>,
        vector: VectorClock,
    ) -> Self {
        SyncMessage {
            network_id: network_id.to_string(),
            sender_id: sender_id.to_string(),
            timestamp: now_millis(),
            payload: SyncPayload::SyncResponse { collection: collection.to_string(), operations, vector },
        }
    }

    pub fn heartbeat(network_id: &str, sender_id: &str) -> Self {
        SyncMessage {
            network_id: network_id.to_string(),
            sender_id: sender_id.to_string(),
            timestamp: now_millis(),
            payload: SyncPayload::Heartbeat,
        }
    }
}
