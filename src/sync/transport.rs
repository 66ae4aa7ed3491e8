// src/sync/transport.rs
//! The transport collaborator (spec §6.3): wire-format-agnostic but
//! transmits `SyncMessage`s as JSON-shaped payloads. A real transport is an
//! external collaborator; this module only defines the trait plus a mock
//! used by this crate's own sync tests.

use super::messages::SyncMessage;
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum TransportEvent {
    PeerConnect(String),
    PeerDisconnect(String),
    MessageReceived(SyncMessage),
}

pub trait Transport: Send + Sync {
    fn peer_id(&self) -> &str;
    fn broadcast(&self, network_id: &str, message: SyncMessage) -> Result<()>;
    fn send(&self, peer_id: &str, network_id: &str, message: SyncMessage) -> Result<()>;
    fn list_peers(&self, network_id: &str) -> Vec<String>;

    /// Drain queued inbound events. A real transport would push these from
    /// a background I/O task; this default never has any.
    fn poll_events(&self) -> Vec<TransportEvent> {
        Vec::new()
    }
}
