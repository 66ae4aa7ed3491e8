// src/persistence.rs
//! The persistence back-end collaborator (spec §6.1). Kept as a trait plus
//! an in-memory reference implementation — a file- or network-backed
//! engine is an explicit Non-goal; this module exists only so `Database`
//! has something real to call `load`/`save` through in tests.

use crate::error::Result;
use crate::value::Document;
use parking_lot::Mutex;
use std::collections::HashMap;

/// `load()` is treated as wholesale replacement: whatever it returns
/// becomes the entire state of each named collection. `save()` likewise
/// snapshots every collection in full; incremental back-ends must
/// synthesize the complete view themselves.
pub trait PersistenceBackend: Send + Sync {
    fn load(&self) -> Result<HashMap<String, Vec<Document>>>;
    fn save(&self, snapshot: HashMap<String, Vec<Document>>) -> Result<()>;

    /// Optional: released when a `Database` is dropped or explicitly closed.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Reference implementation: holds the last-saved snapshot in memory.
/// Useful for tests and as a template for a real back-end.
#[derive(Default)]
pub struct MemoryBackend {
    snapshot: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn load(&self) -> Result<HashMap<String, Vec<Document>>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: HashMap<String, Vec<Document>>) -> Result<()> {
        *self.snapshot.lock() = snapshot;
        Ok(())
    }
}
