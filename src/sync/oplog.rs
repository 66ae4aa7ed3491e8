// src/sync/oplog.rs
//! Bounded ring buffer of recent operations (spec §3, §4.14). Pruning is
//! eager: the oldest entry is dropped as soon as a push would exceed
//! capacity.

use crate::crdt::Operation;
use crate::vector_clock::VectorClock;
use parking_lot::Mutex;
use std::collections::VecDeque;

pub struct OperationLog {
    capacity: usize,
    entries: Mutex<VecDeque<Operation>>,
}

impl OperationLog {
    pub fn new(capacity: usize) -> Self {
        OperationLog { capacity: capacity.max(1), entries: Mutex::new(VecDeque::new()) }
    }

    pub fn push(&self, op: Operation) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(op);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Operations whose originating peer-slot clock exceeds the
    /// requester's knowledge of that peer.
    pub fn operations_since(&self, requester_vector: &VectorClock) -> Vec<Operation> {
        self.entries
            .lock()
            .iter()
            .filter(|op| op.vector.get(&op.peer_id) > requester_vector.get(&op.peer_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::OperationKind;
    use crate::value::DocumentId;

    fn op(peer: &str, counter: u64) -> Operation {
        let mut v = VectorClock::new();
        for _ in 0..counter {
            v = v.increment(peer);
        }
        Operation {
            id: format!("{}-{}", peer, counter),
            kind: OperationKind::Insert,
            collection: "users".into(),
            document_id: DocumentId::String("1".into()),
            payload: None,
            vector: v,
            timestamp: counter as i64,
            peer_id: peer.to_string(),
        }
    }

    #[test]
    fn evicts_oldest_entry_past_capacity() {
        let log = OperationLog::new(2);
        log.push(op("p1", 1));
        log.push(op("p1", 2));
        log.push(op("p1", 3));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn operations_since_filters_by_peer_slot_knowledge() {
        let log = OperationLog::new(10);
        log.push(op("p1", 1));
        log.push(op("p1", 2));
        log.push(op("p2", 1));

        let mut requester = VectorClock::new();
        requester = requester.increment("p1"); // knows p1 up to 1
        let missing = log.operations_since(&requester);
        assert_eq!(missing.len(), 2); // p1's 2nd op, plus all of p2's
    }
}
