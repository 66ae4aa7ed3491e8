// src/concurrency/task_queue.rs
//! Bounded task queue: at most `w` in-flight tasks; further submissions
//! wait FIFO (spec §4.9). `resize` changes the in-flight bound without
//! discarding anything already queued — the source program the spec was
//! distilled from used to replace the whole queue on reconfiguration,
//! dropping pending work; this implementation only ever mutates the
//! capacity field, so queued tickets survive (spec's open-question
//! resolution, see DESIGN.md).

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

struct Inner {
    capacity: usize,
    in_flight: usize,
    waiting: VecDeque<u64>,
}

pub struct TaskQueue {
    inner: Mutex<Inner>,
    cv: Condvar,
    next_id: AtomicU64,
}

/// A queued, not-yet-running task's identity. Dropping one that never
/// reached `acquire` leaves it in the queue forever, so callers that give
/// up must call `cancel` explicitly — mirroring the spec's "cancel-before-
/// acquire removes from the task queue" rule, which is a caller action,
/// not an implicit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketId(u64);

impl TaskQueue {
    pub fn new(capacity: usize) -> Self {
        TaskQueue {
            inner: Mutex::new(Inner { capacity: capacity.max(1), in_flight: 0, waiting: VecDeque::new() }),
            cv: Condvar::new(),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn enqueue(&self) -> TicketId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock();
        inner.waiting.push_back(id);
        TicketId(id)
    }

    /// Remove a still-waiting ticket. Returns `true` if it was found (and
    /// thus never ran); `false` if it had already been acquired or didn't
    /// exist.
    pub fn cancel(&self, ticket: TicketId) -> bool {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.waiting.iter().position(|&id| id == ticket.0) {
            inner.waiting.remove(pos);
            self.cv.notify_all();
            true
        } else {
            false
        }
    }

    /// Block until `ticket` is at the front of the queue and a slot is
    /// free, then occupy it.
    pub fn acquire(&self, ticket: TicketId) -> TaskSlot<'_> {
        let mut inner = self.inner.lock();
        loop {
            let at_front = inner.waiting.front() == Some(&ticket.0);
            if at_front && inner.in_flight < inner.capacity {
                inner.waiting.pop_front();
                inner.in_flight += 1;
                return TaskSlot { queue: self };
            }
            self.cv.wait(&mut inner);
        }
    }

    /// Convenience: enqueue, block for a slot, run `f`, release.
    pub fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let ticket = self.enqueue();
        let _slot = self.acquire(ticket);
        f()
    }

    /// Resize the in-flight bound in place; any already-queued tickets are
    /// left untouched.
    pub fn resize(&self, new_capacity: usize) {
        let mut inner = self.inner.lock();
        inner.capacity = new_capacity.max(1);
        self.cv.notify_all();
    }

    fn release(&self) {
        let mut inner = self.inner.lock();
        inner.in_flight -= 1;
        self.cv.notify_all();
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    pub fn waiting_count(&self) -> usize {
        self.inner.lock().waiting.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

pub struct TaskSlot<'a> {
    queue: &'a TaskQueue,
}

impl Drop for TaskSlot<'_> {
    fn drop(&mut self) {
        self.queue.release();
    }
}
