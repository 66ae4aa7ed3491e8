// src/concurrency/mod.rs
//! Concurrency primitives (spec §4.9): a writer-priority rw-lock, a FIFO
//! counting semaphore, and a bounded task queue. Built on `parking_lot`
//! (the teacher's lock of choice throughout `collection_core.rs`) and
//! `crossbeam-channel` (declared but unused in the teacher's manifest —
//! this is the first real use of it in this codebase).

mod rwlock;
mod semaphore;
mod task_queue;

pub use rwlock::RwLock;
pub use semaphore::Semaphore;
pub use task_queue::TaskQueue;
