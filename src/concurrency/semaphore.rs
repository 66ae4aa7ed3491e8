// src/concurrency/semaphore.rs
//! Counting semaphore with a FIFO wait queue, built on a bounded
//! `crossbeam-channel` pre-loaded with `permits` tokens: acquiring blocks
//! on `recv()`, releasing is a `send()`, and the channel's own queueing
//! gives FIFO fairness for free.

use crossbeam_channel::{bounded, Receiver, Sender};

pub struct Semaphore {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        let (tx, rx) = bounded(permits.max(1));
        for _ in 0..permits {
            tx.send(()).expect("freshly created channel has capacity");
        }
        Semaphore { tx, rx }
    }

    /// Block until a permit is available.
    pub fn acquire(&self) -> SemaphorePermit<'_> {
        self.rx.recv().expect("semaphore sender outlives receiver");
        SemaphorePermit { sem: self }
    }

    /// Non-blocking variant; `None` if no permit is immediately available.
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        self.rx.try_recv().ok().map(|_| SemaphorePermit { sem: self })
    }

    fn release(&self) {
        // The channel was created with capacity == initial permit count and
        // every permit taken is returned exactly once, so this never blocks.
        let _ = self.tx.try_send(());
    }
}

pub struct SemaphorePermit<'a> {
    sem: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn limits_concurrent_holders() {
        let sem = Arc::new(Semaphore::new(2));
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..6 {
            let sem = sem.clone();
            let concurrent = concurrent.clone();
            let max_seen = max_seen.clone();
            handles.push(thread::spawn(move || {
                let _permit = sem.acquire();
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                concurrent.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn try_acquire_fails_when_exhausted() {
        let sem = Semaphore::new(1);
        let _p1 = sem.acquire();
        assert!(sem.try_acquire().is_none());
    }

    #[test]
    fn permit_is_returned_on_drop() {
        let sem = Semaphore::new(1);
        {
            let _p = sem.acquire();
            assert!(sem.try_acquire().is_none());
        }
        assert!(sem.try_acquire().is_some());
    }
}
