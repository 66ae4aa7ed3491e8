// src/concurrency/rwlock.rs
//! A reader/writer lock with writer priority: once a writer is waiting, new
//! readers block until it has run, so writers can't starve under a steady
//! stream of readers. Re-entrant acquisition is not supported — acquiring
//! twice from the same thread deadlocks, same as `std::sync::RwLock`.

use parking_lot::{Condvar, Mutex};
use std::ops::{Deref, DerefMut};

struct State {
    readers: u32,
    writer_active: bool,
    writers_waiting: u32,
}

pub struct RwLock<T> {
    state: Mutex<State>,
    readers_may_proceed: Condvar,
    writer_may_proceed: Condvar,
    data: std::cell::UnsafeCell<T>,
}

unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    pub fn new(value: T) -> Self {
        RwLock {
            state: Mutex::new(State { readers: 0, writer_active: false, writers_waiting: 0 }),
            readers_may_proceed: Condvar::new(),
            writer_may_proceed: Condvar::new(),
            data: std::cell::UnsafeCell::new(value),
        }
    }

    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.state.lock();
        while state.writer_active || state.writers_waiting > 0 {
            self.readers_may_proceed.wait(&mut state);
        }
        state.readers += 1;
        ReadGuard { lock: self }
    }

    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.state.lock();
        state.writers_waiting += 1;
        while state.writer_active || state.readers > 0 {
            self.writer_may_proceed.wait(&mut state);
        }
        state.writers_waiting -= 1;
        state.writer_active = true;
        WriteGuard { lock: self }
    }

    fn release_read(&self) {
        let mut state = self.state.lock();
        state.readers -= 1;
        if state.readers == 0 {
            self.writer_may_proceed.notify_one();
        }
    }

    fn release_write(&self) {
        let mut state = self.state.lock();
        state.writer_active = false;
        if state.writers_waiting > 0 {
            self.writer_may_proceed.notify_one();
        } else {
            self.readers_may_proceed.notify_all();
        }
    }
}

pub struct ReadGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

pub struct WriteGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_write();
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
    fn readers_can_share_the_lock() {
        let lock = Arc::new(RwLock::new(0));
        let g1 = lock.read();
        let g2 = lock.read();
        assert_eq!(*g1, 0);
        assert_eq!(*g2, 0);
    }

    #[test]
    fn writer_excludes_readers() {
        let lock = RwLock::new(10);
        {
            let mut w = lock.write();
            *w = 20;
        }
        assert_eq!(*lock.read(), 20);
    }

    #[test]
    fn writer_blocks_new_readers_once_waiting() {
        let lock = Arc::new(RwLock::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let r1 = lock.read();
        let lock2 = lock.clone();
        let order2 = order.clone();
        let writer = thread::spawn(move || {
            let mut w = lock2.write();
            order2.lock().push("writer");
            *w += 1;
        });
        thread::sleep(Duration::from_millis(20));

        let lock3 = lock.clone();
        let order3 = order.clone();
        let late_reader = thread::spawn(move || {
            let _r = lock3.read();
            order3.lock().push("late_reader");
        });

        drop(r1);
        writer.join().unwrap();
        late_reader.join().unwrap();

        let seq = order.lock();
        assert_eq!(seq.as_slice(), &["writer", "late_reader"]);
    }

    #[test]
    fn many_readers_then_a_writer_see_consistent_state() {
        let lock = Arc::new(RwLock::new(0usize));
        let hits = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let lock = lock.clone();
            let hits = hits.clone();
            handles.push(thread::spawn(move || {
                let _r = lock.read();
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 8);
    }
}
