//! A busy-spin counter used to block the audio thread until a batch of
//! worker-pool tasks has drained, without ever taking a blocking lock.

use std::sync::atomic::{AtomicI32, Ordering};

/// Counts outstanding tasks and lets the submitting thread spin-wait for
/// them to reach zero. `Add`/`Subtract` are the producer/worker side;
/// `lock` is the consumer side.
#[derive(Debug)]
pub struct SpinLock {
    counter: AtomicI32,
}

impl SpinLock {
    /// A lock already carrying `start_counter` outstanding tasks.
    pub fn new(start_counter: i32) -> Self {
        Self {
            counter: AtomicI32::new(start_counter),
        }
    }

    /// Busy-spin, yielding the thread between polls, until the counter
    /// drops below 1.
    pub fn lock(&self) {
        while !self.try_unlock() {
            std::thread::yield_now();
        }
    }

    /// Non-blocking check: has the counter dropped below 1?
    pub fn try_unlock(&self) -> bool {
        self.counter.load(Ordering::Acquire) < 1
    }

    /// One more outstanding task.
    pub fn add(&self) {
        self.counter.fetch_add(1, Ordering::Release);
    }

    /// One fewer outstanding task.
    pub fn subtract(&self) {
        self.counter.fetch_sub(1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocks_once_counter_reaches_zero() {
        let lock = SpinLock::new(2);
        assert!(!lock.try_unlock());
        lock.subtract();
        assert!(!lock.try_unlock());
        lock.subtract();
        assert!(lock.try_unlock());
    }

    #[test]
    fn starts_unlocked_with_zero_tasks() {
        let lock = SpinLock::new(0);
        assert!(lock.try_unlock());
        lock.lock(); // must return immediately
    }
}
