//! Garbage collector for shared handles that the audio or IEM thread has
//! stopped using but cannot afford to drop synchronously (dropping a large
//! `Arc<T>` can run `T`'s destructor, which may allocate or deallocate).
//! Handles are pushed into the pool and swept by a background thread once
//! a second, removed once nothing else still holds a reference.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// A pool of `Arc<T>` awaiting collection, drained once per second by a
/// dedicated background thread.
pub struct ReleasePool<T> {
    pool: Arc<Mutex<Vec<Arc<T>>>>,
    running: Arc<AtomicBool>,
    sweeper: Option<JoinHandle<()>>,
}

impl<T: Send + Sync + 'static> ReleasePool<T> {
    /// Start the pool and its background sweep thread.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(1000))
    }

    /// Start the pool with a custom sweep interval (used in tests to avoid
    /// a one-second wait).
    pub fn with_interval(interval: Duration) -> Self {
        let pool = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let sweep_pool = Arc::clone(&pool);
        let sweep_running = Arc::clone(&running);
        let sweeper = std::thread::spawn(move || {
            while sweep_running.load(Ordering::Acquire) {
                std::thread::sleep(interval);
                let mut guard = sweep_pool.lock().expect("release pool mutex poisoned");
                guard.retain(|handle| Arc::strong_count(handle) > 1);
            }
        });

        Self {
            pool,
            running,
            sweeper: Some(sweeper),
        }
    }

    /// Hand a handle to the pool. It is dropped on a future sweep once
    /// this was the last external reference.
    pub fn add(&self, handle: Arc<T>) {
        self.pool.lock().expect("release pool mutex poisoned").push(handle);
    }

    /// Number of handles currently awaiting collection. For diagnostics
    /// and tests only.
    pub fn len(&self) -> usize {
        self.pool.lock().expect("release pool mutex poisoned").len()
    }
}

impl<T> Drop for ReleasePool<T> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(sweeper) = self.sweeper.take() {
            let _ = sweeper.join();
        }
    }
}
