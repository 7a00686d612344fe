//! Lock-free audio worker pool. The audio thread enqueues one task per
//! image source (and one per reverb source) onto a shared MPMC queue and
//! spin-waits on a [`SpinLock`] until every worker has finished, instead of
//! processing every source serially on the callback thread itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::spin_lock::SpinLock;

type Task = Box<dyn FnOnce() + Send>;

/// A fixed pool of worker threads draining a shared task queue.
pub struct ThreadPool {
    sender: Sender<Task>,
    workers: Vec<std::thread::JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl ThreadPool {
    /// Spawn `thread_count` workers, each pulling tasks off the shared
    /// queue until [`ThreadPool::stop`] is called or the pool is dropped.
    pub fn new(thread_count: usize) -> Self {
        let (sender, receiver): (Sender<Task>, Receiver<Task>) = crossbeam_channel::unbounded();
        let stop = Arc::new(AtomicBool::new(false));

        let workers = (0..thread_count.max(1))
            .map(|_| {
                let receiver = receiver.clone();
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || {
                    while !stop.load(Ordering::Acquire) {
                        match receiver.recv_timeout(std::time::Duration::from_millis(50)) {
                            Ok(task) => task(),
                            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                        }
                    }
                })
            })
            .collect();

        Self { sender, workers, stop }
    }

    /// `min(8, available_parallelism)` worker threads, the pool size the
    /// engine is configured with at startup.
    pub fn with_default_size() -> Self {
        let available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::new(available.min(8))
    }

    /// Submit one unit of work, incrementing `counter` first so it never
    /// transiently reads zero between submission and execution, and
    /// decrementing it once the task finishes running on its worker.
    /// `counter` is an `Arc` (rather than the original engine's raw
    /// pointer) so the worker's closure can hold its own reference
    /// without the submitting thread needing to outlive the task.
    pub fn submit(&self, counter: &Arc<SpinLock>, task: impl FnOnce() + Send + 'static) {
        counter.add();
        let counter = Arc::clone(counter);
        let boxed: Task = Box::new(move || {
            task();
            counter.subtract();
        });
        // The channel only disconnects once every worker has stopped, which
        // only happens after `stop()`; a send failing past that point means
        // the pool is shutting down and the task is simply dropped.
        let _ = self.sender.send(boxed);
    }

    /// Stop accepting new work and join every worker thread.
    pub fn stop(&mut self) {
        if self.stop.swap(true, Ordering::AcqRel) {
            return;
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn every_submitted_task_runs_before_lock_returns() {
        let pool = ThreadPool::new(4);
        let lock = Arc::new(SpinLock::new(0));
        let total = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let total = Arc::clone(&total);
            pool.submit(&lock, move || {
                total.fetch_add(1, Ordering::Relaxed);
            });
        }
        // Each submit() incremented the counter; workers subtract as they
        // finish, so spinning here waits for every task to complete.
        lock.lock();
        assert_eq!(total.load(Ordering::Relaxed), 100);
    }
}
