//! A small bounded worker pool.
//!
//! Grounded on `compiler/src/thread_pool.c`'s `ThreadPool`: a fixed set of
//! worker threads pulling closures off a shared, condvar-guarded queue, with
//! a `wait_all` that blocks until every submitted job has finished. Rust's
//! ownership rules replace the original's `pthread_mutex_t`/`pthread_cond_t`
//! pair with a single `Mutex<State>` plus two `Condvar`s (one for "a job is
//! available", one for "the queue just drained").
//!
//! The driver (§5) uses this to build every function's CFG concurrently once
//! semantic analysis has produced the full resolved program: CFG
//! construction only reads an already-resolved, immutable function body, so
//! it has no cross-module ordering constraint left to respect — unlike
//! parsing and semantic analysis, which still run single-threaded and
//! dependency-first inside `saplang::collect_and_resolve`.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    pending: Mutex<usize>,
    has_work: Condvar,
    drained: Condvar,
    shutdown: Mutex<bool>,
}

/// A fixed-size pool of worker threads that execute submitted closures in
/// the order they were submitted, with no guaranteed cross-job ordering
/// beyond that.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `thread_count` workers (minimum 1).
    #[must_use]
    pub fn new(thread_count: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            pending: Mutex::new(0),
            has_work: Condvar::new(),
            drained: Condvar::new(),
            shutdown: Mutex::new(false),
        });
        let thread_count = thread_count.max(1);
        let mut workers = Vec::with_capacity(thread_count);
        for _ in 0..thread_count {
            let shared = Arc::clone(&shared);
            workers.push(std::thread::spawn(move || worker_loop(&shared)));
        }
        Self { shared, workers }
    }

    /// Sizes the pool to the host's available parallelism minus one, leaving
    /// a core free for the thread that submits work and waits on it.
    #[must_use]
    pub fn for_host() -> Self {
        let threads = std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(2);
        Self::new(threads.saturating_sub(1).max(1))
    }

    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        *self.shared.pending.lock().unwrap() += 1;
        self.shared.queue.lock().unwrap().push_back(Box::new(job));
        self.shared.has_work.notify_one();
    }

    /// Blocks until every job submitted so far has finished running.
    pub fn wait_all(&self) {
        let mut pending = self.shared.pending.lock().unwrap();
        while *pending != 0 {
            pending = self.shared.drained.wait(pending).unwrap();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        *self.shared.shutdown.lock().unwrap() = true;
        self.shared.has_work.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(job) = queue.pop_front() {
                    break Some(job);
                }
                if *shared.shutdown.lock().unwrap() {
                    break None;
                }
                queue = shared.has_work.wait(queue).unwrap();
            }
        };
        let Some(job) = job else { break };
        job();
        let mut pending = shared.pending.lock().unwrap();
        *pending -= 1;
        if *pending == 0 {
            shared.drained.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerPool;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_every_submitted_job() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_all();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn wait_all_is_reusable_across_batches() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for batch in 0..3 {
            for _ in 0..10 {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            pool.wait_all();
            assert_eq!(counter.load(Ordering::SeqCst), (batch + 1) * 10);
        }
    }
}
