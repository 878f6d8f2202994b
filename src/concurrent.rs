use ahash::AHashSet;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Unordered set of lower-cased names.
pub type ResultSet = AHashSet<String>;

/// Shared name set; cloning shares the same underlying set.
#[derive(Clone, Default)]
pub struct ResultAggregator {
    names: Arc<Mutex<ResultSet>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower-case `candidate` and insert it. Returns false for a duplicate.
    pub fn add(&self, candidate: &str) -> bool {
        let normalized = candidate.to_lowercase();
        self.names.lock().insert(normalized)
    }

    pub fn len(&self) -> usize {
        self.names.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> ResultSet {
        self.names.lock().clone()
    }
}

/// Completion counters the coordinator checks before declaring a crawl done.
#[derive(Debug, Default)]
pub struct WorkerPoolState {
    active_workers: AtomicUsize,
    discovery_completed: AtomicUsize,
    workers_completed: AtomicUsize,
    pages_fetched: AtomicUsize,
}

impl WorkerPoolState {
    pub fn discovery_done(&self) -> usize {
        self.discovery_completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn worker_started(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    pub fn worker_done(&self) -> usize {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
        self.workers_completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    pub fn discovery_completed(&self) -> usize {
        self.discovery_completed.load(Ordering::SeqCst)
    }

    pub fn workers_completed(&self) -> usize {
        self.workers_completed.load(Ordering::SeqCst)
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched.load(Ordering::Relaxed)
    }
}
