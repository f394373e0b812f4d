//! Bounded worker pool shared by the hashing and copy phases.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::SyncError;

/// Start a pool of exactly `workers` threads.
///
/// Work submitted to the pool queues until a worker is free, which is what
/// bounds the number of files open for hashing or copying at any moment.
pub fn worker_pool(workers: usize) -> Result<ThreadPool, SyncError> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("treesync-worker-{i}"))
        .build()
        .map_err(|e| SyncError::WorkerPool {
            message: e.to_string(),
        })
}
