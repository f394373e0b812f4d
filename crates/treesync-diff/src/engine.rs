//! Tree comparison producing the sync plan.
//!
//! Presence and type checks are answered from the indices alone. Files that
//! exist on both sides with the same listed size are hashed on the worker
//! pool, and all results are gathered before the lists are sorted, so the
//! plan does not depend on which hash finished first.

use std::sync::Arc;

use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use treesync_core::{
    ActionList, Entry, EntryError, HashErrorPolicy, Side, SyncConfig, SyncError, SyncPlan,
    worker_pool,
};
use treesync_scan::TreeIndex;

use crate::hasher::FileHasher;

/// Compares a source and a destination index.
pub struct DiffEngine {
    hasher: FileHasher,
    size_shortcut: bool,
    on_hash_error: HashErrorPolicy,
    pool: Arc<ThreadPool>,
}

/// Result of comparing one file present on both sides.
enum Comparison<'a> {
    Same,
    Changed(&'a Entry),
    Unreadable(&'a Entry, EntryError),
}

impl DiffEngine {
    /// Create an engine with its own worker pool sized from `config`.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let pool = worker_pool(config.effective_concurrency())?;
        Ok(Self::with_pool(config, Arc::new(pool)))
    }

    /// Create an engine that hashes on an existing pool.
    pub fn with_pool(config: &SyncConfig, pool: Arc<ThreadPool>) -> Self {
        Self {
            hasher: FileHasher::new(config.hash_algorithm),
            size_shortcut: config.size_shortcut,
            on_hash_error: config.on_hash_error,
            pool,
        }
    }

    /// Compute what must be copied and deleted to make `destination` match `source`.
    pub fn diff(&self, source: &TreeIndex, destination: &TreeIndex) -> SyncPlan {
        let mut copies: Vec<Entry> = Vec::new();
        let mut deletes: Vec<Entry> = Vec::new();
        let mut candidates: Vec<(&Entry, &Entry)> = Vec::new();

        for src in source.iter() {
            match destination.get(&src.relative_path) {
                None => copies.push(src.clone()),
                Some(dst) if dst.kind != src.kind => {
                    // Replaced by an object of the other type: remove, then recreate.
                    deletes.push(dst.clone());
                    copies.push(src.clone());
                }
                Some(_) if src.is_dir() => {}
                Some(dst) if self.size_shortcut && src.size != dst.size => {
                    copies.push(src.clone());
                }
                Some(dst) => candidates.push((src, dst)),
            }
        }

        deletes.extend(
            destination
                .iter()
                .filter(|dst| !source.contains(&dst.relative_path))
                .cloned(),
        );

        debug!(
            candidates = candidates.len(),
            algorithm = %self.hasher.algorithm(),
            "comparing file contents"
        );

        let comparisons: Vec<Comparison<'_>> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|&(src, dst)| self.compare(src, dst))
                .collect()
        });

        let mut hash_failures = Vec::new();
        for comparison in comparisons {
            match comparison {
                Comparison::Same => {}
                Comparison::Changed(src) => copies.push(src.clone()),
                Comparison::Unreadable(src, error) => {
                    warn!(path = %src.relative_path, error = %error.message, "comparison failed");
                    if self.on_hash_error == HashErrorPolicy::Copy {
                        copies.push(src.clone());
                    }
                    hash_failures.push(error);
                }
            }
        }
        hash_failures.sort_by(|a, b| a.path.cmp(&b.path));

        let plan = SyncPlan {
            copy: ActionList::copies(copies),
            delete: ActionList::deletes(deletes),
            hash_failures,
        };
        debug!(summary = %plan.summary(), "diff complete");
        plan
    }

    fn compare<'a>(&self, src: &'a Entry, dst: &'a Entry) -> Comparison<'a> {
        let src_digest = match self.hasher.hash_file(&src.absolute_path) {
            Ok(digest) => digest,
            Err(e) => return Comparison::Unreadable(src, unreadable(src, Side::Source, &e)),
        };
        let dst_digest = match self.hasher.hash_file(&dst.absolute_path) {
            Ok(digest) => digest,
            Err(e) => return Comparison::Unreadable(src, unreadable(dst, Side::Destination, &e)),
        };

        trace!(path = %src.relative_path, %src_digest, %dst_digest, "hashed");
        if src_digest == dst_digest {
            Comparison::Same
        } else {
            Comparison::Changed(src)
        }
    }
}

fn unreadable(entry: &Entry, side: Side, error: &std::io::Error) -> EntryError {
    EntryError::io(
        entry.relative_path.clone(),
        &format!("Failed to hash {side} file"),
        error,
    )
}
