//! Plan execution against the destination tree.
//!
//! Order of application is part of the contract:
//!
//! 1. every delete, one at a time, in delete-list order (children first);
//! 2. every directory creation, one at a time, in copy-list order (parents first);
//! 3. every file copy, concurrently on the worker pool;
//! 4. the final mode of each created directory, deepest first.
//!
//! Deleting first frees paths that an incoming entry of another type needs.
//! Directories stay owner-writable until their files are in place.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::ThreadPool;
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use treesync_core::{
    ActionKind, Entry, EntryError, EntryOutcome, SyncConfig, SyncError, SyncPlan, SyncReport,
    is_descendant, worker_pool,
};

use crate::copy::{apply_mode, copy_file, create_directory, remove_entry};
use crate::progress::{ProgressTracker, SyncProgress};
use crate::PROGRESS_CHANNEL_SIZE;

const ABORTED: &str = "aborted after an earlier failure";

/// Applies sync plans to a destination root.
pub struct SyncExecutor {
    destination: PathBuf,
    fail_fast: bool,
    pool: Arc<ThreadPool>,
    progress_tx: broadcast::Sender<SyncProgress>,
}

impl SyncExecutor {
    /// Create an executor with its own worker pool sized from `config`.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let pool = worker_pool(config.effective_concurrency())?;
        Ok(Self::with_pool(config, Arc::new(pool)))
    }

    /// Create an executor that copies on an existing pool.
    pub fn with_pool(config: &SyncConfig, pool: Arc<ThreadPool>) -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self {
            destination: config.destination.clone(),
            fail_fast: config.fail_fast,
            pool,
            progress_tx,
        }
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncProgress> {
        self.progress_tx.subscribe()
    }

    /// Apply `plan`, returning one outcome per entry.
    ///
    /// Individual failures never stop the batch unless `fail_fast` is set,
    /// in which case every entry after the first failure is skipped.
    pub fn execute(&self, plan: &SyncPlan) -> SyncReport {
        let tracker = ProgressTracker::new(
            &self.progress_tx,
            plan.copy.len() + plan.delete.len(),
            plan.copy.total_bytes(),
        );
        let mut batch = Batch {
            report: SyncReport::new(),
            tracker: &tracker,
            aborted: false,
            fail_fast: self.fail_fast,
        };

        self.apply_deletes(plan, &mut batch);
        let (failed_dirs, created) = self.create_directories(plan, &mut batch);
        self.copy_files(plan, &failed_dirs, &mut batch);
        self.finalize_directories(&created, &mut batch);

        debug!(summary = %batch.report.summary(), "plan applied");
        batch.report
    }

    fn apply_deletes(&self, plan: &SyncPlan, batch: &mut Batch<'_>) {
        let mut failed: Vec<&str> = Vec::new();

        for entry in &plan.delete {
            let outcome = if batch.aborted {
                EntryOutcome::skipped(ABORTED)
            } else if entry.is_dir()
                && failed.iter().any(|path| is_descendant(path, &entry.relative_path))
            {
                EntryOutcome::skipped("directory still has contents that failed to delete")
            } else {
                match remove_entry(entry) {
                    Ok(()) => {
                        info!(path = %entry.relative_path, "delete");
                        EntryOutcome::Applied { bytes: 0 }
                    }
                    Err(e) => EntryError::io(entry.relative_path.clone(), "Failed to delete", &e).into(),
                }
            };

            if !outcome.is_applied() {
                failed.push(&entry.relative_path);
            }
            batch.finish(ActionKind::Delete, entry, outcome);
        }
    }

    /// Create directories in list order.
    ///
    /// Returns the paths that were not created, and the created entries with
    /// the index of their report record.
    fn create_directories<'p>(
        &self,
        plan: &'p SyncPlan,
        batch: &mut Batch<'_>,
    ) -> (Vec<&'p str>, Vec<(usize, &'p Entry)>) {
        let mut failed: Vec<&str> = Vec::new();
        let mut created = Vec::new();

        for entry in plan.copy.iter().filter(|e| e.is_dir()) {
            let outcome = if batch.aborted {
                EntryOutcome::skipped(ABORTED)
            } else if failed.iter().any(|dir| entry.is_below(dir)) {
                EntryOutcome::skipped("parent directory was not created")
            } else {
                let target = self.target(entry);
                match create_directory(&target, entry.mode) {
                    Ok(()) => {
                        info!(path = %entry.relative_path, "copy");
                        EntryOutcome::Applied { bytes: 0 }
                    }
                    Err(e) => {
                        EntryError::io(entry.relative_path.clone(), "Failed to create directory", &e)
                            .into()
                    }
                }
            };

            if outcome.is_applied() {
                created.push((batch.report.records.len(), entry));
            } else {
                failed.push(&entry.relative_path);
            }
            batch.finish(ActionKind::Copy, entry, outcome);
        }

        (failed, created)
    }

    fn copy_files(&self, plan: &SyncPlan, failed_dirs: &[&str], batch: &mut Batch<'_>) {
        let files: Vec<&Entry> = plan.copy.iter().filter(|e| e.is_file()).collect();
        let aborted = AtomicBool::new(batch.aborted);
        let fail_fast = self.fail_fast;
        let tracker = batch.tracker;

        let outcomes: Vec<EntryOutcome> = self.pool.install(|| {
            files
                .par_iter()
                .map(|entry| {
                    let outcome = if aborted.load(Ordering::Acquire) {
                        EntryOutcome::skipped(ABORTED)
                    } else if failed_dirs.iter().any(|dir| entry.is_below(dir)) {
                        EntryOutcome::skipped("parent directory was not created")
                    } else {
                        let outcome = self.copy_one(entry);
                        if fail_fast && outcome.is_failed() {
                            aborted.store(true, Ordering::Release);
                        }
                        outcome
                    };
                    tracker.record(ActionKind::Copy, &entry.relative_path, &outcome);
                    outcome
                })
                .collect()
        });

        for (entry, outcome) in files.into_iter().zip(outcomes) {
            batch.push(ActionKind::Copy, entry, outcome);
        }
    }

    /// Give created directories their source mode, children before parents.
    ///
    /// A directory whose mode cannot be set has its record turned into a failure.
    fn finalize_directories(&self, created: &[(usize, &Entry)], batch: &mut Batch<'_>) {
        for &(index, entry) in created.iter().rev() {
            if let Err(e) = apply_mode(&self.target(entry), entry.mode) {
                let error = EntryError::io(entry.relative_path.clone(), "Failed to set mode", &e);
                warn!(path = %entry.relative_path, error = %error.message, "action failed");
                if let Some(record) = batch.report.records.get_mut(index) {
                    record.outcome = error.into();
                }
            }
        }
    }

    fn copy_one(&self, entry: &Entry) -> EntryOutcome {
        if entry.absolute_path.is_dir() {
            debug!(path = %entry.relative_path, "link resolves to a directory");
            return EntryOutcome::skipped("symlink to a directory");
        }

        let target = self.target(entry);
        match copy_file(&entry.absolute_path, &target, entry.mode) {
            Ok(bytes) => {
                info!(path = %entry.relative_path, bytes, "copy");
                EntryOutcome::Applied { bytes }
            }
            Err(e) => EntryError::io(entry.relative_path.clone(), "Failed to copy", &e).into(),
        }
    }

    /// Destination location of a source entry.
    fn target(&self, entry: &Entry) -> PathBuf {
        self.destination.join(entry.relative_location())
    }
}

/// Running state of one `execute` call.
struct Batch<'a> {
    report: SyncReport,
    tracker: &'a ProgressTracker<'a>,
    aborted: bool,
    fail_fast: bool,
}

impl Batch<'_> {
    /// Record an outcome resolved on the coordinating thread.
    fn finish(&mut self, action: ActionKind, entry: &Entry, outcome: EntryOutcome) {
        self.tracker.record(action, &entry.relative_path, &outcome);
        self.push(action, entry, outcome);
    }

    /// Add an outcome to the report without publishing progress.
    fn push(&mut self, action: ActionKind, entry: &Entry, outcome: EntryOutcome) {
        if let EntryOutcome::Failed { error } = &outcome {
            warn!(path = %entry.relative_path, %action, error = %error.message, "action failed");
            if self.fail_fast {
                self.aborted = true;
            }
        }
        self.report.record(action, entry.relative_path.clone(), outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn executor(destination: &std::path::Path) -> SyncExecutor {
        let config = SyncConfig::builder()
            .source("/unused")
            .destination(destination)
            .concurrency(1usize)
            .build()
            .unwrap();
        SyncExecutor::new(&config).unwrap()
    }

    #[test]
    fn test_target_rebuilds_nested_path() {
        let temp = TempDir::new().unwrap();
        let entry = Entry::file("a/b/c.txt", temp.path().join("c.txt"), 0o644, 0);

        let target = executor(temp.path()).target(&entry);
        assert_eq!(target, temp.path().join("a").join("b").join("c.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_target_decodes_escaped_key() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let entry = Entry::file("d/a\\xff", temp.path().join("x"), 0o644, 0);

        let target = executor(temp.path()).target(&entry);
        assert_eq!(target, temp.path().join("d").join(OsStr::from_bytes(b"a\xff")));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_link_is_skipped() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("link");
        fs::create_dir(temp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), &link).unwrap();
        let entry = Entry::file("link", &link, 0o777, 4);

        let outcome = executor(&temp.path().join("dst")).copy_one(&entry);
        assert_eq!(outcome, EntryOutcome::skipped("symlink to a directory"));
    }
}
