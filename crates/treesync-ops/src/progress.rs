//! Progress reporting for plan execution.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use compact_str::CompactString;
use tokio::sync::broadcast;

use treesync_core::{ActionKind, EntryOutcome};

/// Snapshot published after each entry of a plan is resolved.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    /// Action of the entry just resolved.
    pub action: ActionKind,
    /// Relative path of the entry just resolved.
    pub path: CompactString,
    /// Number of entries resolved so far, including failures and skips.
    pub entries_completed: usize,
    /// Total number of entries in the plan.
    pub entries_total: usize,
    /// File bytes written so far.
    pub bytes_copied: u64,
    /// Listed size of all files to copy.
    pub bytes_total: u64,
    /// Entries that failed so far.
    pub failures: usize,
}

impl SyncProgress {
    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.bytes_total > 0 {
            (self.bytes_copied as f64 / self.bytes_total as f64) * 100.0
        } else if self.entries_total > 0 {
            (self.entries_completed as f64 / self.entries_total as f64) * 100.0
        } else {
            100.0
        }
    }

    /// Check if every entry has been resolved.
    pub fn is_complete(&self) -> bool {
        self.entries_completed >= self.entries_total
    }
}

/// Shared counters behind the published snapshots.
///
/// Updated from worker threads, so every counter is atomic.
#[derive(Debug)]
pub(crate) struct ProgressTracker<'a> {
    tx: &'a broadcast::Sender<SyncProgress>,
    entries_total: usize,
    bytes_total: u64,
    entries_completed: AtomicUsize,
    bytes_copied: AtomicU64,
    failures: AtomicUsize,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(tx: &'a broadcast::Sender<SyncProgress>, entries_total: usize, bytes_total: u64) -> Self {
        Self {
            tx,
            entries_total,
            bytes_total,
            entries_completed: AtomicUsize::new(0),
            bytes_copied: AtomicU64::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Count one resolved entry and publish a snapshot.
    pub fn record(&self, action: ActionKind, path: &str, outcome: &EntryOutcome) {
        let entries_completed = self.entries_completed.fetch_add(1, Ordering::Relaxed) + 1;
        let bytes = match outcome {
            EntryOutcome::Applied { bytes } => *bytes,
            _ => 0,
        };
        let bytes_copied = self.bytes_copied.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let failures = if outcome.is_failed() {
            self.failures.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.failures.load(Ordering::Relaxed)
        };

        // No subscribers is fine.
        let _ = self.tx.send(SyncProgress {
            action,
            path: path.into(),
            entries_completed,
            entries_total: self.entries_total,
            bytes_copied,
            bytes_total: self.bytes_total,
            failures,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesync_core::EntryError;

    #[test]
    fn test_tracker_publishes_snapshots() {
        let (tx, mut rx) = broadcast::channel(16);
        let tracker = ProgressTracker::new(&tx, 2, 10);

        tracker.record(ActionKind::Copy, "a.txt", &EntryOutcome::Applied { bytes: 10 });
        tracker.record(
            ActionKind::Delete,
            "b.txt",
            &EntryError::new("b.txt", "denied").into(),
        );

        let first = rx.try_recv().unwrap();
        assert_eq!(first.entries_completed, 1);
        assert_eq!(first.bytes_copied, 10);
        assert_eq!(first.percentage(), 100.0);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.path, "b.txt");
        assert_eq!(second.failures, 1);
        assert!(second.is_complete());
    }

    #[test]
    fn test_percentage_without_bytes() {
        let progress = SyncProgress {
            action: ActionKind::Delete,
            path: "x".into(),
            entries_completed: 1,
            entries_total: 4,
            bytes_copied: 0,
            bytes_total: 0,
            failures: 0,
        };
        assert_eq!(progress.percentage(), 25.0);
    }
}
