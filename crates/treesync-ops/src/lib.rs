//! Plan execution engine for treesync.
//!
//! This crate applies a [`SyncPlan`] to a destination tree, reports progress
//! over a broadcast channel, writes the plan's report files and ties the
//! scan, diff and execute phases together in [`Synchronizer`].

mod copy;
mod executor;
mod progress;
mod report;
mod sync;

pub use executor::SyncExecutor;
pub use progress::SyncProgress;
pub use report::{write_report, write_reports};
pub use sync::{SyncOutcome, Synchronizer};

// Re-export core types for convenience
pub use treesync_core::{
    ActionKind, ActionList, EntryOutcome, SyncConfig, SyncError, SyncPlan, SyncReport,
};

/// Default channel buffer size for progress updates.
pub const PROGRESS_CHANNEL_SIZE: usize = 100;
