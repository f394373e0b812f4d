//! Core types and configuration for treesync.
//!
//! This crate provides the data structures shared by the scanner, the diff
//! engine and the executor: scanned entries, ordered action lists, the sync
//! plan, per-entry outcomes, configuration and errors.

mod config;
mod digest;
mod entry;
mod error;
mod key;
mod outcome;
mod plan;
mod pool;

pub use config::{HashErrorPolicy, SyncConfig, SyncConfigBuilder};
pub use digest::{Digest, HashAlgorithm};
pub use entry::{Entry, EntryKind, action_order, is_descendant, mode_of};
pub use error::{EntryError, ScanError, Side, SyncError};
pub use key::{key_to_path, relative_key};
pub use outcome::{ActionKind, ActionRecord, EntryOutcome, SyncReport};
pub use plan::{ActionList, SyncPlan};
pub use pool::worker_pool;
