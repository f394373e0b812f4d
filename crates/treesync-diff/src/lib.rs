//! Change detection for treesync.
//!
//! This crate compares a source and a destination [`TreeIndex`] and decides
//! what must change in the destination:
//!
//! - **Missing entries** - copied (directories are only created)
//! - **Changed files** - detected by content digest (MD5, CRC-32 or BLAKE3)
//! - **Type changes** - the destination entry is deleted, the source one copied
//! - **Extra entries** - deleted
//!
//! ```rust,ignore
//! use treesync_core::SyncConfig;
//! use treesync_diff::DiffEngine;
//! use treesync_scan::scan_tree;
//!
//! let config = SyncConfig::new("/data/src", "/data/dst");
//! let source = scan_tree(&config.source).unwrap();
//! let destination = scan_tree(&config.destination).unwrap();
//!
//! let plan = DiffEngine::new(&config).unwrap().diff(&source, &destination);
//! for entry in &plan.copy {
//!     println!("copy {}", entry.display_path());
//! }
//! ```

mod engine;
mod hasher;

pub use engine::DiffEngine;
pub use hasher::FileHasher;

// Re-export core types
pub use treesync_core::{ActionList, Digest, HashAlgorithm, SyncPlan};
pub use treesync_scan::TreeIndex;
