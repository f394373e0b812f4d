//! Tree scanning for treesync.
//!
//! This crate walks a directory tree with jwalk and indexes the result by
//! root-relative path.
//!
//! # Overview
//!
//! - **Depth-first order**: every directory precedes its children
//! - **All-or-nothing**: an unreadable directory fails the whole scan
//! - **O(1) lookup**: [`TreeIndex`] maps relative paths to entries
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use treesync_scan::{Scanner, TreeIndex};
//!
//! let entries = Scanner::new().scan(Path::new("/path/to/tree")).unwrap();
//! let index = TreeIndex::from_entries(entries);
//!
//! println!("{} entries", index.len());
//! ```

mod index;
mod scanner;

pub use index::TreeIndex;
pub use scanner::Scanner;

// Re-export core types for convenience
pub use treesync_core::{Entry, EntryKind, ScanError};

/// Scan `root` and index the result.
pub fn scan_tree(root: &std::path::Path) -> Result<TreeIndex, ScanError> {
    Scanner::new().scan(root).map(TreeIndex::from_entries)
}
