//! Error types for scanning and synchronization.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Which tree of a sync an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Source,
    Destination,
}

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Traversal error without an underlying I/O error (e.g. a link loop).
    #[error("Walk error at {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors that stop a sync run before or between phases.
///
/// Failures of individual entries are not errors at this level; they are
/// carried as [`EntryError`] values inside plans and reports.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A root path does not exist.
    #[error("The {side} root does not exist: {path}")]
    RootNotFound { side: Side, path: PathBuf },

    /// A root path exists but is not a directory.
    #[error("The {side} root must be a directory: {path}")]
    NotADirectory { side: Side, path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Scanning one of the trees failed.
    #[error("Failed to scan the {side} tree")]
    Scan {
        side: Side,
        #[source]
        source: ScanError,
    },

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {message}")]
    WorkerPool { message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a scan error with the side it came from.
    pub fn scan(side: Side, source: ScanError) -> Self {
        Self::Scan { side, source }
    }
}

/// A failure tied to one entry, identified by its relative path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{path}: {message}")]
pub struct EntryError {
    /// Relative path of the entry.
    pub path: CompactString,
    /// A human-readable error message.
    pub message: String,
}

impl EntryError {
    /// Create a new entry error.
    pub fn new(path: impl Into<CompactString>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an entry error from an I/O error with a short context prefix.
    pub fn io(path: impl Into<CompactString>, context: &str, error: &std::io::Error) -> Self {
        Self::new(path, format!("{context}: {error}"))
    }
}
