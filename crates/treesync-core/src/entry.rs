//! Scanned filesystem entries and their action ordering.

use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::key::key_to_path;

/// Type of a scanned entry.
///
/// Anything the directory listing does not report as a directory (regular
/// files, symlinks, special files) is a `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Non-directory object.
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }
}

/// One filesystem object found under a scanned root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Root-relative key, segments joined with `/`. Unique within a tree.
    ///
    /// Built with [`relative_key`](crate::relative_key), so names that are
    /// not valid UTF-8 are escaped rather than lost.
    pub relative_path: CompactString,

    /// Location of the object on disk.
    #[serde(serialize_with = "serialize_lossy")]
    pub absolute_path: PathBuf,

    /// File or directory.
    pub kind: EntryKind,

    /// Permission bits applied when the entry is recreated elsewhere.
    pub mode: u32,

    /// Size in bytes as listed (0 for directories).
    pub size: u64,
}

impl Entry {
    /// Create a file entry.
    pub fn file(
        relative_path: impl Into<CompactString>,
        absolute_path: impl Into<PathBuf>,
        mode: u32,
        size: u64,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
            kind: EntryKind::File,
            mode,
            size,
        }
    }

    /// Create a directory entry.
    pub fn directory(
        relative_path: impl Into<CompactString>,
        absolute_path: impl Into<PathBuf>,
        mode: u32,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
            kind: EntryKind::Directory,
            mode,
            size: 0,
        }
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Relative path with a trailing `/` for directories.
    pub fn display_path(&self) -> String {
        if self.is_dir() {
            format!("{}/", self.relative_path)
        } else {
            self.relative_path.to_string()
        }
    }

    /// The on-disk root-relative path this entry's key stands for.
    pub fn relative_location(&self) -> PathBuf {
        key_to_path(&self.relative_path)
    }

    /// Check if `self` lies strictly below the directory at `ancestor`.
    pub fn is_below(&self, ancestor: &str) -> bool {
        is_descendant(&self.relative_path, ancestor)
    }
}

/// Serialize a path as text, replacing invalid UTF-8.
fn serialize_lossy<S: serde::Serializer>(path: &PathBuf, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Check if relative `path` lies strictly below relative `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Ordering used by copy lists: directories first, then ascending path.
///
/// A parent path is a strict prefix of its children, so it always sorts
/// first among directories. Delete lists use the reverse.
pub fn action_order(a: &Entry, b: &Entry) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.relative_path.cmp(&b.relative_path),
    }
}

/// Extract the permission bits of `metadata`.
#[cfg(unix)]
pub fn mode_of(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

/// Extract the permission bits of `metadata`.
///
/// Only the read-only flag exists here, so it maps onto write bits.
#[cfg(not(unix))]
pub fn mode_of(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_sort_before_files() {
        let dir = Entry::directory("z", "/src/z", 0o755);
        let file = Entry::file("a.txt", "/src/a.txt", 0o644, 1);

        assert_eq!(action_order(&dir, &file), Ordering::Less);
        assert_eq!(action_order(&file, &dir), Ordering::Greater);
    }

    #[test]
    fn test_parent_before_child() {
        let parent = Entry::directory("a", "/src/a", 0o755);
        let child = Entry::directory("a/b", "/src/a/b", 0o755);
        let sibling = Entry::directory("a-b", "/src/a-b", 0o755);

        assert_eq!(action_order(&parent, &child), Ordering::Less);
        assert_eq!(action_order(&parent, &sibling), Ordering::Less);
    }

    #[test]
    fn test_is_below() {
        let entry = Entry::file("a/b/c.txt", "/src/a/b/c.txt", 0o644, 0);

        assert!(entry.is_below("a"));
        assert!(entry.is_below("a/b"));
        assert!(!entry.is_below("a/b/c.txt"));
        assert!(!entry.is_below("a/"));
        assert!(!Entry::file("ab/c", "/src/ab/c", 0o644, 0).is_below("a"));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(Entry::directory("a", "/src/a", 0o755).display_path(), "a/");
        assert_eq!(Entry::file("a/x.txt", "/src/a/x.txt", 0o644, 2).display_path(), "a/x.txt");
    }
}
