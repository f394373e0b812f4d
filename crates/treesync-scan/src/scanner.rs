//! JWalk-based directory scanner.

use std::fs::Metadata;
use std::path::Path;
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use treesync_core::{Entry, ScanError, mode_of, relative_key};

/// Scanner producing the entries below a root in depth-first order.
///
/// Siblings are sorted by name and every directory is emitted before its
/// children. The first unreadable directory aborts the scan.
///
/// Links are not followed. Every symlink is a file entry, including one
/// that points at a directory; the executor skips copying those.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    threads: usize,
}

impl Scanner {
    /// Create a scanner that reads directories on the default rayon pool.
    pub fn new() -> Self {
        Self { threads: 0 }
    }

    /// Create a scanner with its own pool of `threads` readers (0 = default pool).
    pub fn with_threads(threads: usize) -> Self {
        Self { threads }
    }

    /// Scan everything below `root`. The root itself is not included.
    pub fn scan(&self, root: &Path) -> Result<Vec<Entry>, ScanError> {
        let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root_path)
            .parallelism(parallelism)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(0);

        let mut entries = Vec::new();

        for entry_result in walker {
            let entry = entry_result.map_err(walk_error)?;
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let metadata = entry.metadata().map_err(walk_error)?;
            let relative_path = relative_key(path.strip_prefix(&root_path).unwrap_or(&path));

            if entry.file_type().is_dir() {
                entries.push(Entry::directory(relative_path, path, mode_of(&metadata)));
            } else {
                let metadata = resolved_metadata(&path, metadata);
                entries.push(Entry::file(
                    relative_path,
                    path,
                    mode_of(&metadata),
                    metadata.len(),
                ));
            }
        }

        debug!(root = %root_path.display(), entries = entries.len(), "scan complete");
        Ok(entries)
    }
}

/// Mode and size of a symlink come from its target when that is a file.
///
/// Dangling links and links to directories keep the link's own metadata.
fn resolved_metadata(path: &Path, metadata: Metadata) -> Metadata {
    if !metadata.file_type().is_symlink() {
        return metadata;
    }
    match std::fs::metadata(path) {
        Ok(target) if target.is_file() => target,
        _ => metadata,
    }
}

fn walk_error(err: jwalk::Error) -> ScanError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => ScanError::io(path, source),
        None => ScanError::Walk { path, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/.hidden"), "another file here").unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let entries = Scanner::new().scan(temp.path()).unwrap();

        let keys: Vec<&str> = entries.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(keys.len(), 7);
        assert!(keys.contains(&"dir1/subdir/file3.txt"));
        assert!(keys.contains(&"dir2/.hidden"));
        assert!(!keys.contains(&""));
    }

    #[test]
    fn test_parents_precede_children() {
        let temp = create_test_tree();
        let entries = Scanner::with_threads(2).scan(temp.path()).unwrap();

        for (i, entry) in entries.iter().enumerate() {
            if let Some((parent, _)) = entry.relative_path.rsplit_once('/') {
                let parent_pos = entries
                    .iter()
                    .position(|e| e.relative_path == parent)
                    .unwrap();
                assert!(parent_pos < i, "{parent} must precede {}", entry.relative_path);
                assert!(entries[parent_pos].is_dir());
            }
        }
    }

    #[test]
    fn test_entry_metadata() {
        let temp = create_test_tree();
        let entries = Scanner::new().scan(temp.path()).unwrap();

        let file = entries
            .iter()
            .find(|e| e.relative_path == "dir1/file2.txt")
            .unwrap();
        assert!(file.is_file());
        assert_eq!(file.size, 17);
        assert!(file.absolute_path.ends_with("dir1/file2.txt"));

        let dir = entries.iter().find(|e| e.relative_path == "dir1").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = Scanner::new().scan(&temp.path().join("nope"));
        assert!(matches!(result, Err(ScanError::NotFound { .. })));
    }

    #[test]
    fn test_root_is_file() {
        let temp = create_test_tree();
        let result = Scanner::new().scan(&temp.path().join("file1.txt"));
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_aborts() {
        use std::os::unix::fs::PermissionsExt;

        let temp = create_test_tree();
        let locked = temp.path().join("dir2");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = Scanner::new().scan(temp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_siblings_keep_distinct_keys() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let ff = temp.path().join(OsStr::from_bytes(b"a\xff"));
        let fe = temp.path().join(OsStr::from_bytes(b"a\xfe"));
        if fs::write(&ff, "one").is_err() {
            // Filesystem only accepts UTF-8 names.
            return;
        }
        fs::write(&fe, "two").unwrap();

        let entries = Scanner::new().scan(temp.path()).unwrap();
        let mut keys: Vec<&str> = entries.iter().map(|e| e.relative_path.as_str()).collect();
        keys.sort();

        assert_eq!(keys, vec!["a\\xfe", "a\\xff"]);
        let ff_entry = entries.iter().find(|e| e.relative_path == "a\\xff").unwrap();
        assert_eq!(ff_entry.relative_location(), Path::new(OsStr::from_bytes(b"a\xff")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_files() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path().join("file1.txt"), temp.path().join("to_file")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("dir1"), temp.path().join("to_dir")).unwrap();

        let entries = Scanner::new().scan(temp.path()).unwrap();
        let to_file = entries.iter().find(|e| e.relative_path == "to_file").unwrap();
        let to_dir = entries.iter().find(|e| e.relative_path == "to_dir").unwrap();

        assert!(to_file.is_file());
        assert_eq!(to_file.size, 5);
        assert!(to_dir.is_file());
        assert!(!entries.iter().any(|e| e.relative_path.starts_with("to_dir/")));
    }
}
