//! Path-keyed lookup over a scan result.

use compact_str::CompactString;
use indexmap::IndexMap;

use treesync_core::Entry;

/// Immutable map from relative path to entry for one side of a sync.
///
/// Iteration follows scan order.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    entries: IndexMap<CompactString, Entry>,
}

impl TreeIndex {
    /// Build an index from a scan result.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.relative_path.clone(), entry))
            .collect();
        Self { entries }
    }

    /// Look up an entry by relative path.
    pub fn get(&self, relative_path: &str) -> Option<&Entry> {
        self.entries.get(relative_path)
    }

    /// Check if a relative path is present.
    pub fn contains(&self, relative_path: &str) -> bool {
        self.entries.contains_key(relative_path)
    }

    /// Iterate entries in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Entry> for TreeIndex {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let index = TreeIndex::from_entries(vec![
            Entry::directory("a", "/r/a", 0o755),
            Entry::file("a/x.txt", "/r/a/x.txt", 0o644, 2),
        ]);

        assert_eq!(index.len(), 2);
        assert!(index.contains("a/x.txt"));
        assert!(!index.contains("a/y.txt"));
        assert!(index.get("a").unwrap().is_dir());
    }

    #[test]
    fn test_iteration_keeps_scan_order() {
        let index: TreeIndex = vec![
            Entry::file("z.txt", "/r/z.txt", 0o644, 1),
            Entry::file("a.txt", "/r/a.txt", 0o644, 1),
        ]
        .into_iter()
        .collect();

        let keys: Vec<&str> = index.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(keys, vec!["z.txt", "a.txt"]);
    }
}
