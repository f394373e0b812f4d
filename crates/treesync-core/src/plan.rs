//! Ordered action lists and the sync plan.

use serde::{Deserialize, Serialize};

use crate::entry::{Entry, action_order};
use crate::error::EntryError;

/// An ordered list of entries to copy or delete.
///
/// The order is fixed at construction: [`ActionList::copies`] sorts so that
/// every directory precedes its descendants, [`ActionList::deletes`] sorts so
/// that every directory follows its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionList(Vec<Entry>);

impl ActionList {
    /// Build a copy list: directories first, then ascending path.
    pub fn copies(mut entries: Vec<Entry>) -> Self {
        entries.sort_by(action_order);
        Self(entries)
    }

    /// Build a delete list: the reverse of the copy ordering.
    pub fn deletes(mut entries: Vec<Entry>) -> Self {
        entries.sort_by(|a, b| action_order(b, a));
        Self(entries)
    }

    /// Entries in application order.
    pub fn entries(&self) -> &[Entry] {
        &self.0
    }

    /// Iterate entries in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Relative paths in application order.
    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.relative_path.as_str()).collect()
    }

    /// Total listed size of the file entries.
    pub fn total_bytes(&self) -> u64 {
        self.0.iter().filter(|e| e.is_file()).map(|e| e.size).sum()
    }

    pub fn into_inner(self) -> Vec<Entry> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ActionList {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of comparing two trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Source entries to create or overwrite in the destination.
    pub copy: ActionList,

    /// Destination entries to remove.
    pub delete: ActionList,

    /// Files whose comparison failed while hashing.
    pub hash_failures: Vec<EntryError>,
}

impl SyncPlan {
    /// Check if the destination already matches the source.
    pub fn is_empty(&self) -> bool {
        self.copy.is_empty() && self.delete.is_empty()
    }

    /// One-line description of the plan.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} to copy, {} to delete",
            self.copy.len(),
            self.delete.len()
        );
        if !self.hash_failures.is_empty() {
            summary.push_str(&format!(", {} unreadable", self.hash_failures.len()));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Entry> {
        vec![
            Entry::file("b.txt", "/r/b.txt", 0o644, 3),
            Entry::file("a/x.txt", "/r/a/x.txt", 0o644, 2),
            Entry::directory("a/sub", "/r/a/sub", 0o755),
            Entry::directory("a", "/r/a", 0o755),
            Entry::file("a/sub/y.txt", "/r/a/sub/y.txt", 0o644, 1),
        ]
    }

    #[test]
    fn test_copy_order() {
        let list = ActionList::copies(sample());
        assert_eq!(
            list.paths(),
            vec!["a", "a/sub", "a/sub/y.txt", "a/x.txt", "b.txt"]
        );
        assert_eq!(list.total_bytes(), 6);
    }

    #[test]
    fn test_delete_order_is_reversed() {
        let list = ActionList::deletes(sample());
        assert_eq!(
            list.paths(),
            vec!["b.txt", "a/x.txt", "a/sub/y.txt", "a/sub", "a"]
        );
    }

    #[test]
    fn test_plan_summary() {
        let plan = SyncPlan {
            copy: ActionList::copies(sample()),
            delete: ActionList::default(),
            hash_failures: vec![EntryError::new("c.txt", "denied")],
        };
        assert!(!plan.is_empty());
        assert_eq!(plan.summary(), "5 to copy, 0 to delete, 1 unreadable");
    }
}
