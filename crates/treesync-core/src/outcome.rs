//! Per-entry outcomes and the aggregated sync report.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::EntryError;

/// The kind of action applied to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionKind {
    Copy,
    Delete,
}

/// What happened to one entry of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryOutcome {
    /// The action was applied. `bytes` counts file content written.
    Applied { bytes: u64 },
    /// The action was not attempted.
    Skipped { reason: String },
    /// The action was attempted and failed.
    Failed { error: EntryError },
}

impl EntryOutcome {
    /// Create a skipped outcome.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<EntryError> for EntryOutcome {
    fn from(error: EntryError) -> Self {
        Self::Failed { error }
    }
}

/// The outcome of one entry, tagged with its action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: ActionKind,
    pub path: CompactString,
    pub outcome: EntryOutcome,
}

/// Aggregated outcomes of applying a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// One record per entry, in the order the entries were resolved.
    pub records: Vec<ActionRecord>,
}

impl SyncReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one entry.
    pub fn record(
        &mut self,
        action: ActionKind,
        path: impl Into<CompactString>,
        outcome: EntryOutcome,
    ) {
        self.records.push(ActionRecord {
            action,
            path: path.into(),
            outcome,
        });
    }

    /// Number of entries successfully copied.
    pub fn copied(&self) -> usize {
        self.count(|r| r.action == ActionKind::Copy && r.outcome.is_applied())
    }

    /// Number of entries successfully deleted.
    pub fn deleted(&self) -> usize {
        self.count(|r| r.action == ActionKind::Delete && r.outcome.is_applied())
    }

    /// Number of entries not attempted.
    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r.outcome, EntryOutcome::Skipped { .. }))
    }

    /// Number of entries that failed.
    pub fn failed(&self) -> usize {
        self.count(|r| r.outcome.is_failed())
    }

    /// Total file bytes written.
    pub fn bytes_copied(&self) -> u64 {
        self.records
            .iter()
            .map(|r| match r.outcome {
                EntryOutcome::Applied { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// Iterate the errors of failed entries.
    pub fn failures(&self) -> impl Iterator<Item = &EntryError> {
        self.records.iter().filter_map(|r| match &r.outcome {
            EntryOutcome::Failed { error } => Some(error),
            _ => None,
        })
    }

    /// Check if every entry was applied.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self) -> String {
        let mut summary = format!("Copied {} items, deleted {} items", self.copied(), self.deleted());
        if self.skipped() > 0 {
            summary.push_str(&format!(", {} skipped", self.skipped()));
        }
        if self.failed() > 0 {
            summary.push_str(&format!(", {} failed", self.failed()));
        }
        summary
    }

    fn count(&self, predicate: impl Fn(&ActionRecord) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(r)).count()
    }
}
