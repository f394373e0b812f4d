//! End-to-end sync run: validate, scan, diff, report, apply.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use treesync_core::{Side, SyncConfig, SyncError, SyncPlan, SyncReport, worker_pool};
use treesync_diff::DiffEngine;
use treesync_scan::{Scanner, TreeIndex};

use crate::executor::SyncExecutor;
use crate::progress::SyncProgress;
use crate::report::write_report;

/// Result of a sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// The computed plan.
    pub plan: SyncPlan,
    /// Outcomes of applying the plan; `None` for a dry run.
    pub report: Option<SyncReport>,
}

impl SyncOutcome {
    /// Check if nothing failed or was skipped.
    pub fn is_success(&self) -> bool {
        self.report.as_ref().is_none_or(SyncReport::is_success)
    }
}

/// Drives a complete sync of one source root onto one destination root.
///
/// The diff and apply phases share a single worker pool.
pub struct Synchronizer {
    config: SyncConfig,
    diff: DiffEngine,
    executor: SyncExecutor,
}

impl Synchronizer {
    /// Create a synchronizer for `config`.
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        if config.source == config.destination {
            return Err(SyncError::InvalidConfig {
                message: "Source and destination must be different paths".to_string(),
            });
        }

        let pool = Arc::new(worker_pool(config.effective_concurrency())?);
        let diff = DiffEngine::with_pool(&config, Arc::clone(&pool));
        let executor = SyncExecutor::with_pool(&config, pool);

        Ok(Self {
            config,
            diff,
            executor,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Subscribe to progress updates of the apply phase.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncProgress> {
        self.executor.subscribe()
    }

    /// Validate both roots, scan them and compute the plan.
    pub fn plan(&self) -> Result<SyncPlan, SyncError> {
        check_root(Side::Source, &self.config.source)?;
        check_root(Side::Destination, &self.config.destination)?;

        let source = self.index(Side::Source, &self.config.source)?;
        let destination = self.index(Side::Destination, &self.config.destination)?;

        Ok(self.diff.diff(&source, &destination))
    }

    /// Run the whole sync.
    ///
    /// Report files are written as soon as the plan is known, dry run or not.
    pub fn run(&self) -> Result<SyncOutcome, SyncError> {
        let plan = self.plan()?;
        info!(summary = %plan.summary(), "plan ready");

        if let Some(path) = &self.config.copy_report {
            write_report(path, &plan.copy)?;
        }
        if let Some(path) = &self.config.delete_report {
            write_report(path, &plan.delete)?;
        }

        if self.config.dry_run {
            info!("dry run, destination left untouched");
            return Ok(SyncOutcome { plan, report: None });
        }

        let started = Instant::now();
        let report = self.executor.execute(&plan);
        info!(
            summary = %report.summary(),
            elapsed = ?started.elapsed(),
            "sync complete"
        );

        Ok(SyncOutcome {
            plan,
            report: Some(report),
        })
    }

    fn index(&self, side: Side, root: &Path) -> Result<TreeIndex, SyncError> {
        let started = Instant::now();
        let entries = Scanner::with_threads(self.config.concurrency)
            .scan(root)
            .map_err(|e| SyncError::scan(side, e))?;
        let index = TreeIndex::from_entries(entries);
        debug!(
            %side,
            entries = index.len(),
            elapsed = ?started.elapsed(),
            "indexed"
        );
        Ok(index)
    }
}

/// Check that `path` exists and is a directory.
fn check_root(side: Side, path: &Path) -> Result<(), SyncError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SyncError::RootNotFound {
            side,
            path: path.to_path_buf(),
        },
        _ => SyncError::io(path, e),
    })?;

    if !metadata.is_dir() {
        return Err(SyncError::NotADirectory {
            side,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
