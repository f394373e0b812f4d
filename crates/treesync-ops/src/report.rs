//! Plain-text report files listing planned actions.
//!
//! One entry per line in application order, directories marked with a
//! trailing `/`, lines terminated with CRLF.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use treesync_core::{ActionList, SyncError, SyncPlan};

const LINE_ENDING: &str = "\r\n";

/// Write `list` to `path`, replacing any existing file.
pub fn write_report(path: &Path, list: &ActionList) -> Result<(), SyncError> {
    let file = File::create(path).map_err(|e| SyncError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for entry in list {
        write!(writer, "{}{LINE_ENDING}", entry.display_path()).map_err(|e| SyncError::io(path, e))?;
    }
    writer.flush().map_err(|e| SyncError::io(path, e))?;

    debug!(path = %path.display(), entries = list.len(), "report written");
    Ok(())
}

/// Write the copy and delete lists of `plan`.
pub fn write_reports(copy_path: &Path, delete_path: &Path, plan: &SyncPlan) -> Result<(), SyncError> {
    write_report(copy_path, &plan.copy)?;
    write_report(delete_path, &plan.delete)
}
