//! Per-book directory materialization.

use std::path::Path;

use tracing::debug;

use bookpipe_shared::{BookPaths, BookPipeError, Result};

/// Create the five stage work directories for a book, with parents.
///
/// Idempotent: existing directories and their contents are left alone.
pub fn materialize(paths: &BookPaths) -> Result<()> {
    for dir in paths.work_dirs() {
        create_dir(dir)?;
    }
    debug!(root = %paths.root.display(), "work directories ready");
    Ok(())
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| BookPipeError::io(dir, e))
}
