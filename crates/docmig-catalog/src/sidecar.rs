//! Auxiliary files written next to a migrated document

use std::fs;
use std::path::Path;

use docmig_engine::{MigrationError, StepContext};
use tracing::{debug, warn};

/// Write `contents` to `relative` under the project directory unless a file
/// is already there
///
/// Returns whether the file was written. Without a project directory the
/// write is skipped.
///
/// # Errors
/// [`MigrationError::Io`] when the directory or file can't be created
pub fn write_if_absent(
    ctx: &StepContext,
    relative: &str,
    contents: &[u8],
) -> Result<bool, MigrationError> {
    let Some(project) = ctx.project_dir() else {
        warn!(file = relative, "no project directory, skipping sidecar file");
        return Ok(false);
    };
    write_under(project, relative, contents)
}

fn write_under(project: &Path, relative: &str, contents: &[u8]) -> Result<bool, MigrationError> {
    let path = project.join(relative);
    if path.exists() {
        debug!(path = %path.display(), "sidecar file already present");
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MigrationError::io(parent, e))?;
    }
    fs::write(&path, contents).map_err(|e| MigrationError::io(&path, e))?;
    debug!(path = %path.display(), "sidecar file written");
    Ok(true)
}
