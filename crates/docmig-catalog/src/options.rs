//! File driver configuration

use std::path::PathBuf;

use docmig_engine::Version;

/// How [`migrate_file`](crate::migrate_file) runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Where sidecar files go; the document's directory when unset
    pub project_dir: Option<PathBuf>,
    /// Migrate and report without touching the disk
    pub dry_run: bool,
    /// Copy the original to `<file>.bak` before overwriting it
    pub backup: bool,
    /// Stop at this version instead of the chain's latest
    pub target: Option<Version>,
}

impl MigrationOptions {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: Version) -> Self {
        self.target = Some(target);
        self
    }
}
