//! Error types for migrations
//!
//! - [`MigrationError`]: running a chain or a patch set against a document
//! - [`ChainError`]: assembling an inconsistent step catalog
//! - [`VersionError`]: malformed version strings

use std::path::PathBuf;

use docmig_tree::{ParseError, PathError};

use crate::version::Version;

/// Errors while migrating a document
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Declared and target versions are equal; nothing to write
    #[error("document is already at version {0}")]
    AlreadyUpToDate(Version),

    /// The chain stops before the target
    #[error("no migration path from {from} to {to}: last reachable version is {reached}")]
    NoMigrationPath {
        from: Version,
        to: Version,
        reached: Version,
    },

    /// A rule or step addressed a path the document's shape can't hold
    #[error("structural mismatch at '{path}': {source}")]
    StructuralMismatch {
        path: String,
        #[source]
        source: PathError,
    },

    /// An embedded default document failed to parse
    #[error("failed to parse {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: ParseError,
    },

    /// A step's side effect failed on disk
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A step reported its own failure
    #[error("step {from} -> {to} failed: {message}")]
    Step {
        from: Version,
        to: Version,
        message: String,
    },

    /// Root has no `version` scalar
    #[error("document has no top-level version")]
    MissingVersion,

    /// Root `version` is not a version
    #[error(transparent)]
    Version(#[from] VersionError),
}

impl MigrationError {
    /// Wrap a path error raised at `path`
    pub fn structural(path: impl ToString, source: PathError) -> Self {
        Self::StructuralMismatch {
            path: path.to_string(),
            source,
        }
    }

    /// Wrap an io error raised at `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this only reports that no migration was needed
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Self::AlreadyUpToDate(_))
    }
}

/// Errors while building a [`MigrationChain`](crate::MigrationChain)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Step does not move to a higher version
    #[error("step {from} -> {to} does not move forward")]
    NotForward { from: Version, to: Version },

    /// Two steps start at the same version
    #[error("more than one step starts at version {0}")]
    DuplicateFrom(Version),
}

/// Malformed version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version '{0}': expected MAJOR.MINOR.PATCH")]
    Invalid(String),
}
