//! Per-version migration steps

use std::fmt;
use std::path::{Path, PathBuf};

use docmig_tree::{Document, Node};

use crate::error::MigrationError;
use crate::version::Version;

/// Parsed default documents of one transition
#[derive(Debug, Clone)]
pub struct Defaults {
    /// Default document as it was at the step's `from` version
    pub old: Node,
    /// Default document at the step's `to` version
    pub new: Node,
}

/// Environment a step may touch outside the document
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    project_dir: Option<PathBuf>,
}

impl StepContext {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory side-effect files are written into
    #[must_use]
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// `None` means side effects are skipped
    #[inline]
    #[must_use]
    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }
}

/// Body of a step: edit the user root given both defaults
pub type StepFn = fn(&mut Node, &Defaults, &StepContext) -> Result<(), MigrationError>;

/// Transition from one schema version to the next
///
/// Default documents are kept as embedded bytes and parsed only when the
/// step runs.
#[derive(Clone)]
pub struct MigrationStep {
    pub from: Version,
    pub to: Version,
    apply: StepFn,
    old_document: &'static [u8],
    new_document: &'static [u8],
}

impl MigrationStep {
    #[must_use]
    pub const fn new(
        from: Version,
        to: Version,
        old_document: &'static [u8],
        new_document: &'static [u8],
        apply: StepFn,
    ) -> Self {
        Self {
            from,
            to,
            apply,
            old_document,
            new_document,
        }
    }

    /// Parse both defaults
    ///
    /// # Errors
    /// [`MigrationError::Parse`] naming the default that failed
    pub fn defaults(&self) -> Result<Defaults, MigrationError> {
        Ok(Defaults {
            old: parse_default(self.old_document, self.from)?,
            new: parse_default(self.new_document, self.to)?,
        })
    }

    /// Run the step body against `user`
    ///
    /// Does not touch the `version` marker; the migrator does.
    ///
    /// # Errors
    /// Whatever the step body or default parsing reports
    pub fn run(&self, user: &mut Node, ctx: &StepContext) -> Result<(), MigrationError> {
        let defaults = self.defaults()?;
        (self.apply)(user, &defaults, ctx)
    }

    /// Step-reported failure for this transition
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> MigrationError {
        MigrationError::Step {
            from: self.from,
            to: self.to,
            message: message.into(),
        }
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

fn parse_default(bytes: &[u8], version: Version) -> Result<Node, MigrationError> {
    Document::from_slice(bytes)
        .map(Document::into_root)
        .map_err(|source| MigrationError::Parse {
            source_name: format!("default document v{version}"),
            source,
        })
}
