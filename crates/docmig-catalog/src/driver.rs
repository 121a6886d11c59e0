//! File-level migration: read, detect, migrate, write back

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use docmig_engine::{
    declared_version, migrate_node, ChainError, MigrationChain, MigrationError, StepContext,
    Version,
};
use docmig_tree::{Document, Node, ParseError};
use serde::{Serialize, Serializer};
use tracing::{debug, info, info_span};

use crate::options::MigrationOptions;
use crate::{config, context};

/// Which registered chain a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Devnet context (`context:` root key)
    Context,
    /// Project config (`config:` root key)
    Config,
}

impl DocumentKind {
    /// Kind implied by the root's top-level section
    #[must_use]
    pub fn detect(root: &Node) -> Option<Self> {
        if root.get("context").is_some_and(Node::is_mapping) {
            Some(Self::Context)
        } else if root.get("config").is_some_and(Node::is_mapping) {
            Some(Self::Config)
        } else {
            None
        }
    }

    /// Registered steps for this kind
    ///
    /// # Errors
    /// [`ChainError`] if the registration is inconsistent
    pub fn chain(self) -> Result<MigrationChain, ChainError> {
        match self {
            Self::Context => context::context_chain(),
            Self::Config => config::config_chain(),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "context" => Ok(Self::Context),
            "config" => Ok(Self::Config),
            other => Err(DriverError::UnknownKind(other.to_string())),
        }
    }
}

/// What [`migrate_file`] did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Declared version already equals the target; the file is untouched
    UpToDate {
        #[serde(serialize_with = "display")]
        version: Version,
    },
    Migrated {
        #[serde(serialize_with = "display")]
        from: Version,
        #[serde(serialize_with = "display")]
        to: Version,
        /// Number of steps applied
        steps: usize,
        /// False for dry runs
        written: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        backup: Option<PathBuf>,
        /// Migrated text, kept only for dry runs
        #[serde(skip)]
        preview: Option<String>,
    },
}

/// Declared versus latest version of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub path: PathBuf,
    pub kind: DocumentKind,
    #[serde(serialize_with = "display")]
    pub declared: Version,
    #[serde(serialize_with = "display_opt")]
    pub latest: Option<Version>,
    pub up_to_date: bool,
}

fn display<S: Serializer, T: fmt::Display>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn display_opt<S: Serializer, T: fmt::Display>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_none(),
    }
}

/// Errors from the file driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("unknown document kind '{0}' (expected context or config)")]
    UnknownKind(String),

    #[error("cannot tell whether {} is a context or a config document", .0.display())]
    UnsupportedDocument(PathBuf),

    #[error("invalid migration registry: {0}")]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl DriverError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

struct Loaded {
    document: Document,
    kind: DocumentKind,
    chain: MigrationChain,
    declared: Version,
}

fn load(path: &Path, kind: Option<DocumentKind>) -> Result<Loaded, DriverError> {
    let text = fs::read_to_string(path).map_err(|e| DriverError::io(path, e))?;
    let document = Document::parse(&text).map_err(|source| DriverError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let kind = match kind {
        Some(kind) => kind,
        None => DocumentKind::detect(document.root())
            .ok_or_else(|| DriverError::UnsupportedDocument(path.to_path_buf()))?,
    };
    let chain = kind.chain()?;
    let declared = declared_version(document.root())?;
    debug!(path = %path.display(), %kind, %declared, "document loaded");
    Ok(Loaded {
        document,
        kind,
        chain,
        declared,
    })
}

/// Report where a document stands without changing it
///
/// # Errors
/// [`DriverError`] when the file can't be read, parsed, or classified
pub fn status(path: &Path, kind: Option<DocumentKind>) -> Result<StatusReport, DriverError> {
    let loaded = load(path, kind)?;
    let latest = loaded.chain.latest();
    Ok(StatusReport {
        path: path.to_path_buf(),
        kind: loaded.kind,
        declared: loaded.declared,
        latest,
        up_to_date: latest.map_or(true, |v| v == loaded.declared),
    })
}

/// Migrate the document at `path` in place
///
/// The kind is detected from the root when `kind` is `None`. The target is
/// `options.target` or the chain's latest version. Sidecar files go to
/// `options.project_dir`, falling back to the document's directory; dry runs
/// write nothing at all. The new text replaces the file through a rename so a
/// failed write never leaves a truncated document behind.
///
/// # Errors
/// [`DriverError`] on I/O, parse, detection, or migration failure. The
/// original file is untouched on error.
pub fn migrate_file(
    path: &Path,
    kind: Option<DocumentKind>,
    options: &MigrationOptions,
) -> Result<MigrationOutcome, DriverError> {
    let span = info_span!("migrate_file", path = %path.display());
    let _guard = span.enter();

    let Loaded {
        mut document,
        kind,
        chain,
        declared,
    } = load(path, kind)?;
    let target = options.target.or_else(|| chain.latest()).unwrap_or(declared);
    if declared == target {
        info!(%kind, version = %declared, "document is up to date");
        return Ok(MigrationOutcome::UpToDate { version: declared });
    }

    let mut ctx = StepContext::new();
    if !options.dry_run {
        let project = options
            .project_dir
            .clone()
            .unwrap_or_else(|| document_dir(path));
        ctx = ctx.with_project_dir(project);
    }

    let summary = migrate_node(document.root_mut(), declared, target, &chain, &ctx)?;
    let text = document.to_yaml_string();

    if options.dry_run {
        info!(%kind, from = %summary.from, to = %summary.to, "dry run, nothing written");
        return Ok(MigrationOutcome::Migrated {
            from: summary.from,
            to: summary.to,
            steps: summary.steps.len(),
            written: false,
            backup: None,
            preview: Some(text),
        });
    }

    let backup = if options.backup {
        let backup = backup_path(path);
        fs::copy(path, &backup).map_err(|e| DriverError::io(&backup, e))?;
        debug!(backup = %backup.display(), "original saved");
        Some(backup)
    } else {
        None
    };
    replace_file(path, &text)?;
    info!(%kind, from = %summary.from, to = %summary.to, "document written");

    Ok(MigrationOutcome::Migrated {
        from: summary.from,
        to: summary.to,
        steps: summary.steps.len(),
        written: true,
        backup,
        preview: None,
    })
}

fn document_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<file>.bak` next to the original
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

fn replace_file(path: &Path, text: &str) -> Result<(), DriverError> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".docmig-tmp");
    let staging = path.with_file_name(name);
    fs::write(&staging, text).map_err(|e| DriverError::io(&staging, e))?;
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(DriverError::io(path, err));
    }
    Ok(())
}
