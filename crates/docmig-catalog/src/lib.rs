//! # docmig-catalog
//!
//! The registered migrations for the two versioned document kinds, devnet
//! contexts and project configs, plus the driver that applies them to files
//! on disk.
//!
//! # Core Concepts
//!
//! - **Chains**: [`context_chain`] and [`config_chain`] list every step with
//!   the default documents of the versions it connects
//! - **Driver**: [`migrate_file`] reads a document, walks its chain to the
//!   latest version, and replaces the file
//! - **Sidecars**: files a step drops into the project directory, never
//!   overwriting what the user has
//!
//! # Example
//!
//! ```rust,ignore
//! use docmig_catalog::{migrate_file, MigrationOptions};
//!
//! let options = MigrationOptions::new().with_backup(true);
//! let outcome = migrate_file(Path::new("config/contexts/devnet.yaml"), None, &options)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod context;
mod driver;
mod observability;
mod options;
pub mod sidecar;

pub use config::config_chain;
pub use context::context_chain;
pub use driver::{
    backup_path, migrate_file, status, DocumentKind, DriverError, MigrationOutcome, StatusReport,
};
pub use observability::{init_logging, LogFormat, LOG_FORMAT_ENV};
pub use options::MigrationOptions;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
