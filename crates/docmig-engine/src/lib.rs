//! Versioned structural migrations
//!
//! Moves a user-owned document from an older schema version to a newer one,
//! one registered step per adjacent version pair, deciding per field whether
//! to keep the user's value or adopt the new default.
//!
//! # Core Concepts
//!
//! - [`Version`]: ordered `MAJOR.MINOR.PATCH` schema version
//! - [`Condition`] / [`PatchRule`] / [`PatchEngine`]: conditional field edits
//! - [`MigrationStep`]: one version transition with its embedded defaults
//! - [`MigrationChain`]: validated, immutable step catalog
//! - [`migrate_node`]: walk the chain from the declared to the target version
//!
//! # Example
//!
//! ```rust,ignore
//! use docmig_engine::{migrate_node, declared_version, StepContext};
//!
//! let from = declared_version(&root)?;
//! let to = chain.latest().unwrap_or(from);
//! migrate_node(&mut root, from, to, &chain, &StepContext::new())?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod chain;
mod condition;
mod error;
mod migrator;
mod patch;
mod step;
mod version;

pub use chain::MigrationChain;
pub use condition::Condition;
pub use error::{ChainError, MigrationError, VersionError};
pub use migrator::{declared_version, migrate_node, set_version, MigrationSummary, VERSION_KEY};
pub use patch::{PatchEngine, PatchReport, PatchRule, Transform};
pub use step::{Defaults, MigrationStep, StepContext, StepFn};
pub use version::Version;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
