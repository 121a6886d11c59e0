//! Chain executor

use docmig_tree::{Node, Scalar, ScalarStyle};
use tracing::{info, info_span};

use crate::chain::MigrationChain;
use crate::error::MigrationError;
use crate::step::StepContext;
use crate::version::Version;

/// Key of the root version marker
pub const VERSION_KEY: &str = "version";

/// Versions a successful migration passed through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    pub from: Version,
    pub to: Version,
    /// `(from, to)` of each applied step, in order
    pub steps: Vec<(Version, Version)>,
}

/// Read the root `version` marker
///
/// # Errors
/// [`MigrationError::MissingVersion`] when absent or not a scalar,
/// [`MigrationError::Version`] when malformed
pub fn declared_version(root: &Node) -> Result<Version, MigrationError> {
    let text = root
        .get(VERSION_KEY)
        .and_then(Node::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(MigrationError::MissingVersion)?;
    Ok(text.parse()?)
}

/// Write the root `version` marker, keeping its quoting style
///
/// A missing marker is inserted as the first key. Non-mapping roots are left
/// alone.
pub fn set_version(root: &mut Node, version: Version) {
    let Some(map) = root.as_mapping_mut() else {
        return;
    };
    match map.get_mut(VERSION_KEY).and_then(Node::as_scalar_mut) {
        Some(scalar) => scalar.set_value(version.to_string()),
        None => {
            let marker = Node::from(Scalar::new(version.to_string(), ScalarStyle::Plain));
            if map.contains_key(VERSION_KEY) {
                map.insert(VERSION_KEY, marker);
            } else {
                map.insert_at(0, VERSION_KEY, marker);
            }
        }
    }
}

/// Migrate `user` from `from` to `to` through `chain`
///
/// Steps are walked strictly linearly: the step starting at the current
/// version runs, the version marker becomes its `to`, and so on. The
/// document is only replaced once the whole walk succeeded.
///
/// # Errors
/// - [`MigrationError::AlreadyUpToDate`] when `from == to`
/// - [`MigrationError::NoMigrationPath`] when the chain stops short
/// - anything a step reports
pub fn migrate_node(
    user: &mut Node,
    from: Version,
    to: Version,
    chain: &MigrationChain,
    ctx: &StepContext,
) -> Result<MigrationSummary, MigrationError> {
    if from == to {
        return Err(MigrationError::AlreadyUpToDate(from));
    }

    let mut working = user.clone();
    let mut applied = Vec::new();
    let mut current = from;
    while current != to {
        let Some(step) = chain.step_from(current).filter(|s| s.to <= to) else {
            return Err(MigrationError::NoMigrationPath {
                from,
                to,
                reached: current,
            });
        };
        let span = info_span!("migration_step", from = %step.from, to = %step.to);
        let _guard = span.enter();

        step.run(&mut working, ctx)?;
        set_version(&mut working, step.to);
        info!("migration step applied");

        applied.push((step.from, step.to));
        current = step.to;
    }

    *user = working;
    info!(%from, %to, steps = applied.len(), "document migrated");
    Ok(MigrationSummary {
        from,
        to,
        steps: applied,
    })
}
