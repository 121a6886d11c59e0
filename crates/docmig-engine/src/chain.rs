//! Ordered step catalogs

use std::collections::HashSet;

use crate::error::ChainError;
use crate::step::MigrationStep;
use crate::version::Version;

/// Immutable, validated list of migration steps
///
/// Every step moves forward and no two steps start at the same version, so
/// walking from any version is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MigrationChain {
    steps: Vec<MigrationStep>,
}

impl MigrationChain {
    /// Validate and freeze `steps`
    ///
    /// # Errors
    /// [`ChainError::NotForward`] for a step with `from >= to`,
    /// [`ChainError::DuplicateFrom`] when two steps share a start
    pub fn new(steps: Vec<MigrationStep>) -> Result<Self, ChainError> {
        let mut starts = HashSet::with_capacity(steps.len());
        for step in &steps {
            if step.from >= step.to {
                return Err(ChainError::NotForward {
                    from: step.from,
                    to: step.to,
                });
            }
            if !starts.insert(step.from) {
                return Err(ChainError::DuplicateFrom(step.from));
            }
        }
        Ok(Self { steps })
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step starting at `version`
    #[must_use]
    pub fn step_from(&self, version: Version) -> Option<&MigrationStep> {
        self.steps.iter().find(|s| s.from == version)
    }

    /// Highest version any step reaches
    #[must_use]
    pub fn latest(&self) -> Option<Version> {
        self.steps.iter().map(|s| s.to).max()
    }

    /// Steps walked from `from` until `to` or a gap
    pub fn path(&self, from: Version, to: Version) -> impl Iterator<Item = &MigrationStep> {
        let mut current = from;
        std::iter::from_fn(move || {
            if current >= to {
                return None;
            }
            let step = self.step_from(current).filter(|s| s.to <= to)?;
            current = step.to;
            Some(step)
        })
    }
}
