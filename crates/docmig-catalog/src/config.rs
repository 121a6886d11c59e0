//! Project config migrations (`version` + `config` mapping)

use docmig_engine::{
    ChainError, Condition, Defaults, MigrationChain, MigrationError, MigrationStep, PatchEngine,
    StepContext, Version,
};
use docmig_tree::{resolve_mut, Node, NodePath, Placement};
use tracing::{debug, warn};

const V0_0_1: &[u8] = include_bytes!("../defaults/config/v0.0.1.yaml");
const V0_0_2: &[u8] = include_bytes!("../defaults/config/v0.0.2.yaml");
const V0_0_3: &[u8] = include_bytes!("../defaults/config/v0.0.3.yaml");

/// Embedded default config document for `version`
#[must_use]
pub fn default_document(version: Version) -> Option<&'static [u8]> {
    match (version.major, version.minor, version.patch) {
        (0, 0, 1) => Some(V0_0_1),
        (0, 0, 2) => Some(V0_0_2),
        (0, 0, 3) => Some(V0_0_3),
        _ => None,
    }
}

/// Every config step, oldest first
///
/// # Errors
/// [`ChainError`] if the registered steps are inconsistent
pub fn config_chain() -> Result<MigrationChain, ChainError> {
    let v = |patch| Version::new(0, 0, patch);
    MigrationChain::new(vec![
        MigrationStep::new(v(1), v(2), V0_0_1, V0_0_2, project_identity),
        MigrationStep::new(v(2), v(3), V0_0_2, V0_0_3, template_keys),
    ])
}

fn has_project(user: &Node) -> bool {
    let present = user
        .get("config")
        .and_then(|c| c.get("project"))
        .is_some_and(Node::is_mapping);
    if !present {
        warn!("config document has no config.project mapping");
    }
    present
}

/// 0.0.1 -> 0.0.2: `project_uuid` and `telemetry_enabled`
fn project_identity(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    if !has_project(user) {
        return Ok(());
    }
    let project = NodePath::literal("config.project");
    PatchEngine::new(&defaults.old, &defaults.new)
        .adopt_placed(
            project.child("project_uuid"),
            Condition::IfMissing,
            Placement::after("name"),
        )
        .adopt(project.child("telemetry_enabled"), Condition::IfMissing)
        .apply(user)?;
    Ok(())
}

/// 0.0.2 -> 0.0.3: snake_case template URL, new template version
fn template_keys(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    if !has_project(user) {
        return Ok(());
    }
    let project = NodePath::literal("config.project");
    if let Some(keys) = resolve_mut(user, &project).and_then(Node::as_mapping_mut) {
        if keys.rename("templateBaseUrl", "template_base_url") {
            debug!("renamed config.project.templateBaseUrl to template_base_url");
        } else if keys.contains_key("templateBaseUrl") {
            warn!("both templateBaseUrl and template_base_url present, keeping both");
        }
    }
    PatchEngine::new(&defaults.old, &defaults.new)
        .adopt(project.child("template_version"), Condition::IfUnchanged)
        .apply(user)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_registered_in_order() {
        let chain = config_chain().unwrap();
        let steps: Vec<_> = chain
            .steps()
            .iter()
            .map(|s| (s.from.to_string(), s.to.to_string()))
            .collect();
        assert_eq!(
            steps,
            vec![
                ("0.0.1".to_string(), "0.0.2".to_string()),
                ("0.0.2".to_string(), "0.0.3".to_string()),
            ]
        );
        for step in chain.steps() {
            step.defaults().unwrap();
        }
        assert!(default_document(Version::new(0, 0, 4)).is_none());
    }
}
