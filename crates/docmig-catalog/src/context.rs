//! Context document migrations (`version` + `context` mapping)

use docmig_engine::{
    Condition, Defaults, MigrationChain, MigrationError, MigrationStep, PatchEngine, PatchRule,
    StepContext, Version,
};
use docmig_tree::{merge_missing, resolve, resolve_mut, Node, NodePath, Placement};
use tracing::{debug, warn};

use crate::sidecar;

const V0_0_1: &[u8] = include_bytes!("../defaults/context/v0.0.1.yaml");
const V0_0_2: &[u8] = include_bytes!("../defaults/context/v0.0.2.yaml");
const V0_0_3: &[u8] = include_bytes!("../defaults/context/v0.0.3.yaml");
const V0_0_4: &[u8] = include_bytes!("../defaults/context/v0.0.4.yaml");
const V0_0_5: &[u8] = include_bytes!("../defaults/context/v0.0.5.yaml");
const V0_0_6: &[u8] = include_bytes!("../defaults/context/v0.0.6.yaml");

const STAKER_KEYSTORE: &[u8] = include_bytes!("../defaults/keystores/staker1.keystore.json");

/// Keystore the 0.0.6 stakers entry points at, relative to the project
pub const STAKER_KEYSTORE_PATH: &str = "keystores/staker1.keystore.json";

/// Fork height every context is pinned to from 0.0.6 on
pub const FORK_BLOCK: &str = "22640530";

const CHAINS: [&str; 2] = ["l1", "l2"];

/// Embedded default context document for `version`
#[must_use]
pub fn default_document(version: Version) -> Option<&'static [u8]> {
    let bytes = match (version.major, version.minor, version.patch) {
        (0, 0, 1) => V0_0_1,
        (0, 0, 2) => V0_0_2,
        (0, 0, 3) => V0_0_3,
        (0, 0, 4) => V0_0_4,
        (0, 0, 5) => V0_0_5,
        (0, 0, 6) => V0_0_6,
        _ => return None,
    };
    Some(bytes)
}

/// Every context step, oldest first
///
/// # Errors
/// [`ChainError`](docmig_engine::ChainError) if the registered steps are inconsistent
pub fn context_chain() -> Result<MigrationChain, docmig_engine::ChainError> {
    let v = |patch| Version::new(0, 0, patch);
    MigrationChain::new(vec![
        MigrationStep::new(v(1), v(2), V0_0_1, V0_0_2, fork_block_time),
        MigrationStep::new(v(2), v(3), V0_0_2, V0_0_3, avs_metadata_and_eigenlayer),
        MigrationStep::new(v(3), v(4), V0_0_3, V0_0_4, l2_rpc_and_contracts),
        MigrationStep::new(v(4), v(5), V0_0_4, V0_0_5, operator_entries),
        MigrationStep::new(v(5), v(6), V0_0_5, V0_0_6, stakers_and_fork_pin),
    ])
}

fn path(text: &str) -> NodePath {
    NodePath::literal(text)
}

fn fork_of(chain: &str) -> NodePath {
    path("context.chains").child(chain).child("fork")
}

/// Chains the user still has a fork section for
fn forked_chains(user: &Node) -> impl Iterator<Item = &'static str> + '_ {
    CHAINS.into_iter().filter(move |chain| {
        let present = resolve(user, &fork_of(chain)).is_some_and(Node::is_mapping);
        if !present {
            warn!(chain, "context has no fork section for chain, leaving it alone");
        }
        present
    })
}

fn has_context(user: &Node) -> bool {
    let present = user.get("context").is_some_and(Node::is_mapping);
    if !present {
        warn!("document has no context mapping");
    }
    present
}

/// 0.0.1 -> 0.0.2: new fork heights, `block_time` per chain
fn fork_block_time(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    let chains: Vec<_> = forked_chains(user).collect();
    let mut engine = PatchEngine::new(&defaults.old, &defaults.new);
    for chain in chains {
        let fork = fork_of(chain);
        engine = engine
            .adopt(fork.child("block"), Condition::IfUnchanged)
            .adopt_placed(
                fork.child("block_time"),
                Condition::IfMissing,
                Placement::after("block"),
            );
    }
    engine.apply(user)?;
    Ok(())
}

/// 0.0.2 -> 0.0.3: `metadata_url` becomes `metadata_uri`, eigenlayer section
fn avs_metadata_and_eigenlayer(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    if !has_context(user) {
        return Ok(());
    }
    match resolve_mut(user, &path("context.avs")).and_then(Node::as_mapping_mut) {
        Some(avs) => {
            if avs.rename("metadata_url", "metadata_uri") {
                debug!("renamed context.avs.metadata_url to metadata_uri");
            }
        }
        None => warn!("context has no avs section"),
    }
    PatchEngine::new(&defaults.old, &defaults.new)
        .adopt_placed(path("context.eigenlayer"), Condition::IfMissing, Placement::after("avs"))
        .apply(user)?;
    Ok(())
}

/// 0.0.3 -> 0.0.4: L2 endpoint, contract addresses, `deployed_contracts`
fn l2_rpc_and_contracts(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    if !has_context(user) {
        return Ok(());
    }
    let mut engine = PatchEngine::new(&defaults.old, &defaults.new)
        .adopt(path("context.chains.l2.rpc_url"), Condition::IfUnchanged);

    let root = path("context.eigenlayer");
    if resolve(user, &root).is_some_and(Node::is_mapping) {
        if let Some(section) = resolve(&defaults.new, &root) {
            for leaf in leaf_paths(section, &root) {
                engine = engine.adopt(leaf, Condition::IfUnchanged);
            }
        }
    }

    engine
        .rule(PatchRule::set(
            path("context.deployed_contracts"),
            Condition::IfMissing,
            flow_empty_list(),
        ))
        .apply(user)?;
    Ok(())
}

/// 0.0.4 -> 0.0.5: operator entries gain keystores and allocations
///
/// An entry still equal to the old default at its index is replaced by the
/// new default entry. A customized entry keeps every value and only gains
/// the keys the new default introduced.
fn operator_entries(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    let operators = path("context.operators");
    let old = resolve(&defaults.old, &operators).and_then(Node::as_sequence);
    let new = resolve(&defaults.new, &operators).and_then(Node::as_sequence);
    let (Some(old), Some(new)) = (old, new) else {
        return Ok(());
    };
    let Some(entries) = resolve_mut(user, &operators).and_then(Node::as_sequence_mut) else {
        warn!("context has no operators list");
        return Ok(());
    };

    for (index, entry) in entries.items_mut().iter_mut().enumerate() {
        let Some(new_entry) = new.get(index) else {
            continue;
        };
        if old.get(index) == Some(&*entry) {
            let mut replacement = new_entry.clone();
            if replacement.comments().is_empty() {
                *replacement.comments_mut() = entry.comments().clone();
            }
            *entry = replacement;
            debug!(index, "operator entry replaced with new default");
        } else {
            let added = merge_missing(entry, new_entry);
            debug!(index, added, "customized operator entry kept");
        }
    }
    Ok(())
}

/// 0.0.5 -> 0.0.6: stakers, pinned fork height, staker keystore
fn stakers_and_fork_pin(
    user: &mut Node,
    defaults: &Defaults,
    ctx: &StepContext,
) -> Result<(), MigrationError> {
    if !has_context(user) {
        return Ok(());
    }
    let chains: Vec<_> = forked_chains(user).collect();
    let mut engine = PatchEngine::new(&defaults.old, &defaults.new).adopt_placed(
        path("context.stakers"),
        Condition::IfMissing,
        Placement::after("app_private_key"),
    );
    for chain in chains {
        engine = engine.rule(PatchRule::set(
            fork_of(chain).child("block"),
            Condition::Always,
            Node::scalar(FORK_BLOCK),
        ));
    }
    engine.apply(user)?;

    sidecar::write_if_absent(ctx, STAKER_KEYSTORE_PATH, STAKER_KEYSTORE)?;
    Ok(())
}

fn flow_empty_list() -> Node {
    let mut node = Node::sequence(Vec::new());
    node.set_flow_recursive();
    node
}

/// Paths of every scalar below `node`, prefixed with `base`
fn leaf_paths(node: &Node, base: &NodePath) -> Vec<NodePath> {
    match node.as_mapping() {
        Some(map) => map
            .iter()
            .flat_map(|(key, child)| leaf_paths(child, &base.child(key)))
            .collect(),
        None => vec![base.clone()],
    }
}
