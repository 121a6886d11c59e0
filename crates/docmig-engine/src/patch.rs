//! Field-level patch rules
//!
//! A [`PatchEngine`] holds the old and new default documents of one version
//! transition plus an ordered list of [`PatchRule`]s. Applying it walks the
//! rules in order against a private copy of the user document and commits
//! the copy only when every rule succeeded.

use std::fmt;

use docmig_tree::{resolve, splice, Node, NodePath, Placement, ScalarStyle};
use tracing::debug;

use crate::condition::Condition;
use crate::error::MigrationError;

/// Computes the replacement for the user's node at a rule's path
///
/// Receives the current node (absent when the path doesn't resolve).
/// Returning `None` leaves the document alone.
pub type Transform = Box<dyn Fn(Option<&Node>) -> Option<Node> + Send + Sync>;

/// One conditional field edit
pub struct PatchRule {
    path: NodePath,
    condition: Condition,
    transform: Transform,
    placement: Placement,
}

impl PatchRule {
    /// Rule with a custom transform, placed at the end of its parent
    pub fn new(
        path: NodePath,
        condition: Condition,
        transform: impl Fn(Option<&Node>) -> Option<Node> + Send + Sync + 'static,
    ) -> Self {
        Self {
            path,
            condition,
            transform: Box::new(transform),
            placement: Placement::End,
        }
    }

    /// Rule writing a fixed value
    pub fn set(path: NodePath, condition: Condition, value: Node) -> Self {
        Self::new(path, condition, move |_| Some(value.clone()))
    }

    /// Where a newly created key goes in its parent mapping
    #[must_use]
    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn condition(&self) -> Condition {
        self.condition
    }

    #[inline]
    #[must_use]
    pub fn placement(&self) -> &Placement {
        &self.placement
    }
}

impl fmt::Debug for PatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRule")
            .field("path", &self.path)
            .field("condition", &self.condition)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

/// Counts from one [`PatchEngine::apply`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Ordered rule set for one version transition
#[derive(Debug)]
pub struct PatchEngine<'d> {
    old_default: &'d Node,
    new_default: &'d Node,
    rules: Vec<PatchRule>,
}

impl<'d> PatchEngine<'d> {
    #[must_use]
    pub fn new(old_default: &'d Node, new_default: &'d Node) -> Self {
        Self {
            old_default,
            new_default,
            rules: Vec::new(),
        }
    }

    /// Append a rule
    #[must_use]
    pub fn rule(mut self, rule: PatchRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adopt the new default's value at `path` when `condition` holds
    ///
    /// The value is cloned out of the new default now. Nothing is added when
    /// the new default has no such node. A user scalar keeps its quoting
    /// style when the new value reads back with the same tag in that style.
    #[must_use]
    pub fn adopt(self, path: NodePath, condition: Condition) -> Self {
        self.adopt_placed(path, condition, Placement::End)
    }

    /// [`adopt`](Self::adopt) with an explicit placement for new keys
    #[must_use]
    pub fn adopt_placed(self, path: NodePath, condition: Condition, placement: Placement) -> Self {
        let value = resolve(self.new_default, &path).cloned();
        let rule = PatchRule::new(path, condition, move |current| {
            value.as_ref().map(|value| restyled(current, value))
        });
        self.rule(rule.placed(placement))
    }

    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[PatchRule] {
        &self.rules
    }

    /// Apply every rule in order
    ///
    /// # Errors
    /// [`MigrationError::StructuralMismatch`] when a rule's path runs through
    /// a scalar or past the end of a sequence; `user` is left untouched.
    pub fn apply(&self, user: &mut Node) -> Result<PatchReport, MigrationError> {
        let mut working = user.clone();
        let mut report = PatchReport::default();

        for rule in &self.rules {
            if !rule.condition.holds(&working, self.old_default, &rule.path) {
                debug!(path = %rule.path, condition = %rule.condition, "patch rule skipped");
                report.skipped += 1;
                continue;
            }
            let Some(value) = (rule.transform)(resolve(&working, &rule.path)) else {
                debug!(path = %rule.path, "patch rule produced no value");
                report.skipped += 1;
                continue;
            };
            splice(&mut working, &rule.path, value, &rule.placement)
                .map_err(|source| MigrationError::structural(&rule.path, source))?;
            debug!(path = %rule.path, condition = %rule.condition, "patch rule applied");
            report.applied += 1;
        }

        *user = working;
        Ok(report)
    }
}

/// `value` written in the quoting style of the user's `current` scalar, when
/// that keeps its meaning; block scalars keep the default's style
fn restyled(current: Option<&Node>, value: &Node) -> Node {
    let (Some(mine), Some(theirs)) = (current.and_then(Node::as_scalar), value.as_scalar()) else {
        return value.clone();
    };
    if matches!(mine.style(), ScalarStyle::Literal(_) | ScalarStyle::Folded(_)) {
        return value.clone();
    }
    let mut kept = mine.clone();
    kept.set_value(theirs.value());
    if kept.tag() == theirs.tag() {
        Node::from(kept)
    } else {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmig_tree::Document;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Node {
        Document::parse(text).unwrap().into_root()
    }

    fn emit(node: &Node) -> String {
        docmig_tree::yaml::to_string(node)
    }

    fn path(text: &str) -> NodePath {
        NodePath::literal(text)
    }

    #[test]
    fn if_unchanged_keeps_customizations() {
        let old = doc("fork:\n  block: 100\n  url: a\n");
        let new = doc("fork:\n  block: 200\n  url: b\n");
        let mut user = doc("fork:\n  block: 150 # mine\n  url: a\n");

        let report = PatchEngine::new(&old, &new)
            .adopt(path("fork.block"), Condition::IfUnchanged)
            .adopt(path("fork.url"), Condition::IfUnchanged)
            .apply(&mut user)
            .unwrap();

        assert_eq!(report, PatchReport { applied: 1, skipped: 1 });
        assert_eq!(emit(&user), "fork:\n  block: 150 # mine\n  url: b\n");
    }

    #[test]
    fn adopted_scalars_keep_the_user_quoting() {
        let old = doc("tag: \"v0.0.10\"\nmode: \"x\"\nport: 1\nnote: a\n");
        let new = doc("tag: \"v0.0.13\"\nmode: \"true\"\nport: 2\nnote: b\n");
        let mut user = doc("tag: v0.0.10 # pinned\nmode: x\nport: '1'\nnote: |\n  a\n");

        PatchEngine::new(&old, &new)
            .adopt(path("tag"), Condition::Always)
            .adopt(path("mode"), Condition::Always)
            .adopt(path("port"), Condition::Always)
            .adopt(path("note"), Condition::Always)
            .apply(&mut user)
            .unwrap();

        assert_eq!(
            emit(&user),
            "tag: v0.0.13 # pinned\nmode: \"true\"\nport: 2\nnote: b\n"
        );
    }

    #[test]
    fn always_overrides_and_keeps_comments() {
        let old = doc("block: 100\n");
        let new = doc("block: 300\n");
        let mut user = doc("# fork height\nblock: 150 # custom\n");

        PatchEngine::new(&old, &new)
            .rule(PatchRule::set(path("block"), Condition::Always, Node::scalar("22640530")))
            .apply(&mut user)
            .unwrap();

        assert_eq!(emit(&user), "# fork height\nblock: 22640530 # custom\n");
    }

    #[test]
    fn if_missing_inserts_with_placement() {
        let empty = Node::mapping();
        let mut user = doc("fork:\n  block: 1\n  url: x\n");

        PatchEngine::new(&empty, &empty)
            .rule(
                PatchRule::set(path("fork.block_time"), Condition::IfMissing, Node::scalar("12"))
                    .placed(Placement::after("block")),
            )
            .rule(PatchRule::set(path("fork.url"), Condition::IfMissing, Node::scalar("y")))
            .apply(&mut user)
            .unwrap();

        assert_eq!(emit(&user), "fork:\n  block: 1\n  block_time: 12\n  url: x\n");
    }

    #[test]
    fn missing_intermediate_mappings_are_created() {
        let empty = Node::mapping();
        let mut user = doc("context:\n  name: devnet\n");

        PatchEngine::new(&empty, &empty)
            .rule(PatchRule::set(
                path("context.chains.l1.fork.block"),
                Condition::Always,
                Node::scalar("5"),
            ))
            .apply(&mut user)
            .unwrap();

        assert_eq!(
            emit(&user),
            "context:\n  name: devnet\n  chains:\n    l1:\n      fork:\n        block: 5\n"
        );
    }

    #[test]
    fn transform_sees_current_value() {
        let empty = Node::mapping();
        let mut user = doc("stake: 1000\n");

        PatchEngine::new(&empty, &empty)
            .rule(PatchRule::new(path("stake"), Condition::Always, |current| {
                current
                    .and_then(Node::as_str)
                    .map(|s| Node::scalar(format!("{s}ETH")))
            }))
            .apply(&mut user)
            .unwrap();

        assert_eq!(user.get("stake").and_then(Node::as_str), Some("1000ETH"));
    }

    #[test]
    fn adopt_without_new_default_value_is_a_no_op() {
        let old = doc("a: 1\n");
        let new = doc("b: 2\n");
        let mut user = doc("a: 1\n");

        let report = PatchEngine::new(&old, &new)
            .adopt(path("a"), Condition::Always)
            .apply(&mut user)
            .unwrap();

        assert_eq!(report.applied, 0);
        assert_eq!(emit(&user), "a: 1\n");
    }

    #[test]
    fn keys_that_do_not_survive_path_text_still_adopt() {
        let old = Node::mapping();
        let new = doc("\"odd.key[0]\": 1\n");
        let mut user = doc("other: 0\n");

        PatchEngine::new(&old, &new)
            .adopt(NodePath::root().child("odd.key[0]"), Condition::IfMissing)
            .apply(&mut user)
            .unwrap();

        assert_eq!(user.get("odd.key[0]").and_then(Node::as_str), Some("1"));
    }

    #[test]
    fn structural_mismatch_leaves_user_untouched() {
        let empty = Node::mapping();
        let mut user = doc("name: devnet\nlist:\n  - a\n");
        let before = emit(&user);

        let err = PatchEngine::new(&empty, &empty)
            .rule(PatchRule::set(path("added"), Condition::Always, Node::scalar("1")))
            .rule(PatchRule::set(path("name.inner"), Condition::Always, Node::scalar("x")))
            .apply(&mut user)
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::StructuralMismatch { ref path, .. } if path == "name.inner"
        ));
        assert_eq!(emit(&user), before);

        let err = PatchEngine::new(&empty, &empty)
            .rule(PatchRule::set(path("list.5"), Condition::Always, Node::scalar("x")))
            .apply(&mut user)
            .unwrap_err();
        assert!(matches!(err, MigrationError::StructuralMismatch { .. }));
    }

    #[test]
    fn adopted_subtrees_are_independent_of_the_default() {
        let old = Node::mapping();
        let new = doc("eigenlayer:\n  l1:\n    delegation_manager: \"0x1\"\n");
        let mut user = doc("avs: {}\n");
        let manager = path("eigenlayer.l1.delegation_manager");

        PatchEngine::new(&old, &new)
            .adopt(path("eigenlayer"), Condition::IfMissing)
            .apply(&mut user)
            .unwrap();
        docmig_tree::resolve_mut(&mut user, &manager)
            .unwrap()
            .set_scalar("0x2");

        assert_eq!(resolve(&new, &manager).and_then(Node::as_str), Some("0x1"));
    }
}
