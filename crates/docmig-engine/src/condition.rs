//! Rule conditions

use std::fmt::{self, Display, Formatter};

use docmig_tree::{resolve, Node, NodePath};

/// When a patch rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Unconditionally
    Always,
    /// Only if the user's value still equals the old default
    ///
    /// Both absent counts as unchanged. A value the user deleted while the
    /// old default has one counts as a customization.
    IfUnchanged,
    /// Only if the user document has nothing at the path
    IfMissing,
}

impl Condition {
    /// Evaluate against the user tree and the old default tree
    #[must_use]
    pub fn holds(self, user: &Node, old_default: &Node, path: &NodePath) -> bool {
        match self {
            Self::Always => true,
            Self::IfUnchanged => match (resolve(user, path), resolve(old_default, path)) {
                (None, None) => true,
                (Some(current), Some(default)) => current == default,
                _ => false,
            },
            Self::IfMissing => resolve(user, path).is_none(),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => "always",
            Self::IfUnchanged => "if-unchanged",
            Self::IfMissing => "if-missing",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmig_tree::Document;

    fn doc(text: &str) -> Node {
        Document::parse(text).unwrap().into_root()
    }

    #[test]
    fn if_unchanged_compares_structure_not_formatting() {
        let old = doc("fork:\n  block: 100\n  url: \"\"\n");
        let user = doc("fork:\n  # pinned by hand\n  url: ''\n  block: 100 # same\n");
        assert!(Condition::IfUnchanged.holds(&user, &old, &NodePath::literal("fork")));
        assert!(Condition::IfUnchanged.holds(&user, &old, &NodePath::literal("fork.block")));
    }

    #[test]
    fn if_unchanged_treats_edits_and_deletions_as_customizations() {
        let old = doc("fork:\n  block: 100\n");
        let edited = doc("fork:\n  block: 200\n");
        let deleted = doc("fork:\n  url: x\n");
        let path = NodePath::literal("fork.block");
        assert!(!Condition::IfUnchanged.holds(&edited, &old, &path));
        assert!(!Condition::IfUnchanged.holds(&deleted, &old, &path));
    }

    #[test]
    fn if_unchanged_with_both_absent_holds() {
        let old = doc("a: 1\n");
        let user = doc("b: 2\n");
        assert!(Condition::IfUnchanged.holds(&user, &old, &NodePath::literal("c")));
        assert!(!Condition::IfUnchanged.holds(&user, &old, &NodePath::literal("b")));
    }

    #[test]
    fn quoted_numbers_differ_from_plain_numbers() {
        let old = doc("block: 100\n");
        let user = doc("block: \"100\"\n");
        assert!(!Condition::IfUnchanged.holds(&user, &old, &NodePath::literal("block")));
    }

    #[test]
    fn if_missing_and_always() {
        let user = doc("a: 1\n");
        let old = doc("a: 1\n");
        assert!(!Condition::IfMissing.holds(&user, &old, &NodePath::literal("a")));
        assert!(Condition::IfMissing.holds(&user, &old, &NodePath::literal("a.b")));
        assert!(Condition::Always.holds(&user, &old, &NodePath::literal("a")));
        assert_eq!(Condition::IfUnchanged.to_string(), "if-unchanged");
    }
}
