//! Node paths
//!
//! Provides [`NodePath`] for addressing nodes inside a document, plus the
//! resolver and the splice/remove edits that walk it.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::node::{parse_index, Mapping, Node, NodeKind};

/// Path within a document tree
///
/// Segments are mapping keys, or sequence indices when the node being walked
/// is a sequence and the segment is a non-negative integer.
///
/// # Examples
/// - `context.chains.l1.fork.block`
/// - `context.operators.0.address` (same as `context.operators[0].address`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// Empty path (document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a path known at compile time
    ///
    /// # Panics
    /// Panics if `path` is malformed; use [`str::parse`] for runtime input.
    #[must_use]
    pub fn literal(path: &str) -> Self {
        match path.parse() {
            Ok(path) => path,
            Err(e) => panic!("malformed path literal {path:?}: {e}"),
        }
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a key segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(open) => (&part[..open], &part[open..]),
                None => (part, ""),
            };
            if key.is_empty() && rest.is_empty() {
                return Err(PathError::EmptySegment);
            }
            if !key.is_empty() {
                validate_segment(key)?;
                segments.push(key.to_string());
            }
            while !rest.is_empty() {
                let index = rest
                    .strip_prefix('[')
                    .and_then(|inner| inner.split_once(']'))
                    .filter(|(index, _)| parse_index(index).is_some());
                let Some((index, tail)) = index else {
                    return Err(PathError::InvalidSegment(part.to_string()));
                };
                segments.push(index.to_string());
                rest = tail;
            }
        }

        Ok(Self(segments))
    }
}

fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.contains(|c: char| c.is_whitespace() || c == ']') {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

impl Default for NodePath {
    fn default() -> Self {
        Self::root()
    }
}

/// Where a newly created mapping key goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    /// After the last entry
    #[default]
    End,
    /// Right after the named sibling (end if it is absent)
    After(String),
    /// Right before the named sibling (end if it is absent)
    Before(String),
}

impl Placement {
    #[must_use]
    pub fn after(key: impl Into<String>) -> Self {
        Self::After(key.into())
    }

    #[must_use]
    pub fn before(key: impl Into<String>) -> Self {
        Self::Before(key.into())
    }

    fn insert(&self, mapping: &mut Mapping, key: &str, node: Node) {
        match self {
            Self::End => {
                mapping.insert(key, node);
            }
            Self::After(anchor) => {
                mapping.insert_after(anchor, key, node);
            }
            Self::Before(anchor) => {
                mapping.insert_before(anchor, key, node);
            }
        }
    }
}

/// Errors related to node paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Malformed segment
    #[error("invalid segment: {0}")]
    InvalidSegment(String),

    /// Walk reached a scalar with segments left
    #[error("'{path}' traverses scalar at '{at}'")]
    TraversesScalar { path: String, at: String },

    /// Segment used on a sequence is not an index, or is out of range
    #[error("'{path}': no element '{segment}' in sequence at '{at}' (length {len})")]
    BadIndex {
        path: String,
        at: String,
        segment: String,
        len: usize,
    },
}

/// Resolve `path` against `root`
///
/// All-or-nothing: any missing key, bad index, or scalar in the middle of the
/// walk yields `None`.
#[must_use]
pub fn resolve<'a>(root: &'a Node, path: &NodePath) -> Option<&'a Node> {
    path.iter().try_fold(root, |node, segment| node.child(segment))
}

/// Mutable variant of [`resolve`]
pub fn resolve_mut<'a>(root: &'a mut Node, path: &NodePath) -> Option<&'a mut Node> {
    let mut node = root;
    for segment in path.iter() {
        node = node.child_mut(segment)?;
    }
    Some(node)
}

/// Write `value` at `path`, creating intermediate mappings as needed
///
/// An existing target is replaced in place; when `value` carries no comments
/// the replaced node's comments are kept. A new key is placed per `placement`.
/// On a sequence parent the last segment may equal the length, which appends.
/// A null scalar met on the way is turned into a mapping.
///
/// # Errors
/// [`PathError::TraversesScalar`] when a non-null scalar sits on the path,
/// [`PathError::BadIndex`] for an unusable sequence segment.
pub fn splice(
    root: &mut Node,
    path: &NodePath,
    mut value: Node,
    placement: &Placement,
) -> Result<(), PathError> {
    let Some((last, parents)) = path.segments().split_last() else {
        adopt_comments(&mut value, root);
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        let at = NodePath(path.segments()[..depth].to_vec());
        node = step_or_create(node, segment, path, &at)?;
    }

    let at = NodePath(parents.to_vec());
    if node.is_null() {
        node.set_kind(NodeKind::Mapping(Mapping::new()));
    }
    match node.kind_mut() {
        NodeKind::Mapping(mapping) => {
            match mapping.get_mut(last) {
                Some(existing) => {
                    adopt_comments(&mut value, existing);
                    *existing = value;
                }
                None => placement.insert(mapping, last, value),
            }
            Ok(())
        }
        NodeKind::Sequence(seq) => {
            let len = seq.len();
            match parse_index(last) {
                Some(i) if i < len => {
                    let existing = &mut seq.items_mut()[i];
                    adopt_comments(&mut value, existing);
                    *existing = value;
                    Ok(())
                }
                Some(i) if i == len => {
                    seq.push(value);
                    Ok(())
                }
                _ => Err(PathError::BadIndex {
                    path: path.to_string(),
                    at: at.to_string(),
                    segment: last.clone(),
                    len,
                }),
            }
        }
        NodeKind::Scalar(_) => Err(PathError::TraversesScalar {
            path: path.to_string(),
            at: at.to_string(),
        }),
    }
}

fn step_or_create<'a>(
    node: &'a mut Node,
    segment: &str,
    path: &NodePath,
    at: &NodePath,
) -> Result<&'a mut Node, PathError> {
    if node.is_null() {
        node.set_kind(NodeKind::Mapping(Mapping::new()));
    }
    match node.kind_mut() {
        NodeKind::Mapping(mapping) => {
            if !mapping.contains_key(segment) {
                mapping.insert(segment, Node::mapping());
            }
            mapping.get_mut(segment).ok_or_else(|| PathError::InvalidSegment(segment.to_string()))
        }
        NodeKind::Sequence(seq) => {
            let len = seq.len();
            parse_index(segment)
                .and_then(|i| seq.get_mut(i))
                .ok_or_else(|| PathError::BadIndex {
                    path: path.to_string(),
                    at: at.to_string(),
                    segment: segment.to_string(),
                    len,
                })
        }
        NodeKind::Scalar(_) => Err(PathError::TraversesScalar {
            path: path.to_string(),
            at: at.to_string(),
        }),
    }
}

fn adopt_comments(value: &mut Node, existing: &Node) {
    if value.comments().is_empty() {
        *value.comments_mut() = existing.comments().clone();
    }
}

/// Remove the node at `path` from its parent
///
/// Mapping entries are removed in place, sequence elements shift down.
/// Returns `None` when nothing is addressed.
pub fn remove(root: &mut Node, path: &NodePath) -> Option<Node> {
    let (last, parents) = path.segments().split_last()?;
    let parent = resolve_mut(root, &NodePath(parents.to_vec()))?;
    match parent.kind_mut() {
        NodeKind::Mapping(mapping) => mapping.remove(last),
        NodeKind::Sequence(seq) => {
            let index = parse_index(last)?;
            (index < seq.len()).then(|| seq.items_mut().remove(index))
        }
        NodeKind::Scalar(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Node {
        let mut fork = Mapping::new();
        fork.insert("block", Node::scalar("22475020"));
        let mut l1 = Mapping::new();
        l1.insert("chain_id", Node::scalar("31337"));
        l1.insert("fork", Node::from(fork));
        let mut chains = Mapping::new();
        chains.insert("l1", Node::from(l1));
        let mut op = Mapping::new();
        op.insert("address", Node::string("0xabc"));
        let mut ctx = Mapping::new();
        ctx.insert("name", Node::string("devnet"));
        ctx.insert("chains", Node::from(chains));
        ctx.insert("operators", Node::sequence(vec![Node::from(op)]));
        let mut root = Mapping::new();
        root.insert("version", Node::scalar("0.0.5"));
        root.insert("context", Node::from(ctx));
        Node::from(root)
    }

    #[test]
    fn path_from_str_dotted() {
        let path: NodePath = "context.chains.l1.fork.block".parse().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.segments().last().map(String::as_str), Some("block"));
    }

    #[test]
    fn path_from_str_brackets() {
        let a: NodePath = "context.operators[0].address".parse().unwrap();
        let b: NodePath = "context.operators.0.address".parse().unwrap();
        assert_eq!(a, b);
        let nested: NodePath = "m[1][2]".parse().unwrap();
        assert_eq!(nested.segments(), &["m", "1", "2"]);
    }

    #[test]
    fn path_from_str_errors() {
        assert_eq!("a..b".parse::<NodePath>(), Err(PathError::EmptySegment));
        assert!(matches!("a[x]".parse::<NodePath>(), Err(PathError::InvalidSegment(_))));
        assert!(matches!("a[0".parse::<NodePath>(), Err(PathError::InvalidSegment(_))));
        assert!(matches!("a b".parse::<NodePath>(), Err(PathError::InvalidSegment(_))));
        for malformed in ["a[0]]", "a]", "a[0]x", "a[]", "a[[0]]", "[0]]"] {
            assert!(
                matches!(malformed.parse::<NodePath>(), Err(PathError::InvalidSegment(_))),
                "{malformed}"
            );
        }
        assert!("".parse::<NodePath>().unwrap().is_empty());
    }

    #[test]
    fn path_display_and_children() {
        let path = NodePath::literal("a.b.c");
        assert_eq!(path.to_string(), "a.b.c");
        assert_eq!(NodePath::literal("a.b").child("c"), path);
        assert_eq!(NodePath::root().to_string(), "<root>");
    }

    #[test]
    fn resolve_walks_mappings_and_sequences() {
        let root = doc();
        let block = resolve(&root, &NodePath::literal("context.chains.l1.fork.block")).unwrap();
        assert_eq!(block.as_str(), Some("22475020"));
        let addr = resolve(&root, &NodePath::literal("context.operators.0.address")).unwrap();
        assert_eq!(addr.as_str(), Some("0xabc"));
        assert!(resolve(&root, &NodePath::root()).is_some());
    }

    #[test]
    fn resolve_is_all_or_nothing() {
        let root = doc();
        assert!(resolve(&root, &NodePath::literal("context.operators.1.address")).is_none());
        assert!(resolve(&root, &NodePath::literal("context.name.deeper")).is_none());
        assert!(resolve(&root, &NodePath::literal("context.stakers")).is_none());
        assert!(resolve(&root, &NodePath::literal("context.operators.first")).is_none());
    }

    #[test]
    fn splice_replaces_in_place_keeping_comments() {
        let mut root = doc();
        let path = NodePath::literal("context.name");
        resolve_mut(&mut root, &path).unwrap().comments_mut().push_head("# the name");
        splice(&mut root, &path, Node::string("mainnet"), &Placement::End).unwrap();
        let name = resolve(&root, &path).unwrap();
        assert_eq!(name.as_str(), Some("mainnet"));
        assert_eq!(name.comments().head, vec!["# the name"]);
        let keys: Vec<_> = root.get("context").unwrap().as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "chains", "operators"]);
    }

    #[test]
    fn splice_creates_intermediates_and_places_keys() {
        let mut root = doc();
        splice(
            &mut root,
            &NodePath::literal("context.stakers"),
            Node::sequence(vec![]),
            &Placement::after("name"),
        )
        .unwrap();
        splice(
            &mut root,
            &NodePath::literal("context.eigenlayer.l1.delegation_manager"),
            Node::string("0x39"),
            &Placement::End,
        )
        .unwrap();
        let keys: Vec<_> = root.get("context").unwrap().as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "stakers", "chains", "operators", "eigenlayer"]);
        assert_eq!(
            resolve(&root, &NodePath::literal("context.eigenlayer.l1.delegation_manager"))
                .unwrap()
                .as_str(),
            Some("0x39")
        );
    }

    #[test]
    fn splice_through_scalar_fails() {
        let mut root = doc();
        let err = splice(
            &mut root,
            &NodePath::literal("context.name.first"),
            Node::scalar("x"),
            &Placement::End,
        )
        .unwrap_err();
        assert!(matches!(err, PathError::TraversesScalar { .. }));
    }

    #[test]
    fn splice_sequence_indices() {
        let mut root = doc();
        let append = NodePath::literal("context.operators.1");
        splice(&mut root, &append, Node::scalar("x"), &Placement::End).unwrap();
        assert_eq!(resolve(&root, &append).unwrap().as_str(), Some("x"));

        let gap = NodePath::literal("context.operators.5");
        let err = splice(&mut root, &gap, Node::scalar("y"), &Placement::End).unwrap_err();
        assert!(matches!(err, PathError::BadIndex { len: 2, .. }));
    }

    #[test]
    fn splice_fills_null_scalars() {
        let mut root = doc();
        let fork = NodePath::literal("context.chains.l1.fork");
        splice(&mut root, &fork, Node::null(), &Placement::End).unwrap();
        splice(&mut root, &fork.child("block"), Node::scalar("1"), &Placement::End).unwrap();
        assert_eq!(resolve(&root, &fork.child("block")).unwrap().as_str(), Some("1"));
    }

    #[test]
    fn remove_entries_and_elements() {
        let mut root = doc();
        let removed = remove(&mut root, &NodePath::literal("context.operators.0")).unwrap();
        assert!(removed.is_mapping());
        let operators = resolve(&root, &NodePath::literal("context.operators")).unwrap();
        assert!(operators.as_sequence().unwrap().is_empty());
        assert!(remove(&mut root, &NodePath::literal("context.missing")).is_none());
        assert!(remove(&mut root, &NodePath::root()).is_none());
    }
}
