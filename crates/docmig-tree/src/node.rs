//! Document nodes
//!
//! Provides [`Node`], the order-preserving tree every other component works on.
//! A node is a closed sum of scalar, sequence and mapping variants plus the
//! formatting metadata (comments, quoting, flow/block style) needed to write the
//! document back the way a person left it.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Comments attached to a node
///
/// Head lines are kept as written (including indentation) so an untouched
/// document re-emits byte for byte; an empty string is a blank separator line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Lines above the node (blank lines and `#` comments)
    pub head: Vec<String>,
    /// Trailing comment on the node's own line, including the gap before `#`
    pub line: Option<String>,
    /// Lines after the node's content
    pub foot: Vec<String>,
}

impl Comments {
    /// No comments at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.line.is_none() && self.foot.is_empty()
    }

    /// Append a head comment line; `#` is added when missing
    pub fn push_head(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() || text.trim_start().starts_with('#') {
            self.head.push(text);
        } else {
            self.head.push(format!("# {text}"));
        }
    }
}

/// Chomping indicator of a block scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chomping {
    /// Single trailing newline (no indicator)
    #[default]
    Clip,
    /// No trailing newline (`-`)
    Strip,
    /// All trailing newlines (`+`)
    Keep,
}

/// How a scalar was (or should be) written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|` block scalar
    Literal(Chomping),
    /// `>` block scalar; the value holds the lines verbatim, unfolded
    Folded(Chomping),
}

impl ScalarStyle {
    /// Quoted and block styles always denote strings
    #[inline]
    #[must_use]
    pub fn is_plain(self) -> bool {
        matches!(self, Self::Plain)
    }
}

/// Resolved type of a scalar (YAML 1.2 core schema)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarTag {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

static INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)$").expect("valid regex"));

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?",
        r"|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
    ))
    .expect("valid regex")
});

/// Resolve the tag a plain scalar would get
#[must_use]
pub fn resolve_plain_tag(value: &str) -> ScalarTag {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => ScalarTag::Null,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => ScalarTag::Bool,
        v if INT_RE.is_match(v) => ScalarTag::Int,
        v if FLOAT_RE.is_match(v) => ScalarTag::Float,
        _ => ScalarTag::Str,
    }
}

/// Scalar leaf
#[derive(Debug, Clone, Default)]
pub struct Scalar {
    value: String,
    style: ScalarStyle,
}

impl Scalar {
    /// Create scalar with explicit style
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }

    /// Decoded value (quotes and escapes removed)
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    #[must_use]
    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    #[inline]
    pub fn set_style(&mut self, style: ScalarStyle) {
        self.style = style;
    }

    /// Replace the value, keeping the quoting style
    #[inline]
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Resolved tag; non-plain styles are always strings
    #[must_use]
    pub fn tag(&self) -> ScalarTag {
        if self.style.is_plain() {
            resolve_plain_tag(&self.value)
        } else {
            ScalarTag::Str
        }
    }

    /// Plain null (`~`, `null`, or nothing at all)
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.tag() == ScalarTag::Null
    }

    fn structurally_eq(&self, other: &Self) -> bool {
        match (self.tag(), other.tag()) {
            (ScalarTag::Null, ScalarTag::Null) => true,
            (a, b) => a == b && self.value == other.value,
        }
    }
}

/// Ordered list of nodes
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    items: Vec<Node>,
    flow: bool,
}

impl Sequence {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Node] {
        &self.items
    }

    #[inline]
    pub fn items_mut(&mut self) -> &mut Vec<Node> {
        &mut self.items
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.items.get_mut(index)
    }

    #[inline]
    pub fn push(&mut self, node: Node) {
        self.items.push(node);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Written as `[a, b]` instead of a block list
    #[inline]
    #[must_use]
    pub fn is_flow(&self) -> bool {
        self.flow
    }

    #[inline]
    pub fn set_flow(&mut self, flow: bool) {
        self.flow = flow;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.items.iter()
    }
}

impl FromIterator<Node> for Sequence {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            flow: false,
        }
    }
}

/// Ordered key/value entries with unique keys
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: IndexMap<String, Node>,
    flow: bool,
}

impl Mapping {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Position of `key` in document order
    #[inline]
    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) -> Option<Node> {
        self.entries.insert(key.into(), node)
    }

    /// Insert at `index`, clamped to the current length
    ///
    /// An existing key is moved to `index`.
    pub fn insert_at(&mut self, index: usize, key: impl Into<String>, node: Node) {
        let index = index.min(self.entries.len());
        self.entries.shift_insert(index, key.into(), node);
    }

    /// Insert right after `anchor`
    ///
    /// Appends when `anchor` is absent. Returns whether the anchor was found.
    pub fn insert_after(&mut self, anchor: &str, key: impl Into<String>, node: Node) -> bool {
        let key = key.into();
        // An existing key would shift the anchor's index when moved.
        self.entries.shift_remove(&key);
        match self.entries.get_index_of(anchor) {
            Some(index) => {
                self.entries.shift_insert(index + 1, key, node);
                true
            }
            None => {
                self.entries.insert(key, node);
                false
            }
        }
    }

    /// Insert right before `anchor`
    ///
    /// Appends when `anchor` is absent. Returns whether the anchor was found.
    pub fn insert_before(&mut self, anchor: &str, key: impl Into<String>, node: Node) -> bool {
        let key = key.into();
        self.entries.shift_remove(&key);
        match self.entries.get_index_of(anchor) {
            Some(index) => {
                self.entries.shift_insert(index, key, node);
                true
            }
            None => {
                self.entries.insert(key, node);
                false
            }
        }
    }

    /// Remove `key`, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }

    /// Rename `from` to `to` in place
    ///
    /// The value, its comments and its position are kept. Returns `false`
    /// when `from` is absent or `to` already exists.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.entries.contains_key(to) {
            return false;
        }
        match self.entries.shift_remove_full(from) {
            Some((index, _, node)) => {
                self.entries.shift_insert(index, to.to_string(), node);
                true
            }
            None => false,
        }
    }

    /// Written as `{a: 1}` instead of a block mapping
    #[inline]
    #[must_use]
    pub fn is_flow(&self) -> bool {
        self.flow
    }

    #[inline]
    pub fn set_flow(&mut self, flow: bool) {
        self.flow = flow;
    }

    fn structurally_eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(key, value)| {
                other
                    .entries
                    .get(key)
                    .is_some_and(|theirs| value.structurally_eq(theirs))
            })
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            flow: false,
        }
    }
}

/// Node payload
#[derive(Debug, Clone)]
pub enum NodeKind {
    Scalar(Scalar),
    Sequence(Sequence),
    Mapping(Mapping),
}

/// Element of a document tree
///
/// `Clone` is a deep copy, comments included. Equality (`==`) is structural:
/// comments, quoting and flow/block style are ignored, scalars compare by
/// resolved tag and value, and mappings compare as key sets.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    comments: Comments,
}

impl Node {
    /// Wrap a payload with no comments
    #[inline]
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            comments: Comments::default(),
        }
    }

    /// Plain scalar
    #[inline]
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Scalar(Scalar::new(value, ScalarStyle::Plain)))
    }

    /// Double-quoted string scalar
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Scalar(Scalar::new(value, ScalarStyle::DoubleQuoted)))
    }

    /// Empty plain scalar (written as `key:`)
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::scalar("")
    }

    /// Empty block mapping
    #[inline]
    #[must_use]
    pub fn mapping() -> Self {
        Self::new(NodeKind::Mapping(Mapping::new()))
    }

    /// Block sequence of `items`
    #[inline]
    #[must_use]
    pub fn sequence(items: Vec<Node>) -> Self {
        Self::new(NodeKind::Sequence(items.into_iter().collect()))
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[inline]
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Replace the payload, keeping comments
    #[inline]
    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    #[inline]
    #[must_use]
    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    #[inline]
    pub fn comments_mut(&mut self) -> &mut Comments {
        &mut self.comments
    }

    /// Builder-style head comment
    #[must_use]
    pub fn with_head_comment(mut self, text: impl Into<String>) -> Self {
        self.comments.push_head(text);
        self
    }

    /// Name of the variant, for diagnostics
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.kind {
            NodeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_scalar_mut(&mut self) -> Option<&mut Scalar> {
        match &mut self.kind {
            NodeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar value as text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(Scalar::value)
    }

    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.kind {
            NodeKind::Sequence(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_sequence_mut(&mut self) -> Option<&mut Sequence> {
        match &mut self.kind {
            NodeKind::Sequence(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.kind {
            NodeKind::Mapping(m) => Some(m),
            _ => None,
        }
    }

    #[inline]
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match &mut self.kind {
            NodeKind::Mapping(m) => Some(m),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_))
    }

    /// Plain null scalar
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.as_scalar().is_some_and(Scalar::is_null)
    }

    /// Mapping lookup; absent on non-mappings
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.as_mapping_mut()?.get_mut(key)
    }

    /// One path step: mapping key, or sequence index when `segment` is a
    /// non-negative integer
    #[must_use]
    pub fn child(&self, segment: &str) -> Option<&Node> {
        match &self.kind {
            NodeKind::Mapping(m) => m.get(segment),
            NodeKind::Sequence(s) => s.get(parse_index(segment)?),
            NodeKind::Scalar(_) => None,
        }
    }

    pub fn child_mut(&mut self, segment: &str) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Mapping(m) => m.get_mut(segment),
            NodeKind::Sequence(s) => s.get_mut(parse_index(segment)?),
            NodeKind::Scalar(_) => None,
        }
    }

    /// Set a scalar value, keeping style and comments when already a scalar
    pub fn set_scalar(&mut self, value: impl Into<String>) {
        match &mut self.kind {
            NodeKind::Scalar(s) => s.set_value(value),
            kind => *kind = NodeKind::Scalar(Scalar::new(value, ScalarStyle::Plain)),
        }
    }

    /// Deep structural equality, ignoring formatting metadata
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Scalar(a), NodeKind::Scalar(b)) => a.structurally_eq(b),
            (NodeKind::Sequence(a), NodeKind::Sequence(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.structurally_eq(y))
            }
            (NodeKind::Mapping(a), NodeKind::Mapping(b)) => a.structurally_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other)
    }
}

impl Eq for Node {}

impl From<Mapping> for Node {
    fn from(mapping: Mapping) -> Self {
        Self::new(NodeKind::Mapping(mapping))
    }
}

impl From<Sequence> for Node {
    fn from(sequence: Sequence) -> Self {
        Self::new(NodeKind::Sequence(sequence))
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Self::new(NodeKind::Scalar(scalar))
    }
}

/// Parse a path segment as a sequence index (digits only)
#[must_use]
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut fork = Mapping::new();
        fork.insert("block", Node::scalar("22475020"));
        fork.insert("url", Node::string("https://rpc.example"));
        let mut root = Mapping::new();
        root.insert("name", Node::string("devnet").with_head_comment("# context name"));
        root.insert("fork", Node::from(fork));
        root.insert(
            "operators",
            Node::sequence(vec![Node::scalar("a"), Node::scalar("b")]),
        );
        Node::from(root)
    }

    #[test]
    fn plain_tags_follow_core_schema() {
        assert_eq!(resolve_plain_tag(""), ScalarTag::Null);
        assert_eq!(resolve_plain_tag("~"), ScalarTag::Null);
        assert_eq!(resolve_plain_tag("True"), ScalarTag::Bool);
        assert_eq!(resolve_plain_tag("22640530"), ScalarTag::Int);
        assert_eq!(resolve_plain_tag("0x7a"), ScalarTag::Int);
        assert_eq!(resolve_plain_tag("-1.5e3"), ScalarTag::Float);
        assert_eq!(resolve_plain_tag(".inf"), ScalarTag::Float);
        assert_eq!(resolve_plain_tag("0xZZ"), ScalarTag::Str);
        assert_eq!(resolve_plain_tag("1000ETH"), ScalarTag::Str);
    }

    #[test]
    fn equality_ignores_quoting_of_strings() {
        let plain = Node::scalar("devnet");
        let quoted = Node::string("devnet");
        assert_eq!(plain, quoted);
    }

    #[test]
    fn equality_distinguishes_quoted_numbers() {
        assert_ne!(Node::scalar("1"), Node::string("1"));
        assert_eq!(Node::scalar("~"), Node::null());
    }

    #[test]
    fn equality_ignores_comments_and_key_order() {
        let a = sample();
        let mut b = sample();
        b.comments_mut().push_head("# extra");
        let map = b.as_mapping_mut().unwrap();
        let name = map.remove("name").unwrap();
        map.insert("name", name);
        assert_eq!(a, b);
    }

    #[test]
    fn sequences_compare_in_order() {
        let a = Node::sequence(vec![Node::scalar("a"), Node::scalar("b")]);
        let b = Node::sequence(vec![Node::scalar("b"), Node::scalar("a")]);
        assert_ne!(a, b);
    }

    #[test]
    fn clone_is_isolated() {
        let original = sample();
        let mut copy = original.clone();
        copy.get_mut("fork").unwrap().get_mut("block").unwrap().set_scalar("1");
        copy.get_mut("name").unwrap().comments_mut().head.clear();

        assert_eq!(original.get("fork").unwrap().get("block").unwrap().as_str(), Some("22475020"));
        assert_eq!(original.get("name").unwrap().comments().head, vec!["# context name"]);
    }

    #[test]
    fn child_addresses_keys_and_indices() {
        let node = sample();
        assert_eq!(node.child("operators").unwrap().child("1").unwrap().as_str(), Some("b"));
        assert!(node.child("operators").unwrap().child("2").is_none());
        assert!(node.child("operators").unwrap().child("-1").is_none());
        assert!(node.child("name").unwrap().child("x").is_none());
    }

    #[test]
    fn mapping_positional_inserts() {
        let mut map: Mapping = [("a", Node::scalar("1")), ("c", Node::scalar("3"))]
            .into_iter()
            .collect();
        assert!(map.insert_after("a", "b", Node::scalar("2")));
        assert!(map.insert_before("a", "z", Node::scalar("0")));
        assert!(!map.insert_after("missing", "end", Node::scalar("9")));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a", "b", "c", "end"]);
    }

    #[test]
    fn mapping_rename_keeps_position_and_comments() {
        let mut map: Mapping = [
            ("a", Node::scalar("1")),
            ("old", Node::scalar("2").with_head_comment("kept")),
            ("c", Node::scalar("3")),
        ]
        .into_iter()
        .collect();
        assert!(map.rename("old", "new"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "new", "c"]);
        assert_eq!(map.get("new").unwrap().comments().head, vec!["# kept"]);
        assert!(!map.rename("missing", "x"));
        assert!(!map.rename("a", "c"));
    }

    #[test]
    fn set_scalar_keeps_style() {
        let mut node = Node::string("old");
        node.set_scalar("new");
        assert_eq!(node.as_scalar().unwrap().style(), ScalarStyle::DoubleQuoted);
        assert_eq!(node.as_str(), Some("new"));
    }
}
