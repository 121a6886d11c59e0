//! Comment-preserving YAML reader and writer
//!
//! `serde_yaml` drops comments and blank lines, which are part of what a user
//! owns in a config file. This module reads the block-YAML subset config
//! documents are written in straight into [`Node`] trees (comments attached)
//! and writes them back in the same layout.
//!
//! Supported: block mappings and sequences (including compact `- key: v`
//! items), plain and quoted scalars, `|`/`>` block scalars, single-line flow
//! collections, an optional leading `---`. Anchors, aliases, tags, multi-line
//! plain scalars and multi-document streams are rejected with a line number.
//!
//! Flow collections keep their structure, values and line comments, but their
//! scalars are re-quoted on write: plain unless a quote is needed to keep the
//! type or the syntax, so `['a', "b", "8545"]` is written `[a, b, "8545"]`.

mod reader;
mod scalar;
mod writer;

use crate::node::Node;

pub use scalar::needs_quotes;

/// Layout detected on read and reused on write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Spaces per nesting level
    pub indent: usize,
    /// `key:\n  - item` (true) versus `key:\n- item` (false)
    pub indent_sequences: bool,
    /// Document starts with `---`
    pub explicit_start: bool,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            indent: 2,
            indent_sequences: true,
            explicit_start: false,
        }
    }
}

/// A parsed document: root node plus layout
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    format: Format,
}

impl Document {
    /// Wrap a root with the default layout
    #[inline]
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self {
            root,
            format: Format::default(),
        }
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// Returns [`ParseError`] with the offending line on malformed or
    /// unsupported input
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        reader::parse(input)
    }

    /// Parse UTF-8 bytes (e.g. an embedded default)
    ///
    /// # Errors
    /// Returns [`ParseError::Encoding`] for invalid UTF-8, otherwise as [`Document::parse`]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(ParseError::Encoding)?;
        Self::parse(text)
    }

    /// Serialize back to YAML text
    #[must_use]
    pub fn to_yaml_string(&self) -> String {
        writer::write(&self.root, &self.format)
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    #[inline]
    #[must_use]
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Replace the root, keeping the layout
    #[inline]
    pub fn set_root(&mut self, root: Node) {
        self.root = root;
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

/// Serialize a bare node with the default layout
#[must_use]
pub fn to_string(node: &Node) -> String {
    writer::write(node, &Format::default())
}

/// Errors while reading YAML text
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed input
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Valid YAML outside the supported subset
    #[error("line {line}: {feature} are not supported")]
    Unsupported { line: usize, feature: &'static str },

    /// Flow collection rejected by serde_yaml
    #[error("line {line}: invalid flow collection: {source}")]
    Flow {
        line: usize,
        #[source]
        source: serde_yaml::Error,
    },

    /// Nothing but comments and blank lines
    #[error("document is empty")]
    Empty,

    /// Input is not UTF-8
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[source] std::str::Utf8Error),
}

impl ParseError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// 1-based line the error points at, when known
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. }
            | Self::Unsupported { line, .. }
            | Self::Flow { line, .. } => Some(*line),
            Self::Empty | Self::Encoding(_) => None,
        }
    }
}
