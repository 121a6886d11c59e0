//! Document tree for structural migrations
//!
//! A generic, order-preserving tree of [`Node`]s that keeps the formatting a
//! user put into a config file (comments, blank lines, quoting) alongside
//! the data.
//!
//! # Core Concepts
//!
//! - [`Node`]: scalar / sequence / mapping plus attached [`Comments`]
//! - [`NodePath`]: dotted or indexed address (`context.operators[0].address`)
//! - [`resolve`] / [`splice`] / [`remove`]: path-addressed access and edits
//! - [`merge`] / [`merge_missing`]: deep merge of one tree into another
//! - [`Document`]: comment-preserving YAML reader and writer
//!
//! # Example
//!
//! ```rust
//! use docmig_tree::{resolve, Document, NodePath};
//!
//! let doc = Document::parse("# devnet\ncontext:\n  name: devnet # local\n").unwrap();
//! let name = resolve(doc.root(), &"context.name".parse::<NodePath>().unwrap());
//! assert_eq!(name.and_then(|n| n.as_str()), Some("devnet"));
//! assert_eq!(doc.to_yaml_string(), "# devnet\ncontext:\n  name: devnet # local\n");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod merge;
mod node;
mod path;
mod value;
pub mod yaml;

pub use merge::{merge, merge_missing, merged};
pub use node::{
    parse_index, resolve_plain_tag, Chomping, Comments, Mapping, Node, NodeKind, Scalar,
    ScalarStyle, ScalarTag, Sequence,
};
pub use path::{remove, resolve, resolve_mut, splice, NodePath, PathError, Placement};
pub use yaml::{Document, Format, ParseError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
