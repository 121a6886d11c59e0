//! Testing utilities for the docmig workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use docmig_engine::Version;
use docmig_tree::{resolve, Document, Node, NodePath};
use tempfile::TempDir;

/// Parse YAML text into a root node
pub fn parse(text: &str) -> Node {
    Document::parse(text).unwrap().into_root()
}

/// Emit a node with the default layout
pub fn emit(node: &Node) -> String {
    docmig_tree::yaml::to_string(node)
}

/// Node at `path`, panicking with the path when it is absent
pub fn node_at<'a>(root: &'a Node, path: &str) -> &'a Node {
    let parsed: NodePath = path.parse().unwrap();
    resolve(root, &parsed).unwrap_or_else(|| panic!("nothing at {path}"))
}

/// Scalar text at `path`
pub fn str_at<'a>(root: &'a Node, path: &str) -> Option<&'a str> {
    let parsed: NodePath = path.parse().unwrap();
    resolve(root, &parsed).and_then(Node::as_str)
}

/// Compare emitted YAML with a diff on failure
#[track_caller]
pub fn assert_yaml_eq(actual: &Node, expected: &str) {
    pretty_assertions::assert_eq!(emit(actual), expected);
}

pub fn version(text: &str) -> Version {
    text.parse().unwrap()
}

/// Fresh project directory
pub fn project() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Write `contents` to `dir/name`, creating parent directories
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
