//! Deep merge of document trees

use crate::node::{Node, NodeKind};

/// Merge `src` into `dst`
///
/// - mapping into mapping: shared keys whose values are both mappings recurse;
///   other shared keys take a clone of `src`'s value in `dst`'s position with
///   `dst`'s comments; new keys are appended in `src` order with their own
///   comments
/// - anything else: `dst` becomes a clone of `src`, keeping `dst`'s comments
///
/// Sequences are replaced whole, never merged element-wise.
pub fn merge(dst: &mut Node, src: &Node) {
    match (dst.kind_mut(), src.kind()) {
        (NodeKind::Mapping(dst_map), NodeKind::Mapping(src_map)) => {
            for (key, src_val) in src_map.iter() {
                match dst_map.get_mut(key) {
                    Some(dst_val) => merge(dst_val, src_val),
                    None => {
                        dst_map.insert(key, src_val.clone());
                    }
                }
            }
        }
        (kind, _) => *kind = src.kind().clone(),
    }
}

/// Non-destructive variant of [`merge`]
#[must_use]
pub fn merged(dst: &Node, src: &Node) -> Node {
    let mut out = dst.clone();
    merge(&mut out, src);
    out
}

/// Add keys from `src` that `dst` lacks, never overwriting
///
/// Shared keys whose values are both mappings recurse. Returns the number of
/// keys added.
pub fn merge_missing(dst: &mut Node, src: &Node) -> usize {
    let (NodeKind::Mapping(dst_map), NodeKind::Mapping(src_map)) = (dst.kind_mut(), src.kind())
    else {
        return 0;
    };
    let mut added = 0;
    for (key, src_val) in src_map.iter() {
        match dst_map.get_mut(key) {
            Some(dst_val) => added += merge_missing(dst_val, src_val),
            None => {
                dst_map.insert(key, src_val.clone());
                added += 1;
            }
        }
    }
    added
}
