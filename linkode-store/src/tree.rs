//! Tree reconstruction from a flat revision list.
//!
//! The store keeps revisions flat; display wants them nested. This module
//! rebuilds the parent/child tree in two steps:
//!
//! ```text
//! flat list                 index                       tree
//! [r0, r1, r2, r3]   ──►   None  → [r0]          ──►        r0
//!                          r0    → [r1, r2]                /  \
//!                          r1    → [r3]                   r1   r2
//!                                                         │
//!                                                         r3
//! ```
//!
//! One pass groups nodes by parent key, each child list is sorted by the
//! per-document `order` sequence, then the tree is built top-down by lookup,
//! uniformly for every node including the root. O(n log n) overall instead
//! of the naive scan-all-nodes-per-level O(n²).
//!
//! No I/O happens here. The only failure mode is malformed input: a revision
//! set without exactly one parentless node.

use serde::Serialize;
use std::collections::HashMap;

use crate::revision::Revno;

/// One node of the flat input: linkage fields plus a caller-supplied
/// annotation that is opaque to the reconstruction.
#[derive(Debug, Clone)]
pub struct FlatNode<T> {
    pub revno: Revno,
    pub parent: Option<Revno>,
    pub order: u64,
    pub data: T,
}

/// A reconstructed tree node. `children` is ordered by ascending `order`.
///
/// Serializable so callers can ship the tree straight to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    pub revno: Revno,
    pub parent: Option<Revno>,
    pub order: u64,
    pub data: T,
    pub children: Vec<TreeNode<T>>,
}

/// Reconstruction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The revision set did not contain exactly one parentless node.
    MalformedTree { roots: usize },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::MalformedTree { roots } => {
                write!(f, "Malformed revision set: {roots} root nodes (expected exactly 1)")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Rebuild the revision tree from a flat node list.
///
/// Returns `Ok(None)` for empty input (a document with zero revisions cannot
/// occur given the store's invariants, but must not fail here). Otherwise
/// returns the root with all reachable nodes nested under it, children
/// ordered by ascending `order`. Deterministic: the same input always yields
/// the same structure.
pub fn build_tree<T>(nodes: Vec<FlatNode<T>>) -> Result<Option<TreeNode<T>>, TreeError> {
    if nodes.is_empty() {
        return Ok(None);
    }

    // Group by parent key in one pass.
    let mut buckets: HashMap<Option<Revno>, Vec<FlatNode<T>>> = HashMap::new();
    for node in nodes {
        buckets.entry(node.parent.clone()).or_default().push(node);
    }

    // `order` is injective per document, so this yields a total sibling order.
    for children in buckets.values_mut() {
        children.sort_by_key(|node| node.order);
    }

    let mut root_bucket = buckets.remove(&None).unwrap_or_default();
    if root_bucket.len() > 1 {
        return Err(TreeError::MalformedTree { roots: root_bucket.len() });
    }
    let root = match root_bucket.pop() {
        Some(node) => node,
        None => return Err(TreeError::MalformedTree { roots: 0 }),
    };

    Ok(Some(attach(root, &mut buckets)))
}

/// Attach all children of `node` by bucket lookup, depth-first.
///
/// Each bucket is consumed at most once (`remove`), so the recursion
/// terminates even on input with cyclic parent links.
fn attach<T>(
    node: FlatNode<T>,
    buckets: &mut HashMap<Option<Revno>, Vec<FlatNode<T>>>,
) -> TreeNode<T> {
    let children = buckets
        .remove(&Some(node.revno.clone()))
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, buckets))
        .collect();

    TreeNode {
        revno: node.revno,
        parent: node.parent,
        order: node.order,
        data: node.data,
        children,
    }
}
