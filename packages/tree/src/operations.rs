//! # Tree Operations
//!
//! The mutation algebra over component trees.
//!
//! Every operation is pure: the input tree is borrowed, never modified,
//! and a new tree is returned. Each is a single O(n) walk plus one full
//! clone, which is fine for documents of a few hundred to ~1000 nodes.
//!
//! ## Semantics
//!
//! ### Update
//! - Props merge shallowly; a `style` object merges one level deep
//! - Content is replaced when the patch carries it
//! - Unknown id is a no-op, not an error
//!
//! ### Delete
//! - Removes the node and its whole subtree
//! - Deleting the root yields `None`, never a partial tree
//!
//! ### Move
//! - Swaps with the adjacent sibling
//! - First child up / last child down is a no-op
//!
//! ### Duplicate
//! - Deep clone with a fresh id on every cloned node
//! - Inserted right after the original

use crate::error::TreeResult;
use crate::id_generator::IdGenerator;
use crate::node::{Node, Patch};
use crate::path::{self, position_of, resolve_path_mut};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Direction for [`move_component`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// First node (pre-order) carrying `id`
pub fn find_by_id<'a>(root: &'a Node, id: &str) -> Option<&'a Node> {
    if root.id == id {
        return Some(root);
    }
    root.children().iter().find_map(|child| find_by_id(child, id))
}

pub fn find_by_path<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    path::resolve(root, path)
}

pub fn update_by_id(root: &Node, id: &str, patch: &Patch) -> Node {
    let mut next = root.clone();
    let Some(positions) = position_of(root, id) else {
        debug!(node_id = %id, "update target not in tree, returning unchanged");
        return next;
    };

    if let Some(target) = resolve_path_mut(&mut next, &positions) {
        patch.apply_to(target);
    }
    next
}

/// Merge `patch` into the node at `path`. Unresolvable paths fail with
/// [`crate::TreeError::PathInvalid`] and nothing is cloned.
pub fn update_at_path(root: &Node, path: &str, patch: &Patch) -> TreeResult<Node> {
    let (parsed, _) = path::resolve_for_mutation(root, path)?;

    let mut next = root.clone();
    if let Some(target) = resolve_path_mut(&mut next, parsed.positions()) {
        patch.apply_to(target);
    }
    Ok(next)
}

/// Remove `id` and its subtree. `None` means the root itself was deleted.
pub fn delete_by_id(root: &Node, id: &str) -> Option<Node> {
    let Some(positions) = position_of(root, id) else {
        debug!(node_id = %id, "delete target not in tree, returning unchanged");
        return Some(root.clone());
    };

    let Some((&index, parent_positions)) = positions.split_last() else {
        debug!(node_id = %id, "root deleted");
        return None;
    };

    let mut next = root.clone();
    if let Some(parent) = resolve_path_mut(&mut next, parent_positions) {
        parent.children_mut().remove(index);
    }
    Some(next)
}

pub fn move_component(root: &Node, id: &str, direction: Direction) -> Node {
    let mut next = root.clone();
    let Some(positions) = position_of(root, id) else {
        return next;
    };
    let Some((&index, parent_positions)) = positions.split_last() else {
        return next;
    };

    let Some(parent) = resolve_path_mut(&mut next, parent_positions) else {
        return next;
    };
    let siblings = parent.children_mut();

    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < siblings.len() => index + 1,
        _ => {
            debug!(node_id = %id, ?direction, "move at boundary is a no-op");
            return next;
        }
    };
    siblings.swap(index, target);
    next
}

pub fn duplicate_component(root: &Node, id: &str, ids: &mut IdGenerator) -> Node {
    let mut next = root.clone();
    let Some(positions) = position_of(root, id) else {
        return next;
    };
    let Some((&index, parent_positions)) = positions.split_last() else {
        debug!(node_id = %id, "root cannot be duplicated");
        return next;
    };

    let Some(original) = path::resolve_path(root, &path::Path::from_positions(positions.clone()))
    else {
        return next;
    };

    let mut fresh = ids.fresh_for(root, original.subtree_size()).into_iter();
    let mut clone = original.clone();
    relabel(&mut clone, &mut fresh);

    if let Some(parent) = resolve_path_mut(&mut next, parent_positions) {
        parent.children_mut().insert(index + 1, clone);
    }
    next
}

fn relabel(node: &mut Node, ids: &mut impl Iterator<Item = String>) {
    if let Some(id) = ids.next() {
        node.id = id;
    }
    if let Some(children) = node.children.as_mut() {
        for child in children {
            relabel(child, ids);
        }
    }
}

/// Component types from the root down to `id`, inclusive
pub fn breadcrumbs(root: &Node, id: &str) -> Vec<String> {
    let Some(positions) = position_of(root, id) else {
        return Vec::new();
    };

    let mut crumbs = vec![root.component_type.clone()];
    let mut node = root;
    for index in positions {
        match node.children().get(index) {
            Some(child) => {
                crumbs.push(child.component_type.clone());
                node = child;
            }
            None => break,
        }
    }
    crumbs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub node_count: usize,
    /// Root depth is 0
    pub max_depth: usize,
    pub editable_count: usize,
}

pub fn tree_stats(root: &Node, registry: &Registry) -> TreeStats {
    let mut stats = TreeStats {
        node_count: 0,
        max_depth: 0,
        editable_count: 0,
    };
    root.walk(&mut |node, depth| {
        stats.node_count += 1;
        stats.max_depth = stats.max_depth.max(depth);
        if registry.is_editable(&node.component_type) {
            stats.editable_count += 1;
        }
    });
    stats
}
