//! Build nested trees from flat parent-linked rows.
//!
//! Blog categories, product categories, documentation sections and menu
//! items are all stored as `(id, parent_id, sort_order)` rows and served as
//! nested trees.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::DbId;

/// A row that participates in a parent-linked hierarchy.
pub trait TreeItem {
    fn id(&self) -> DbId;
    fn parent_id(&self) -> Option<DbId>;
    fn sort_order(&self) -> i32;
}

/// A node in the built tree. The item's own fields are flattened into the
/// node when serialized, next to a `children` array.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<T: Serialize> {
    #[serde(flatten)]
    pub item: T,
    pub children: Vec<TreeNode<T>>,
}

/// Arrange `items` into a forest ordered by `(sort_order, id)` at every level.
///
/// Items whose parent is missing (or is themselves) become roots. Items that
/// sit on a parent cycle are promoted to roots at the point the cycle is
/// broken, so every input item appears exactly once.
pub fn build_tree<T: TreeItem + Serialize>(mut items: Vec<T>) -> Vec<TreeNode<T>> {
    items.sort_by_key(|i| (i.sort_order(), i.id()));

    let ids: HashSet<DbId> = items.iter().map(TreeItem::id).collect();
    let mut children: HashMap<DbId, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        match item.parent_id() {
            Some(parent) if parent != item.id() && ids.contains(&parent) => {
                children.entry(parent).or_default().push(idx);
            }
            _ => roots.push(idx),
        }
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut forest = Vec::with_capacity(roots.len());

    for idx in roots {
        if let Some(node) = take_node(idx, &mut slots, &children) {
            forest.push(node);
        }
    }

    // Anything still unplaced is on a cycle.
    for idx in 0..slots.len() {
        if let Some(node) = take_node(idx, &mut slots, &children) {
            forest.push(node);
        }
    }

    forest
}

fn take_node<T: TreeItem + Serialize>(
    idx: usize,
    slots: &mut [Option<T>],
    children: &HashMap<DbId, Vec<usize>>,
) -> Option<TreeNode<T>> {
    let item = slots.get_mut(idx)?.take()?;
    let kids = match children.get(&item.id()) {
        Some(child_idxs) => child_idxs
            .iter()
            .filter_map(|&c| take_node(c, slots, children))
            .collect(),
        None => Vec::new(),
    };
    Some(TreeNode {
        item,
        children: kids,
    })
}

/// Collect the ids of `root` and all its descendants.
///
/// Used to reject re-parenting a node under its own subtree.
pub fn descendant_ids<T: TreeItem>(items: &[T], root: DbId) -> HashSet<DbId> {
    let mut by_parent: HashMap<DbId, Vec<DbId>> = HashMap::new();
    for item in items {
        if let Some(p) = item.parent_id() {
            by_parent.entry(p).or_default().push(item.id());
        }
    }
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            if let Some(kids) = by_parent.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }
    }
    seen
}
