//! core::tree
//!
//! The internal package model: an ordered, single-root content tree.
//!
//! # Architecture
//!
//! Nodes live in an arena and refer to each other by [`NodeKey`] handles:
//! - Each node stores its parent handle and an ordered list of child handles
//! - An identifier index gives graph-wide lookup by [`NodeId`]
//! - Nodes may be inserted "floating" (no parent, not the root) and attached later
//!
//! # Invariants
//!
//! - The tree is acyclic
//! - Every node has exactly one parent, except the root and floating nodes
//! - Node identifiers are unique within one tree
//! - Child order is stable and is the order used for traversal and encoding
//!
//! # Example
//!
//! ```
//! use ipmkit::core::tree::{IpmTree, Node};
//! use ipmkit::core::types::NodeId;
//!
//! let mut tree = IpmTree::new();
//! let root = tree.insert(Node::new(NodeId::new("urn:node:root").unwrap())).unwrap();
//! tree.set_root(root).unwrap();
//!
//! let child = tree.insert(Node::new(NodeId::new("urn:node:a").unwrap())).unwrap();
//! tree.attach(root, child).unwrap();
//!
//! // Attaching the root under its own child would create a cycle
//! assert!(tree.attach(child, root).is_err());
//! assert_eq!(tree.children(root), &[child]);
//! ```

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use super::file_info::FileInfo;
use super::types::{NodeId, NodeTypeId, ObjectId};

/// Errors from tree mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node '{0}' already exists in the tree")]
    DuplicateId(NodeId),

    #[error("unknown node handle {0:?}")]
    UnknownNode(NodeKey),

    #[error("node '{0}' already has a parent, detach it first")]
    AlreadyAttached(NodeId),

    #[error("attaching '{child}' under '{parent}' would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },

    #[error("the root node '{0}' cannot be detached")]
    DetachRoot(NodeId),

    #[error("the root node '{0}' cannot become a child")]
    RootAsChild(NodeId),

    #[error("node '{0}' is not attached to a parent")]
    NotAttached(NodeId),

    #[error("tree already has root '{0}'")]
    RootExists(NodeId),

    #[error("child index {index} is out of range for '{parent}' ({len} children)")]
    IndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },
}

/// Handle to a node in an [`IpmTree`].
///
/// Handles are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

/// One element of the content hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    node_type: Option<NodeTypeId>,
    sub_types: Vec<NodeTypeId>,
    file_info: Option<FileInfo>,
    domain_object: Option<ObjectId>,
    ignored: bool,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    /// A new, untyped, unbound node.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            node_type: None,
            sub_types: Vec::new(),
            file_info: None,
            domain_object: None,
            ignored: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_type(mut self, node_type: NodeTypeId) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn with_file_info(mut self, info: FileInfo) -> Self {
        self.file_info = Some(info);
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// The primary node type, if one has been assigned.
    pub fn node_type(&self) -> Option<&NodeTypeId> {
        self.node_type.as_ref()
    }

    pub fn set_node_type(&mut self, node_type: Option<NodeTypeId>) {
        self.node_type = node_type;
    }

    pub fn sub_types(&self) -> &[NodeTypeId] {
        &self.sub_types
    }

    /// Add a sub-type. Adding one that is already present is a no-op.
    pub fn add_sub_type(&mut self, sub_type: NodeTypeId) {
        if !self.sub_types.contains(&sub_type) {
            self.sub_types.push(sub_type);
        }
    }

    pub fn remove_sub_type(&mut self, sub_type: &NodeTypeId) {
        self.sub_types.retain(|t| t != sub_type);
    }

    /// Primary type followed by sub-types.
    pub fn all_types(&self) -> impl Iterator<Item = &NodeTypeId> {
        self.node_type.iter().chain(self.sub_types.iter())
    }

    pub fn file_info(&self) -> Option<&FileInfo> {
        self.file_info.as_ref()
    }

    pub fn set_file_info(&mut self, info: Option<FileInfo>) {
        self.file_info = info;
    }

    pub fn domain_object(&self) -> Option<&ObjectId> {
        self.domain_object.as_ref()
    }

    pub fn set_domain_object(&mut self, object: Option<ObjectId>) {
        self.domain_object = object;
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

/// Owned, nested copy of a subtree, comparable by value.
///
/// Handles are replaced by nested children so two trees built
/// independently compare equal when their content is equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub node_type: Option<NodeTypeId>,
    pub sub_types: Vec<NodeTypeId>,
    pub ignored: bool,
    pub domain_object: Option<ObjectId>,
    pub file_info: Option<FileInfo>,
    pub children: Vec<NodeSnapshot>,
}

/// Arena-backed content tree.
#[derive(Debug, Clone, Default)]
pub struct IpmTree {
    slots: Vec<Option<Node>>,
    index: HashMap<NodeId, NodeKey>,
    root: Option<NodeKey>,
}

impl IpmTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a floating node. Any parent/child links on `node` are cleared.
    pub fn insert(&mut self, mut node: Node) -> Result<NodeKey, TreeError> {
        if self.index.contains_key(&node.id) {
            return Err(TreeError::DuplicateId(node.id));
        }
        node.parent = None;
        node.children.clear();

        let key = NodeKey(self.slots.len());
        self.index.insert(node.id.clone(), key);
        self.slots.push(Some(node));
        Ok(key)
    }

    /// Make a floating node the root.
    pub fn set_root(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if let Some(root) = self.root {
            return Err(TreeError::RootExists(self.node(root)?.id.clone()));
        }
        let node = self.node(key)?;
        if node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(node.id.clone()));
        }
        self.root = Some(key);
        Ok(())
    }

    /// Build a tree holding a single root node.
    pub fn with_root(node: Node) -> Result<(Self, NodeKey), TreeError> {
        let mut tree = Self::new();
        let key = tree.insert(node)?;
        tree.set_root(key)?;
        Ok((tree, key))
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub fn is_root(&self, key: NodeKey) -> bool {
        self.root == Some(key)
    }

    /// Number of nodes in the arena, attached or floating.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.slots.get(key.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.slots.get_mut(key.0).and_then(Option::as_mut)
    }

    /// Like [`get`](Self::get), failing with `UnknownNode`.
    pub fn node(&self, key: NodeKey) -> Result<&Node, TreeError> {
        self.get(key).ok_or(TreeError::UnknownNode(key))
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node, TreeError> {
        self.get_mut(key).ok_or(TreeError::UnknownNode(key))
    }

    /// Look up a node by identifier anywhere in the tree.
    pub fn find(&self, id: &NodeId) -> Option<NodeKey> {
        self.index.get(id).copied()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.get(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Handles of every live node, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeKey(i))
    }

    /// Ancestors of a node, from its parent up to the top.
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut current = self.parent(key);
        while let Some(parent) = current {
            result.push(parent);
            current = self.parent(parent);
        }
        result
    }

    /// Whether `ancestor` is a proper ancestor of `key`.
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = self.parent(key);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Descendants of a node in depth-first pre-order, excluding the node.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        self.walk(key, true).into_iter().skip(1).collect()
    }

    /// Attach a floating node as the last child of `parent`.
    pub fn attach(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        let len = self.node(parent)?.children.len();
        self.attach_at(parent, child, len)
    }

    /// Attach a floating node at a position in `parent`'s child list.
    ///
    /// # Errors
    ///
    /// - `AlreadyAttached` if `child` has a parent
    /// - `RootAsChild` if `child` is the root
    /// - `Cycle` if `child` is `parent` or one of its ancestors
    /// - `IndexOutOfRange` if `index` is past the end of the child list
    ///
    /// The tree is unchanged on error.
    pub fn attach_at(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        index: usize,
    ) -> Result<(), TreeError> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        if child_node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child_node.id.clone()));
        }
        if self.is_root(child) {
            return Err(TreeError::RootAsChild(child_node.id.clone()));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle {
                child: child_node.id.clone(),
                parent: parent_node.id.clone(),
            });
        }
        let len = parent_node.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange {
                parent: parent_node.id.clone(),
                index,
                len,
            });
        }

        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach a node (with its subtree) from its parent. The node stays in
    /// the tree as a floating subtree.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), TreeError> {
        let node = self.node(key)?;
        if self.is_root(key) {
            return Err(TreeError::DetachRoot(node.id.clone()));
        }
        let parent = node
            .parent
            .ok_or_else(|| TreeError::NotAttached(node.id.clone()))?;

        self.node_mut(parent)?.children.retain(|&c| c != key);
        self.node_mut(key)?.parent = None;
        Ok(())
    }

    /// Remove a node and its whole subtree from the tree.
    ///
    /// Returns the removed nodes in depth-first pre-order so callers can
    /// release their domain objects.
    pub fn remove(&mut self, key: NodeKey) -> Result<Vec<Node>, TreeError> {
        let node = self.node(key)?;
        if self.is_root(key) {
            return Err(TreeError::DetachRoot(node.id.clone()));
        }
        if node.parent.is_some() {
            self.detach(key)?;
        }

        let mut removed = Vec::new();
        for k in self.walk(key, true) {
            if let Some(node) = self.slots.get_mut(k.0).and_then(Option::take) {
                self.index.remove(&node.id);
                removed.push(node);
            }
        }
        Ok(removed)
    }

    /// Insert `node` between `child` and its parent.
    ///
    /// The new node takes `child`'s position in its parent's child list (or
    /// becomes the root if `child` was the root) and `child` becomes its
    /// only child.
    pub fn insert_parent(&mut self, child: NodeKey, node: Node) -> Result<NodeKey, TreeError> {
        self.node(child)?;
        let new_key = self.insert(node)?;

        if self.is_root(child) {
            self.root = Some(new_key);
        } else if let Some(parent) = self.parent(child) {
            let siblings = &mut self.node_mut(parent)?.children;
            if let Some(pos) = siblings.iter().position(|&c| c == child) {
                siblings[pos] = new_key;
            }
            self.node_mut(new_key)?.parent = Some(parent);
        }

        self.node_mut(child)?.parent = Some(new_key);
        self.node_mut(new_key)?.children.push(child);
        Ok(new_key)
    }

    /// Set the ignore flag on a node, optionally on its whole subtree.
    pub fn set_ignored(
        &mut self,
        key: NodeKey,
        ignored: bool,
        recursive: bool,
    ) -> Result<(), TreeError> {
        let targets = if recursive {
            self.walk(key, true)
        } else {
            self.node(key)?;
            vec![key]
        };
        for k in targets {
            self.node_mut(k)?.ignored = ignored;
        }
        Ok(())
    }

    /// Depth-first pre-order traversal from the root.
    ///
    /// With `include_ignored == false`, ignored nodes and everything below
    /// them are left out.
    pub fn depth_first(&self, include_ignored: bool) -> Vec<NodeKey> {
        match self.root {
            Some(root) => self.walk(root, include_ignored),
            None => Vec::new(),
        }
    }

    /// Depth-first pre-order traversal from `start`, including `start`.
    pub fn walk(&self, start: NodeKey, include_ignored: bool) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            let Some(node) = self.get(key) else {
                continue;
            };
            if node.ignored && !include_ignored {
                continue;
            }
            result.push(key);
            stack.extend(node.children.iter().rev().copied());
        }
        result
    }

    /// Depth of a node below the top of its subtree (the root has depth 0).
    pub fn depth(&self, key: NodeKey) -> usize {
        self.ancestors(key).len()
    }

    /// Owned copy of the whole tree.
    pub fn snapshot(&self) -> Option<NodeSnapshot> {
        self.root.and_then(|r| self.snapshot_of(r))
    }

    /// Owned copy of the subtree at `key`.
    pub fn snapshot_of(&self, key: NodeKey) -> Option<NodeSnapshot> {
        let node = self.get(key)?;
        Some(NodeSnapshot {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            sub_types: node.sub_types.clone(),
            ignored: node.ignored,
            domain_object: node.domain_object.clone(),
            file_info: node.file_info.clone(),
            children: node
                .children
                .iter()
                .filter_map(|&c| self.snapshot_of(c))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> NodeId {
        NodeId::new(format!("urn:node:{name}")).unwrap()
    }

    /// root -> [a -> [c], b]
    fn sample() -> (IpmTree, [NodeKey; 4]) {
        let (mut tree, root) = IpmTree::with_root(Node::new(id("root"))).unwrap();
        let a = tree.insert(Node::new(id("a"))).unwrap();
        let b = tree.insert(Node::new(id("b"))).unwrap();
        let c = tree.insert(Node::new(id("c"))).unwrap();
        tree.attach(root, a).unwrap();
        tree.attach(root, b).unwrap();
        tree.attach(a, c).unwrap();
        (tree, [root, a, b, c])
    }

    mod insert {
        use super::*;

        #[test]
        fn duplicate_id_rejected() {
            let (mut tree, _) = sample();
            let err = tree.insert(Node::new(id("a"))).unwrap_err();
            assert_eq!(err, TreeError::DuplicateId(id("a")));
        }

        #[test]
        fn find_is_tree_wide() {
            let (tree, [_, _, _, c]) = sample();
            assert_eq!(tree.find(&id("c")), Some(c));
            assert_eq!(tree.find(&id("zzz")), None);
        }

        #[test]
        fn second_root_rejected() {
            let (mut tree, _) = sample();
            let other = tree.insert(Node::new(id("other"))).unwrap();
            assert!(matches!(tree.set_root(other), Err(TreeError::RootExists(_))));
        }
    }

    mod attach {
        use super::*;

        #[test]
        fn appends_in_order() {
            let (tree, [root, a, b, _]) = sample();
            assert_eq!(tree.children(root), &[a, b]);
            assert_eq!(tree.parent(a), Some(root));
        }

        #[test]
        fn at_index() {
            let (mut tree, [root, a, b, _]) = sample();
            let d = tree.insert(Node::new(id("d"))).unwrap();
            tree.attach_at(root, d, 1).unwrap();
            assert_eq!(tree.children(root), &[a, d, b]);
        }

        #[test]
        fn index_out_of_range() {
            let (mut tree, [root, ..]) = sample();
            let d = tree.insert(Node::new(id("d"))).unwrap();
            assert!(matches!(
                tree.attach_at(root, d, 5),
                Err(TreeError::IndexOutOfRange { index: 5, len: 2, .. })
            ));
        }

        #[test]
        fn already_attached_rejected() {
            let (mut tree, [_, a, b, _]) = sample();
            assert_eq!(
                tree.attach(b, a),
                Err(TreeError::AlreadyAttached(id("a")))
            );
        }

        #[test]
        fn cycle_rejected_without_mutation() {
            let (mut tree, [_, a, _, c]) = sample();
            tree.detach(a).unwrap();
            let before = tree.snapshot_of(a);

            let err = tree.attach(c, a).unwrap_err();
            assert!(matches!(err, TreeError::Cycle { .. }));
            assert_eq!(tree.snapshot_of(a), before);
            assert_eq!(tree.parent(a), None);
        }

        #[test]
        fn self_attach_rejected() {
            let (mut tree, _) = sample();
            let d = tree.insert(Node::new(id("d"))).unwrap();
            assert!(matches!(tree.attach(d, d), Err(TreeError::Cycle { .. })));
        }

        #[test]
        fn root_cannot_become_child() {
            let (mut tree, [root, ..]) = sample();
            let d = tree.insert(Node::new(id("d"))).unwrap();
            assert_eq!(tree.attach(d, root), Err(TreeError::RootAsChild(id("root"))));
        }
    }

    mod detach {
        use super::*;

        #[test]
        fn leaves_floating_subtree() {
            let (mut tree, [root, a, b, c]) = sample();
            tree.detach(a).unwrap();
            assert_eq!(tree.children(root), &[b]);
            assert_eq!(tree.parent(a), None);
            assert_eq!(tree.children(a), &[c]);
            assert_eq!(tree.find(&id("c")), Some(c));
        }

        #[test]
        fn root_rejected() {
            let (mut tree, [root, ..]) = sample();
            assert_eq!(tree.detach(root), Err(TreeError::DetachRoot(id("root"))));
        }

        #[test]
        fn floating_rejected() {
            let (mut tree, _) = sample();
            let d = tree.insert(Node::new(id("d"))).unwrap();
            assert_eq!(tree.detach(d), Err(TreeError::NotAttached(id("d"))));
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn removes_subtree() {
            let (mut tree, [root, a, b, _]) = sample();
            let removed = tree.remove(a).unwrap();
            let ids: Vec<_> = removed.iter().map(|n| n.id().clone()).collect();
            assert_eq!(ids, vec![id("a"), id("c")]);
            assert_eq!(tree.children(root), &[b]);
            assert_eq!(tree.find(&id("c")), None);
            assert_eq!(tree.len(), 2);
            assert!(tree.get(a).is_none());
        }

        #[test]
        fn id_reusable_after_remove() {
            let (mut tree, [_, a, ..]) = sample();
            tree.remove(a).unwrap();
            assert!(tree.insert(Node::new(id("a"))).is_ok());
        }
    }

    mod insert_parent {
        use super::*;

        #[test]
        fn takes_child_position() {
            let (mut tree, [root, a, b, c]) = sample();
            let p = tree.insert_parent(b, Node::new(id("p"))).unwrap();
            assert_eq!(tree.children(root), &[a, p]);
            assert_eq!(tree.children(p), &[b]);
            assert_eq!(tree.parent(b), Some(p));
            assert_eq!(tree.parent(p), Some(root));
            assert_eq!(tree.children(a), &[c]);
        }

        #[test]
        fn above_root_becomes_root() {
            let (mut tree, [root, ..]) = sample();
            let p = tree.insert_parent(root, Node::new(id("p"))).unwrap();
            assert_eq!(tree.root(), Some(p));
            assert_eq!(tree.parent(root), Some(p));
        }
    }

    mod traversal {
        use super::*;

        #[test]
        fn depth_first_preorder() {
            let (tree, [root, a, b, c]) = sample();
            assert_eq!(tree.depth_first(true), vec![root, a, c, b]);
        }

        #[test]
        fn ignored_subtree_hidden() {
            let (mut tree, [root, a, b, c]) = sample();
            tree.set_ignored(a, true, false).unwrap();
            assert_eq!(tree.depth_first(false), vec![root, b]);
            assert_eq!(tree.depth_first(true), vec![root, a, c, b]);
            assert!(!tree.node(c).unwrap().is_ignored());
        }

        #[test]
        fn recursive_ignore() {
            let (mut tree, [_, a, _, c]) = sample();
            tree.set_ignored(a, true, true).unwrap();
            assert!(tree.node(c).unwrap().is_ignored());
            tree.set_ignored(a, false, true).unwrap();
            assert!(!tree.node(c).unwrap().is_ignored());
        }

        #[test]
        fn ancestors_nearest_first() {
            let (tree, [root, a, _, c]) = sample();
            assert_eq!(tree.ancestors(c), vec![a, root]);
            assert!(tree.is_ancestor(root, c));
            assert!(!tree.is_ancestor(c, root));
            assert_eq!(tree.depth(c), 2);
        }

        #[test]
        fn descendants_exclude_self() {
            let (tree, [root, a, b, c]) = sample();
            assert_eq!(tree.descendants(root), vec![a, c, b]);
            assert!(tree.descendants(c).is_empty());
        }
    }

    mod snapshot {
        use super::*;

        #[test]
        fn independent_trees_compare_equal() {
            let (one, _) = sample();
            let (two, _) = sample();
            assert_eq!(one.snapshot(), two.snapshot());
        }

        #[test]
        fn child_order_matters() {
            let (one, _) = sample();
            let (mut two, [root, a, ..]) = sample();
            two.detach(a).unwrap();
            two.attach(root, a).unwrap();
            assert_ne!(one.snapshot(), two.snapshot());
        }
    }
}
