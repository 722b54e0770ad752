//! core::verify
//!
//! Structural verification of an [`IpmTree`].
//!
//! # Modes
//!
//! - **Fast verify**: link consistency only
//!   - Ensure a root exists and has no parent
//!   - Ensure parent and child links agree
//!   - Ensure the tree is acyclic
//!   - Ensure the identifier index matches the arena
//!
//! - **Full verify**: also reports floating nodes and untyped attached nodes
//!
//! Run after an interrupted background rebuild before the tree is used
//! interactively again.
//!
//! # Invariants
//!
//! - Never mutates the tree
//! - Must be deterministic

use std::collections::HashSet;

use thiserror::Error;

use super::tree::{IpmTree, NodeKey};

/// Problems found during verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("tree has no root")]
    NoRoot,

    #[error("root '{0}' has a parent")]
    RootHasParent(String),

    #[error("'{child}' is listed under '{parent}' but points at another parent")]
    ParentMismatch { child: String, parent: String },

    #[error("'{0}' is listed more than once in its parent's children")]
    DuplicateChild(String),

    #[error("cycle detected at node '{0}'")]
    CycleDetected(String),

    #[error("identifier '{0}' does not resolve to its node")]
    IndexMismatch(String),

    #[error("node '{0}' is not reachable from the root")]
    Floating(String),

    #[error("node '{0}' has no node type")]
    Untyped(String),
}

/// Result of verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }

    fn from_errors(errors: Vec<VerifyError>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failure(errors)
        }
    }
}

/// Check link consistency of the tree.
pub fn fast_verify(tree: &IpmTree) -> VerifyResult {
    VerifyResult::from_errors(check_links(tree).0)
}

/// Fast checks plus floating and untyped node reports.
pub fn full_verify(tree: &IpmTree) -> VerifyResult {
    let (mut errors, reachable) = check_links(tree);

    for key in tree.keys() {
        let Some(node) = tree.get(key) else { continue };
        if !reachable.contains(&key) {
            if node.parent().is_none() {
                errors.push(VerifyError::Floating(node.id().to_string()));
            }
        } else if node.node_type().is_none() {
            errors.push(VerifyError::Untyped(node.id().to_string()));
        }
    }

    VerifyResult::from_errors(errors)
}

fn check_links(tree: &IpmTree) -> (Vec<VerifyError>, HashSet<NodeKey>) {
    let mut errors = Vec::new();

    for key in tree.keys() {
        let Some(node) = tree.get(key) else { continue };
        if tree.find(node.id()) != Some(key) {
            errors.push(VerifyError::IndexMismatch(node.id().to_string()));
        }

        let mut seen = HashSet::new();
        for &child in node.children() {
            if !seen.insert(child) {
                errors.push(VerifyError::DuplicateChild(name(tree, child)));
            } else if tree.parent(child) != Some(key) {
                errors.push(VerifyError::ParentMismatch {
                    child: name(tree, child),
                    parent: node.id().to_string(),
                });
            }
        }
    }

    let mut reachable = HashSet::new();
    let Some(root) = tree.root() else {
        errors.push(VerifyError::NoRoot);
        return (errors, reachable);
    };
    if tree.parent(root).is_some() {
        errors.push(VerifyError::RootHasParent(name(tree, root)));
    }

    let mut stack = vec![root];
    while let Some(key) = stack.pop() {
        if !reachable.insert(key) {
            errors.push(VerifyError::CycleDetected(name(tree, key)));
            continue;
        }
        stack.extend(tree.children(key).iter().copied());
    }

    (errors, reachable)
}

fn name(tree: &IpmTree, key: NodeKey) -> String {
    tree.get(key)
        .map(|n| n.id().to_string())
        .unwrap_or_else(|| format!("{key:?}"))
}
