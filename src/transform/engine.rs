//! transform::engine
//!
//! Advisory planning and commit of node type transforms.
//!
//! # Invariants
//!
//! - Planning never mutates the tree or the store
//! - A plan records each target's type at planning time; commit refuses a
//!   plan whose targets have changed since
//! - Commit checks every target before mutating any of them
//! - Targets are processed top-down so parents are resynced before children

use std::collections::HashSet;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::EngineError;
use crate::core::config::DEFAULT_ID_BASE;
use crate::core::profile::{NodeTransform, ProfileRegistry};
use crate::core::property::PropertyValue;
use crate::core::tree::{IpmTree, Node, NodeKey};
use crate::core::types::{Iri, NodeId, NodeTypeId, PropertyTypeId};
use crate::store::{
    invalid_property_types, DomainProfileObjectStore, ObjectStore, PreconditionFailure,
    StoreError,
};

/// A property whose type no assigned node type would declare after the
/// transform. Reported to the caller; nothing is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyLossAdvisory {
    pub node: NodeId,
    pub property_type: PropertyTypeId,
    /// The values currently set, so the caller can show what would be lost.
    pub values: Vec<PropertyValue>,
}

/// One node a plan will retype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedNode {
    #[serde(skip)]
    pub key: NodeKey,
    pub node: NodeId,
    pub from: NodeTypeId,
    pub to: NodeTypeId,
}

/// Read-only preview of a transform over a selection of nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformPlan {
    pub transform: Iri,
    /// Targets in top-down order.
    pub targets: Vec<PlannedNode>,
    pub insert_parent_type: Option<NodeTypeId>,
    pub advisories: Vec<PropertyLossAdvisory>,
}

impl TransformPlan {
    /// Whether committing would leave every current property valid.
    pub fn is_lossless(&self) -> bool {
        self.advisories.is_empty()
    }

    /// Advisories for one node.
    pub fn advisories_for<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a PropertyLossAdvisory> + 'a {
        self.advisories.iter().filter(move |a| &a.node == node)
    }

    /// SHA-256 over the plan's JSON form, prefixed `sha256:`.
    ///
    /// Lets a caller confirm that the plan it showed is the plan it commits.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error rather than hashing a partial form.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
    }
}

/// What a commit changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub transformed: Vec<NodeKey>,
    /// Synthetic parents inserted above transformed nodes.
    pub inserted: Vec<NodeKey>,
    /// Number of `update_object` calls made.
    pub resynced: usize,
}

/// Plans and commits node type transforms.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    node_base: String,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ID_BASE)
    }
}

impl TransformEngine {
    /// `node_base` prefixes the identifiers of synthetic parent nodes.
    pub fn new(node_base: impl Into<String>) -> Self {
        Self {
            node_base: node_base.into(),
        }
    }

    /// Transforms that apply to every node in `nodes`.
    ///
    /// An empty selection has no transforms. Ignored and untyped nodes match
    /// nothing.
    pub fn available_transforms<'r>(
        &self,
        registry: &'r ProfileRegistry,
        tree: &IpmTree,
        nodes: &[NodeKey],
    ) -> Vec<&'r NodeTransform> {
        if nodes.is_empty() {
            return Vec::new();
        }
        registry
            .transforms()
            .filter(|tr| nodes.iter().all(|&k| applies(registry, tree, k, tr)))
            .collect()
    }

    /// Build the advisory plan for applying `transform` to `nodes`.
    ///
    /// # Errors
    ///
    /// Fails if the transform is unknown or does not apply to one of the
    /// nodes.
    pub fn plan(
        &self,
        store: &ObjectStore,
        tree: &IpmTree,
        nodes: &[NodeKey],
        transform: &Iri,
    ) -> Result<TransformPlan, EngineError> {
        let registry = store.registry();
        let tr = registry
            .transform(transform)
            .ok_or_else(|| EngineError::UnknownTransform(transform.clone()))?;

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        let mut advisories = Vec::new();

        for &key in nodes {
            if !seen.insert(key) {
                continue;
            }
            let node = tree.node(key)?;
            let from = match node.node_type() {
                Some(t) if applies(registry, tree, key, tr) => t.clone(),
                _ => {
                    return Err(EngineError::NotApplicable {
                        node: node.id().clone(),
                        transform: tr.id.clone(),
                    })
                }
            };

            if let Some(object) = node.domain_object().filter(|o| store.contains_object(o)) {
                let after: Vec<&NodeTypeId> = std::iter::once(&tr.result_type)
                    .chain(node.sub_types())
                    .collect();
                for property_type in invalid_property_types(store, object, &after) {
                    advisories.push(PropertyLossAdvisory {
                        node: node.id().clone(),
                        values: store.get_properties(object, &property_type),
                        property_type,
                    });
                }
            }

            targets.push(PlannedNode {
                key,
                node: node.id().clone(),
                from,
                to: tr.result_type.clone(),
            });
        }

        targets.sort_by_key(|t| tree.depth(t.key));

        Ok(TransformPlan {
            transform: tr.id.clone(),
            targets,
            insert_parent_type: tr.insert_parent_type.clone(),
            advisories,
        })
    }

    /// Apply an accepted plan.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Stale` if a target no longer has the type it
    /// had at planning time, and a precondition error if a target's parent
    /// has no domain object. In both cases nothing is changed.
    pub fn commit(
        &self,
        store: &mut ObjectStore,
        tree: &mut IpmTree,
        plan: &TransformPlan,
    ) -> Result<CommitReport, EngineError> {
        let planned: HashSet<NodeKey> = plan.targets.iter().map(|t| t.key).collect();

        for target in &plan.targets {
            let node = tree.node(target.key)?;
            if node.id() != &target.node || node.node_type() != Some(&target.from) {
                return Err(EngineError::Stale {
                    node: target.node.clone(),
                    expected: target.from.clone(),
                    found: node.node_type().cloned(),
                });
            }
            let Some(parent) = tree.parent(target.key) else {
                continue;
            };
            let parent_node = tree.node(parent)?;
            let bound = parent_node
                .domain_object()
                .is_some_and(|o| store.contains_object(o));
            if !bound && !planned.contains(&parent) {
                return Err(StoreError::Precondition {
                    node: target.node.clone(),
                    reason: PreconditionFailure::ParentUnbound {
                        parent: parent_node.id().clone(),
                    },
                }
                .into());
            }
        }

        let mut report = CommitReport::default();
        for target in &plan.targets {
            tree.node_mut(target.key)?
                .set_node_type(Some(target.to.clone()));

            if let Some(parent_type) = &plan.insert_parent_type {
                let synthetic = Node::new(NodeId::mint(&self.node_base)).with_type(parent_type.clone());
                let parent = tree.insert_parent(target.key, synthetic)?;
                store.update_object(tree, parent)?;
                report.inserted.push(parent);
                report.resynced += 1;
            }

            store.update_object(tree, target.key)?;
            report.resynced += 1;
            report.transformed.push(target.key);

            // Children re-derive their structural relation from the new type.
            let children: Vec<NodeKey> = tree.children(target.key).to_vec();
            for child in children {
                let ready = tree.get(child).is_some_and(|c| {
                    c.node_type().is_some()
                        && c.domain_object().is_some_and(|o| store.contains_object(o))
                });
                if ready && !planned.contains(&child) {
                    store.update_object(tree, child)?;
                    report.resynced += 1;
                }
            }
        }

        debug!(
            transform = %plan.transform,
            transformed = report.transformed.len(),
            inserted = report.inserted.len(),
            resynced = report.resynced,
            "committed transform"
        );
        Ok(report)
    }

    /// Plan and commit in one step, for callers that have already accepted
    /// any advisories.
    pub fn apply_transform(
        &self,
        store: &mut ObjectStore,
        tree: &mut IpmTree,
        nodes: &[NodeKey],
        transform: &Iri,
    ) -> Result<(TransformPlan, CommitReport), EngineError> {
        let plan = self.plan(store, tree, nodes, transform)?;
        let report = self.commit(store, tree, &plan)?;
        Ok((plan, report))
    }
}

fn applies(registry: &ProfileRegistry, tree: &IpmTree, key: NodeKey, tr: &NodeTransform) -> bool {
    let Some(node) = tree.get(key) else {
        return false;
    };
    let Some(node_type) = node.node_type() else {
        return false;
    };
    if node.is_ignored() {
        return false;
    }
    let parent_type = tree
        .parent(key)
        .and_then(|p| tree.get(p))
        .and_then(|p| p.node_type());
    registry
        .matching_transforms(node_type, parent_type)
        .any(|m| m.id == tr.id)
}
