//! transform::inheritance
//!
//! Copy selected property values from a node to its descendants.
//!
//! Only descendants whose types declare a constraint for a property type
//! receive it. Descendants without one are passed through, so deeper nodes
//! can still inherit. Ignored subtrees are not visited.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use super::EngineError;
use crate::core::profile::{Cardinality, PropertyType};
use crate::core::property::PropertyValue;
use crate::core::tree::{IpmTree, NodeKey};
use crate::core::types::{NodeId, PropertyTypeId};
use crate::store::{DomainProfileObjectStore, ObjectStore};

/// Which descendants received values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritReport {
    pub updated: Vec<NodeId>,
    /// Visited but unbound, or declaring none of the inherited types.
    pub skipped: Vec<NodeId>,
}

/// Push the values of `inheritable` property types from `key` down its
/// subtree.
///
/// Single-valued targets have their existing value replaced; multi-valued
/// targets gain the values they do not have yet. Read-only types are never
/// inherited.
///
/// # Errors
///
/// Fails if `key` has no bound domain object.
pub fn inherit_metadata(
    store: &mut ObjectStore,
    tree: &IpmTree,
    key: NodeKey,
    inheritable: &BTreeSet<PropertyTypeId>,
) -> Result<InheritReport, EngineError> {
    let node = tree.node(key)?;
    let source = node
        .domain_object()
        .filter(|o| store.contains_object(o))
        .cloned()
        .ok_or_else(|| EngineError::Unbound(node.id().clone()))?;

    let registry = Arc::clone(store.registry());
    let inherited: Vec<(&PropertyType, Vec<PropertyValue>)> = inheritable
        .iter()
        .filter_map(|pt| registry.property_type(pt))
        .filter(|pt| !pt.read_only)
        .map(|pt| (pt, store.get_properties(&source, &pt.id)))
        .filter(|(_, values)| !values.is_empty())
        .collect();

    let mut report = InheritReport::default();
    if inherited.is_empty() {
        return Ok(report);
    }

    let mut visited = HashSet::from([key]);
    let mut stack: Vec<NodeKey> = tree.children(key).iter().rev().copied().collect();

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        let Some(descendant) = tree.get(current) else {
            continue;
        };
        if descendant.is_ignored() {
            continue;
        }
        stack.extend(descendant.children().iter().rev().copied());

        let Some(target) = descendant
            .domain_object()
            .filter(|o| store.contains_object(o))
            .cloned()
        else {
            trace!(node = %descendant.id(), "unbound, not inheriting");
            report.skipped.push(descendant.id().clone());
            continue;
        };

        let mut touched = false;
        for (pt, values) in &inherited {
            let declared = descendant
                .all_types()
                .filter_map(|t| registry.node_type(t))
                .any(|nt| nt.constraint_for(&pt.id).is_some());
            if !declared {
                continue;
            }

            if pt.cardinality == Cardinality::Single {
                store.remove_property_type(&target, &pt.id)?;
                store.add_property(&target, values[0].clone())?;
            } else {
                for value in values {
                    store.add_property(&target, value.clone())?;
                }
            }
            touched = true;
        }

        if touched {
            report.updated.push(descendant.id().clone());
        } else {
            report.skipped.push(descendant.id().clone());
        }
    }

    debug!(
        source = %source,
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        "inherited metadata"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::{
        DomainProfile, FileAssociation, NodeType, PropertyConstraint, ProfileRegistry,
        PropertyValueType,
    };
    use crate::core::tree::Node;
    use crate::core::types::{Iri, NodeTypeId};

    fn iri(s: &str) -> Iri {
        Iri::new(format!("http://example.org/{s}")).unwrap()
    }

    fn nt_id(s: &str) -> NodeTypeId {
        NodeTypeId::from(iri(&format!("types/{s}")))
    }

    fn pt_id(s: &str) -> PropertyTypeId {
        PropertyTypeId::from(iri(&format!("props/{s}")))
    }

    fn property(name: &str, cardinality: Cardinality, read_only: bool) -> PropertyType {
        PropertyType {
            id: pt_id(name),
            label: name.into(),
            description: None,
            value_type: PropertyValueType::String,
            cardinality,
            read_only,
            complex_constraints: vec![],
        }
    }

    fn node_type(name: &str, props: &[&str]) -> NodeType {
        NodeType {
            id: nt_id(name),
            label: name.into(),
            description: None,
            domain_types: vec![],
            property_constraints: props
                .iter()
                .map(|p| PropertyConstraint {
                    property_type: pt_id(p),
                    required: false,
                    default_value: None,
                })
                .collect(),
            supplied_properties: vec![],
            parent_constraints: vec![],
            file_association: FileAssociation::Any,
        }
    }

    fn store() -> ObjectStore {
        let mut profile = DomainProfile::new(iri("profiles/i"), "i");
        profile.property_types = vec![
            property("rights", Cardinality::Multiple, false),
            property("license", Cardinality::Single, false),
            property("locked", Cardinality::Multiple, true),
        ];
        profile.node_types = vec![
            node_type("Collection", &["rights", "license", "locked"]),
            node_type("Folder", &[]),
            node_type("Item", &["rights", "license", "locked"]),
        ];
        ObjectStore::new(Arc::new(ProfileRegistry::new(vec![profile]).unwrap()))
    }

    fn node(id: &str, ty: &str) -> Node {
        Node::new(NodeId::new(format!("urn:node:{id}")).unwrap()).with_type(nt_id(ty))
    }

    fn id(s: &str) -> NodeId {
        NodeId::new(format!("urn:node:{s}")).unwrap()
    }

    /// root(Collection) > folder(Folder) > item(Item), plus unbound(Item)
    /// directly under root.
    fn fixture() -> (ObjectStore, IpmTree, NodeKey, NodeKey) {
        let mut store = store();
        let (mut tree, root) = IpmTree::with_root(node("root", "Collection")).unwrap();
        let folder = tree.insert(node("folder", "Folder")).unwrap();
        let item = tree.insert(node("item", "Item")).unwrap();
        let unbound = tree.insert(node("unbound", "Item")).unwrap();
        tree.attach(root, folder).unwrap();
        tree.attach(folder, item).unwrap();
        tree.attach(root, unbound).unwrap();
        for k in [root, folder, item] {
            store.update_object(&mut tree, k).unwrap();
        }

        let obj = tree.node(root).unwrap().domain_object().unwrap().clone();
        for v in ["CC-BY", "CC0"] {
            store
                .add_property(&obj, PropertyValue::string(pt_id("rights"), v))
                .unwrap();
        }
        store
            .add_property(&obj, PropertyValue::string(pt_id("license"), "new"))
            .unwrap();
        (store, tree, root, item)
    }

    #[test]
    fn passes_through_nodes_without_constraint() {
        let (mut store, tree, root, item) = fixture();
        let inheritable = BTreeSet::from([pt_id("rights")]);
        let report = inherit_metadata(&mut store, &tree, root, &inheritable).unwrap();

        assert_eq!(report.updated, vec![id("item")]);
        assert_eq!(report.skipped, vec![id("folder"), id("unbound")]);

        let obj = tree.node(item).unwrap().domain_object().unwrap();
        assert_eq!(store.get_properties(obj, &pt_id("rights")).len(), 2);
    }

    #[test]
    fn single_valued_target_is_replaced() {
        let (mut store, tree, root, item) = fixture();
        let obj = tree.node(item).unwrap().domain_object().unwrap().clone();
        store
            .add_property(&obj, PropertyValue::string(pt_id("license"), "old"))
            .unwrap();

        let inheritable = BTreeSet::from([pt_id("license")]);
        inherit_metadata(&mut store, &tree, root, &inheritable).unwrap();
        assert_eq!(
            store.get_properties(&obj, &pt_id("license")),
            vec![PropertyValue::string(pt_id("license"), "new")]
        );
    }

    #[test]
    fn repeated_inheritance_is_stable() {
        let (mut store, tree, root, _) = fixture();
        let inheritable = BTreeSet::from([pt_id("rights"), pt_id("license")]);
        inherit_metadata(&mut store, &tree, root, &inheritable).unwrap();
        let once = store.graph().clone();
        inherit_metadata(&mut store, &tree, root, &inheritable).unwrap();
        assert_eq!(store.graph(), &once);
    }

    #[test]
    fn unbound_source_rejected() {
        let mut store = store();
        let (tree, root) = IpmTree::with_root(node("root", "Collection")).unwrap();
        assert_eq!(
            inherit_metadata(&mut store, &tree, root, &BTreeSet::new()),
            Err(EngineError::Unbound(id("root")))
        );
    }

    #[test]
    fn ignored_subtree_not_visited() {
        let (mut store, mut tree, root, _) = fixture();
        let folder = tree.find(&id("folder")).unwrap();
        tree.set_ignored(folder, true, false).unwrap();
        let report =
            inherit_metadata(&mut store, &tree, root, &BTreeSet::from([pt_id("rights")])).unwrap();
        assert!(report.updated.is_empty());
        assert_eq!(report.skipped, vec![id("unbound")]);
    }
}
