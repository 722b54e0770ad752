//! store::validate
//!
//! Report how bound domain objects deviate from their node types.
//!
//! Validation never mutates anything. A resync keeps property values that
//! are no longer valid, and this is where they show up.

use std::collections::BTreeSet;

use crate::core::file_info::FileInfo;
use crate::core::profile::{Cardinality, FileAssociation, PropertyConstraint, ProfileRegistry};
use crate::core::property::PropertyValue;
use crate::core::tree::{IpmTree, NodeKey};
use crate::core::types::{NodeId, NodeTypeId, PropertyTypeId};

use super::{DomainProfileObjectStore, ObjectStore};

/// One way a set of property values breaks its constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyViolation {
    MissingRequired {
        property_type: PropertyTypeId,
    },
    TooManyValues {
        property_type: PropertyTypeId,
        count: usize,
    },
    /// No assigned node type (or complex parent) declares the property.
    NotAllowed {
        property_type: PropertyTypeId,
    },
    /// A violation inside one value of a complex property.
    InComplex {
        property_type: PropertyTypeId,
        violation: Box<PropertyViolation>,
    },
}

/// One problem with a node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeViolation {
    Untyped {
        node: NodeId,
    },
    UnknownType {
        node: NodeId,
        node_type: NodeTypeId,
    },
    Unbound {
        node: NodeId,
    },
    FileAssociation {
        node: NodeId,
        node_type: NodeTypeId,
        expected: FileAssociation,
    },
    /// The primary type does not accept the parent's type (or the root
    /// position when `parent_type` is `None`).
    ParentType {
        node: NodeId,
        parent_type: Option<NodeTypeId>,
    },
    Property {
        node: NodeId,
        violation: PropertyViolation,
    },
}

/// Check one node's bound object against all of the node's types.
///
/// Unbound or untyped nodes have nothing to check and yield no violations.
pub fn validate_object(store: &ObjectStore, tree: &IpmTree, key: NodeKey) -> Vec<PropertyViolation> {
    let registry = store.registry();
    let Some(node) = tree.get(key) else {
        return Vec::new();
    };
    let Some(object) = node.domain_object() else {
        return Vec::new();
    };

    let constraints: Vec<&PropertyConstraint> = node
        .all_types()
        .filter_map(|t| registry.node_type(t))
        .flat_map(|nt| nt.property_constraints.iter())
        .collect();
    let allowed = registry.valid_property_types(node.all_types());

    let present = store.property_types(object);
    let mut violations = Vec::new();

    for pt in &present {
        if !allowed.contains(pt) {
            violations.push(PropertyViolation::NotAllowed {
                property_type: pt.clone(),
            });
        }
    }

    let values: Vec<PropertyValue> = present
        .iter()
        .flat_map(|pt| store.get_properties(object, pt))
        .collect();
    check_values(registry, &constraints, &values, &mut violations);
    violations
}

/// Required/cardinality checks shared by objects and complex values.
fn check_values(
    registry: &ProfileRegistry,
    constraints: &[&PropertyConstraint],
    values: &[PropertyValue],
    out: &mut Vec<PropertyViolation>,
) {
    let mut required = BTreeSet::new();
    for c in constraints.iter().filter(|c| c.required) {
        if required.insert(&c.property_type)
            && !values.iter().any(|v| v.property_type() == &c.property_type)
        {
            out.push(PropertyViolation::MissingRequired {
                property_type: c.property_type.clone(),
            });
        }
    }

    let mut counted = BTreeSet::new();
    for value in values {
        let id = value.property_type();
        let Some(pt) = registry.property_type(id) else {
            continue;
        };
        if pt.cardinality == Cardinality::Single && counted.insert(id) {
            let count = values.iter().filter(|v| v.property_type() == id).count();
            if count > 1 {
                out.push(PropertyViolation::TooManyValues {
                    property_type: id.clone(),
                    count,
                });
            }
        }

        if value.parts().is_empty() && pt.complex_constraints.is_empty() {
            continue;
        }
        let mut nested = Vec::new();
        for part in value.parts() {
            if !pt
                .complex_constraints
                .iter()
                .any(|c| &c.property_type == part.property_type())
            {
                nested.push(PropertyViolation::NotAllowed {
                    property_type: part.property_type().clone(),
                });
            }
        }
        let inner: Vec<&PropertyConstraint> = pt.complex_constraints.iter().collect();
        check_values(registry, &inner, value.parts(), &mut nested);
        out.extend(nested.into_iter().map(|v| PropertyViolation::InComplex {
            property_type: id.clone(),
            violation: Box::new(v),
        }));
    }
}

/// Check every visible node of the tree, in depth-first order.
///
/// Ignored subtrees are skipped.
pub fn validate_tree(store: &ObjectStore, tree: &IpmTree) -> Vec<NodeViolation> {
    let registry = store.registry();
    let mut violations = Vec::new();

    for key in tree.depth_first(false) {
        let Some(node) = tree.get(key) else {
            continue;
        };
        let id = node.id().clone();

        let Some(primary) = node.node_type() else {
            violations.push(NodeViolation::Untyped { node: id });
            continue;
        };

        let mut resolved = true;
        for t in node.all_types() {
            if registry.node_type(t).is_none() {
                violations.push(NodeViolation::UnknownType {
                    node: id.clone(),
                    node_type: t.clone(),
                });
                resolved = false;
            }
        }
        let Some(nt) = registry.node_type(primary).filter(|_| resolved) else {
            continue;
        };

        if !nt.file_association.accepts(node.file_info().map(FileInfo::kind)) {
            violations.push(NodeViolation::FileAssociation {
                node: id.clone(),
                node_type: nt.id.clone(),
                expected: nt.file_association,
            });
        }

        let parent_type = tree
            .parent(key)
            .and_then(|p| tree.get(p))
            .and_then(|p| p.node_type());
        if nt.parent_rule(parent_type).is_none() {
            violations.push(NodeViolation::ParentType {
                node: id.clone(),
                parent_type: parent_type.cloned(),
            });
        }

        match node.domain_object() {
            Some(o) if store.contains_object(o) => {
                violations.extend(validate_object(store, tree, key).into_iter().map(|v| {
                    NodeViolation::Property {
                        node: id.clone(),
                        violation: v,
                    }
                }));
            }
            _ => violations.push(NodeViolation::Unbound { node: id }),
        }
    }

    violations
}
