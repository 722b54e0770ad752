//! core::profile::registry
//!
//! Merged, validated view over one or more domain profiles.
//!
//! # Invariants
//!
//! - Node type, property type, and transform identifiers are unique across
//!   all merged profiles
//! - Every identifier a profile refers to resolves within the registry
//! - Default values match their property type's value kind
//! - Supplied properties can hold their file metadata source

use std::collections::{BTreeSet, HashMap, HashSet};

use super::schema::{DomainProfile, ProfileError};
use super::{NodeTransform, NodeType, PropertyConstraint, PropertyType, PropertyValueType};
use crate::core::types::{Iri, NodeTypeId, PropertyTypeId};

/// Read-only, cross-checked set of profile declarations.
///
/// Build one per session and share it (`Arc<ProfileRegistry>`) with every
/// component that needs schema lookups.
#[derive(Debug, Default, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<Iri>,
    node_types: Vec<NodeType>,
    node_index: HashMap<NodeTypeId, usize>,
    property_types: Vec<PropertyType>,
    property_index: HashMap<PropertyTypeId, usize>,
    transforms: Vec<NodeTransform>,
    transform_index: HashMap<Iri, usize>,
    structural: BTreeSet<Iri>,
}

impl ProfileRegistry {
    /// Merge and validate profiles.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found. Profiles are checked in
    /// the order given.
    pub fn new(profiles: Vec<DomainProfile>) -> Result<Self, ProfileError> {
        let mut registry = Self::default();

        for profile in profiles {
            profile.validate_envelope()?;
            if registry.profiles.contains(&profile.id) {
                return Err(ProfileError::DuplicateProfile(profile.id));
            }
            registry.profiles.push(profile.id);

            for pt in profile.property_types {
                if registry.property_index.contains_key(&pt.id) {
                    return Err(ProfileError::DuplicatePropertyType(pt.id));
                }
                registry
                    .property_index
                    .insert(pt.id.clone(), registry.property_types.len());
                registry.property_types.push(pt);
            }
            for nt in profile.node_types {
                if registry.node_index.contains_key(&nt.id) {
                    return Err(ProfileError::DuplicateNodeType(nt.id));
                }
                registry
                    .node_index
                    .insert(nt.id.clone(), registry.node_types.len());
                registry.node_types.push(nt);
            }
            for tr in profile.transforms {
                if registry.transform_index.contains_key(&tr.id) {
                    return Err(ProfileError::DuplicateTransform(tr.id));
                }
                registry
                    .transform_index
                    .insert(tr.id.clone(), registry.transforms.len());
                registry.transforms.push(tr);
            }
        }

        registry.validate()?;

        for nt in &registry.node_types {
            for relation in nt.parent_constraints.iter().filter_map(|c| c.relation.as_ref()) {
                registry.structural.insert(relation.has_parent.clone());
                if let Some(has_child) = &relation.has_child {
                    registry.structural.insert(has_child.clone());
                }
            }
        }

        Ok(registry)
    }

    /// An empty registry (no types, no transforms).
    pub fn empty() -> Self {
        Self::default()
    }

    fn validate(&self) -> Result<(), ProfileError> {
        for pt in &self.property_types {
            match (pt.value_type, pt.complex_constraints.is_empty()) {
                (PropertyValueType::Complex, true) => {
                    return Err(ProfileError::EmptyComplex(pt.id.clone()))
                }
                (PropertyValueType::Complex, false) => {}
                (_, false) => return Err(ProfileError::ScalarWithConstraints(pt.id.clone())),
                (_, true) => {}
            }
            self.validate_constraints(pt.id.as_iri(), &pt.complex_constraints)?;
        }

        for nt in &self.node_types {
            let owner = nt.id.as_iri();
            self.validate_constraints(owner, &nt.property_constraints)?;

            for supplied in &nt.supplied_properties {
                let pt = self.require_property_type(owner, &supplied.property_type)?;
                if !supplied.source.compatible_kinds().contains(&pt.value_type) {
                    return Err(ProfileError::IncompatibleSuppliedSource {
                        node_type: nt.id.clone(),
                        property_type: pt.id.clone(),
                        source_name: format!("{:?}", supplied.source),
                    });
                }
            }

            for parent in nt.parent_constraints.iter().filter_map(|c| c.parent_type.as_ref()) {
                self.require_node_type(owner, parent)?;
            }
        }

        for tr in &self.transforms {
            let owner = &tr.id;
            for source in &tr.source_types {
                self.require_node_type(owner, source)?;
            }
            if let Some(parent) = &tr.source_parent_type {
                self.require_node_type(owner, parent)?;
            }
            self.require_node_type(owner, &tr.result_type)?;
            if let Some(insert) = &tr.insert_parent_type {
                self.require_node_type(owner, insert)?;
            }
        }

        Ok(())
    }

    fn validate_constraints(
        &self,
        owner: &Iri,
        constraints: &[PropertyConstraint],
    ) -> Result<(), ProfileError> {
        let mut seen = HashSet::new();
        for constraint in constraints {
            if !seen.insert(&constraint.property_type) {
                return Err(ProfileError::DuplicateConstraint {
                    owner: owner.clone(),
                    property_type: constraint.property_type.clone(),
                });
            }
            let pt = self.require_property_type(owner, &constraint.property_type)?;
            if let Some(default) = &constraint.default_value {
                if default.kind() != pt.value_type {
                    return Err(ProfileError::DefaultKindMismatch {
                        owner: owner.clone(),
                        property_type: pt.id.clone(),
                        expected: pt.value_type,
                        found: default.kind(),
                    });
                }
            }
        }
        Ok(())
    }

    fn require_property_type(
        &self,
        owner: &Iri,
        id: &PropertyTypeId,
    ) -> Result<&PropertyType, ProfileError> {
        self.property_type(id)
            .ok_or_else(|| ProfileError::UnknownPropertyType {
                owner: owner.clone(),
                property_type: id.clone(),
            })
    }

    fn require_node_type(&self, owner: &Iri, id: &NodeTypeId) -> Result<&NodeType, ProfileError> {
        self.node_type(id).ok_or_else(|| ProfileError::UnknownNodeType {
            owner: owner.clone(),
            node_type: id.clone(),
        })
    }

    /// Identifiers of the merged profiles, in load order.
    pub fn profile_ids(&self) -> &[Iri] {
        &self.profiles
    }

    pub fn node_type(&self, id: &NodeTypeId) -> Option<&NodeType> {
        self.node_index.get(id).map(|&i| &self.node_types[i])
    }

    pub fn property_type(&self, id: &PropertyTypeId) -> Option<&PropertyType> {
        self.property_index.get(id).map(|&i| &self.property_types[i])
    }

    pub fn transform(&self, id: &Iri) -> Option<&NodeTransform> {
        self.transform_index.get(id).map(|&i| &self.transforms[i])
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.node_types.iter()
    }

    pub fn property_types(&self) -> impl Iterator<Item = &PropertyType> {
        self.property_types.iter()
    }

    pub fn transforms(&self) -> impl Iterator<Item = &NodeTransform> {
        self.transforms.iter()
    }

    /// Every predicate some node type uses to link a child object to its
    /// parent object, in either direction.
    pub fn structural_predicates(&self) -> &BTreeSet<Iri> {
        &self.structural
    }

    pub fn is_structural(&self, predicate: &Iri) -> bool {
        self.structural.contains(predicate)
    }

    /// Property types allowed on an object carrying the given node types.
    ///
    /// Unknown node types contribute nothing.
    pub fn valid_property_types<'a>(
        &self,
        types: impl IntoIterator<Item = &'a NodeTypeId>,
    ) -> BTreeSet<PropertyTypeId> {
        types
            .into_iter()
            .filter_map(|t| self.node_type(t))
            .flat_map(|nt| {
                nt.property_constraints
                    .iter()
                    .map(|c| c.property_type.clone())
                    .chain(nt.supplied_properties.iter().map(|s| s.property_type.clone()))
            })
            .collect()
    }

    /// Transforms whose source matches a node of `node_type` under a parent
    /// of `parent_type`.
    pub fn matching_transforms<'a>(
        &'a self,
        node_type: &'a NodeTypeId,
        parent_type: Option<&'a NodeTypeId>,
    ) -> impl Iterator<Item = &'a NodeTransform> + 'a {
        self.transforms.iter().filter(move |tr| {
            tr.source_types.contains(node_type)
                && match &tr.source_parent_type {
                    Some(required) => parent_type == Some(required),
                    None => true,
                }
        })
    }
}
