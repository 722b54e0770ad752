//! store
//!
//! Graph-backed domain object store.
//!
//! # Modules
//!
//! - [`traits`] - The [`DomainProfileObjectStore`] seam
//! - [`validate`] - Profile validation of bound objects
//!
//! # Invariants
//!
//! After every successful [`ObjectStore::update_object`]:
//!
//! - The object's RDF types are exactly the domain types of the node's
//!   current primary type and sub-types
//! - The only structural edges touching the object are those to its
//!   current parent's object and to its children's objects
//! - Property values are never removed by a resync
//!
//! Non-structural relationships are caller-managed and survive resyncs.

pub mod traits;
pub mod validate;
mod values;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::core::file_info::FileInfo;
use crate::core::profile::{
    Cardinality, NodeType, ParentConstraint, ProfileRegistry, PropertyType, PropertyValueType,
    SuppliedSource,
};
use crate::core::property::{PropertyData, PropertyValue};
use crate::core::tree::{IpmTree, NodeKey, TreeError};
use crate::core::types::{Iri, NodeId, NodeTypeId, ObjectId, PropertyTypeId};
use crate::ipm::vocab::domain_object;
use crate::rdf::{vocab as rdf_vocab, Graph, Resource, Term};

pub use traits::DomainProfileObjectStore;
pub use validate::{validate_object, validate_tree, NodeViolation, PropertyViolation};

/// Why `update_object` refused to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionFailure {
    /// The node has no primary type yet.
    Untyped,
    /// The parent node has no bound domain object.
    ParentUnbound { parent: NodeId },
}

impl std::fmt::Display for PreconditionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreconditionFailure::Untyped => write!(f, "node has no type"),
            PreconditionFailure::ParentUnbound { parent } => {
                write!(f, "parent '{parent}' has no domain object yet")
            }
        }
    }
}

/// Errors from object store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("cannot update object for node '{node}': {reason}")]
    Precondition {
        node: NodeId,
        reason: PreconditionFailure,
    },

    #[error("unknown domain object '{0}'")]
    UnknownObject(ObjectId),

    #[error("node type '{0}' is not declared by any loaded profile")]
    UnknownNodeType(NodeTypeId),

    #[error("property type '{0}' is not declared by any loaded profile")]
    UnknownPropertyType(PropertyTypeId),

    #[error("property '{property_type}' holds {expected:?} values, got {found:?}")]
    KindMismatch {
        property_type: PropertyTypeId,
        expected: PropertyValueType,
        found: PropertyValueType,
    },

    #[error("property '{0}' is read-only")]
    ReadOnly(PropertyTypeId),

    #[error("object '{object}' already has a value for single-valued property '{property_type}'")]
    CardinalityExceeded {
        object: ObjectId,
        property_type: PropertyTypeId,
    },

    #[error("'{part}' is not a sub-property of complex property '{parent}'")]
    NotAllowedInComplex {
        parent: PropertyTypeId,
        part: PropertyTypeId,
    },

    #[error("'{0}' is a structural predicate managed by update_object")]
    StructuralPredicate(Iri),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Domain objects and their relationships, kept in one triple graph.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ipmkit::core::profile::{parse_profile, ProfileRegistry};
/// use ipmkit::core::tree::{IpmTree, Node};
/// use ipmkit::core::types::{NodeId, NodeTypeId};
/// use ipmkit::store::{DomainProfileObjectStore, ObjectStore};
///
/// let profile = parse_profile(r#"{
///     "kind": "ipmkit.domain-profile",
///     "schema_version": 1,
///     "id": "http://example.org/profiles/basic",
///     "label": "Basic",
///     "node_types": [
///         { "id": "http://example.org/types/Collection", "label": "Collection",
///           "domain_types": ["http://example.org/classes/Collection"] }
///     ]
/// }"#).unwrap();
/// let registry = Arc::new(ProfileRegistry::new(vec![profile]).unwrap());
///
/// let collection = NodeTypeId::new("http://example.org/types/Collection").unwrap();
/// let root = Node::new(NodeId::new("urn:node:root").unwrap()).with_type(collection);
/// let (mut tree, key) = IpmTree::with_root(root).unwrap();
///
/// let mut store = ObjectStore::new(registry);
/// let object = store.update_object(&mut tree, key).unwrap();
///
/// assert_eq!(tree.node(key).unwrap().domain_object(), Some(&object));
/// assert_eq!(store.types(&object)[0].as_str(), "http://example.org/classes/Collection");
/// ```
#[derive(Debug, Clone)]
pub struct ObjectStore {
    registry: Arc<ProfileRegistry>,
    graph: Graph,
    object_base: String,
}

impl ObjectStore {
    /// An empty store minting `urn:uuid:` identifiers.
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self::with_object_base(registry, crate::core::config::DEFAULT_ID_BASE)
    }

    pub fn with_object_base(registry: Arc<ProfileRegistry>, object_base: impl Into<String>) -> Self {
        Self::from_graph(registry, Graph::new(), object_base)
    }

    /// Reopen a store from a previously saved graph.
    pub fn from_graph(
        registry: Arc<ProfileRegistry>,
        graph: Graph,
        object_base: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            graph,
            object_base: object_base.into(),
        }
    }

    /// Prefix for minted object identifiers.
    pub fn object_base(&self) -> &str {
        &self.object_base
    }

    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        &self.registry
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Whether the store manages an object with this identifier.
    pub fn contains_object(&self, object: &ObjectId) -> bool {
        self.graph.contains(
            &subject(object),
            &rdf_vocab::rdf_type(),
            &domain_object().into(),
        )
    }

    /// Identifiers of every managed object, in creation order.
    pub fn objects(&self) -> Vec<ObjectId> {
        self.graph
            .subjects(&rdf_vocab::rdf_type(), &domain_object().into())
            .into_iter()
            .filter_map(|r| r.as_iri().cloned().map(ObjectId::from))
            .collect()
    }

    /// The object's RDF types, without the store's own marker class.
    pub fn types(&self, object: &ObjectId) -> Vec<Iri> {
        let marker = domain_object();
        let rdf_type = rdf_vocab::rdf_type();
        self.graph
            .objects(&subject(object), &rdf_type)
            .filter_map(Term::as_iri)
            .filter(|t| **t != marker)
            .cloned()
            .collect()
    }

    /// Every property value on the object, grouped by property type in
    /// first-use order.
    pub fn properties(&self, object: &ObjectId) -> Vec<PropertyValue> {
        self.property_types(object)
            .iter()
            .flat_map(|pt| self.get_properties(object, pt))
            .collect()
    }

    /// Property types that currently have at least one value on the object.
    pub fn property_types(&self, object: &ObjectId) -> Vec<PropertyTypeId> {
        let mut seen = Vec::new();
        for (predicate, _) in self.graph.statements_about(&subject(object)) {
            let id = PropertyTypeId::from(predicate.clone());
            if self.registry.property_type(&id).is_some() && !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    /// Add a caller-managed relationship between two resources.
    ///
    /// Structural predicates are rejected; `update_object` owns those.
    pub fn add_relationship(
        &mut self,
        object: &ObjectId,
        predicate: &Iri,
        target: &Iri,
    ) -> Result<bool, StoreError> {
        self.check_relationship(object, predicate)?;
        Ok(self
            .graph
            .insert(subject(object), predicate.clone(), target.clone()))
    }

    pub fn remove_relationship(
        &mut self,
        object: &ObjectId,
        predicate: &Iri,
        target: &Iri,
    ) -> Result<bool, StoreError> {
        self.check_relationship(object, predicate)?;
        Ok(self
            .graph
            .remove(&subject(object), predicate, &target.clone().into()))
    }

    fn check_relationship(&self, object: &ObjectId, predicate: &Iri) -> Result<(), StoreError> {
        if !self.contains_object(object) {
            return Err(StoreError::UnknownObject(object.clone()));
        }
        if self.registry.is_structural(predicate) {
            return Err(StoreError::StructuralPredicate(predicate.clone()));
        }
        Ok(())
    }

    /// Drop an object, its complex values, and every edge pointing at it.
    ///
    /// Returns `false` if the object was not managed by this store.
    pub fn remove_object(&mut self, object: &ObjectId) -> bool {
        if !self.contains_object(object) {
            return false;
        }
        let s = subject(object);
        let values: Vec<Term> = self
            .graph
            .statements_about(&s)
            .iter()
            .map(|(_, o)| o.clone())
            .collect();
        self.graph.remove_subject(&s);
        for v in &values {
            values::remove_nested(&mut self.graph, v);
        }
        self.graph.remove_incoming(&s.into(), None);
        debug!(object = %object, "removed domain object");
        true
    }

    /// Resolve every type assigned to the node, primary first.
    fn resolve_types<'r>(
        registry: &'r ProfileRegistry,
        node: &NodeId,
        types: &[NodeTypeId],
    ) -> Result<Vec<&'r NodeType>, StoreError> {
        if types.is_empty() {
            return Err(StoreError::Precondition {
                node: node.clone(),
                reason: PreconditionFailure::Untyped,
            });
        }
        types
            .iter()
            .map(|t| {
                registry
                    .node_type(t)
                    .ok_or_else(|| StoreError::UnknownNodeType(t.clone()))
            })
            .collect()
    }

    /// Remove structural edges between `object` and anything that is not
    /// one of `keep`.
    fn strip_structural(&mut self, object: &ObjectId, keep: &HashSet<Iri>) -> usize {
        let registry = Arc::clone(&self.registry);
        let s = subject(object);
        let kept = |term: &Term| term.as_iri().is_some_and(|i| keep.contains(i));

        let mut removed = self
            .graph
            .remove_where(&s, |p, o| registry.is_structural(p) && !kept(o));

        let incoming: Term = s.into();
        for source in self.graph.subjects_referencing(&incoming) {
            if source.as_iri().is_some_and(|i| keep.contains(i)) {
                continue;
            }
            removed += self
                .graph
                .remove_where(&source, |p, o| o == &incoming && registry.is_structural(p));
        }
        removed
    }

    fn link_parent(&mut self, object: &ObjectId, parent: &ObjectId, rule: Option<&ParentConstraint>) {
        let Some(relation) = rule.and_then(|r| r.relation.as_ref()) else {
            return;
        };
        self.graph.insert(
            subject(object),
            relation.has_parent.clone(),
            parent.as_iri().clone(),
        );
        if let Some(has_child) = &relation.has_child {
            self.graph
                .insert(subject(parent), has_child.clone(), object.as_iri().clone());
        }
    }

    /// Store-internal write: skips read-only checks, never exceeds `Single`.
    fn populate(&mut self, object: &ObjectId, property_type: &PropertyType, data: PropertyData) {
        if data.kind() != property_type.value_type {
            return;
        }
        let existing = self.get_properties(object, &property_type.id);
        if property_type.cardinality == Cardinality::Single && !existing.is_empty() {
            return;
        }
        let value = PropertyValue::new(property_type.id.clone(), data);
        if existing.contains(&value) {
            return;
        }
        let term = values::encode(&mut self.graph, value.data());
        self.graph
            .insert(subject(object), property_type.id.as_iri().clone(), term);
        trace!(object = %object, property_type = %property_type.id, "populated property");
    }

    fn populate_from_profile(
        &mut self,
        object: &ObjectId,
        node_types: &[&NodeType],
        file_info: Option<&FileInfo>,
    ) {
        let registry = Arc::clone(&self.registry);
        for nt in node_types {
            for constraint in &nt.property_constraints {
                let (Some(default), Some(pt)) = (
                    constraint.default_value.as_ref(),
                    registry.property_type(&constraint.property_type),
                ) else {
                    continue;
                };
                self.populate(object, pt, default.clone());
            }

            let Some(info) = file_info else {
                continue;
            };
            for supplied in &nt.supplied_properties {
                let Some(pt) = registry.property_type(&supplied.property_type) else {
                    continue;
                };
                for data in supplied_values(info, supplied.source, pt.value_type) {
                    self.populate(object, pt, data);
                }
            }
        }
    }

    /// Look up a writable property type on an existing object.
    fn writable(
        &self,
        object: &ObjectId,
        property_type: &PropertyTypeId,
    ) -> Result<&PropertyType, StoreError> {
        if !self.contains_object(object) {
            return Err(StoreError::UnknownObject(object.clone()));
        }
        let pt = self
            .registry
            .property_type(property_type)
            .ok_or_else(|| StoreError::UnknownPropertyType(property_type.clone()))?;
        if pt.read_only {
            return Err(StoreError::ReadOnly(pt.id.clone()));
        }
        Ok(pt)
    }

    /// Check a value's kind against its type, recursing into complex parts.
    fn check_value(&self, value: &PropertyValue) -> Result<(), StoreError> {
        let pt = self
            .registry
            .property_type(value.property_type())
            .ok_or_else(|| StoreError::UnknownPropertyType(value.property_type().clone()))?;
        if value.kind() != pt.value_type {
            return Err(StoreError::KindMismatch {
                property_type: pt.id.clone(),
                expected: pt.value_type,
                found: value.kind(),
            });
        }
        for part in value.parts() {
            if !pt
                .complex_constraints
                .iter()
                .any(|c| &c.property_type == part.property_type())
            {
                return Err(StoreError::NotAllowedInComplex {
                    parent: pt.id.clone(),
                    part: part.property_type().clone(),
                });
            }
            self.check_value(part)?;
        }
        Ok(())
    }

    /// The stored term holding exactly `value`, if any.
    fn find_term(&self, object: &ObjectId, value: &PropertyValue) -> Option<Term> {
        let pt = self.registry.property_type(value.property_type())?;
        self.graph
            .objects(&subject(object), pt.id.as_iri())
            .find(|term| {
                values::decode(&self.graph, &self.registry, pt, term).as_ref() == Some(value)
            })
            .cloned()
    }
}

impl DomainProfileObjectStore for ObjectStore {
    fn update_object(&mut self, tree: &mut IpmTree, key: NodeKey) -> Result<ObjectId, StoreError> {
        let registry = Arc::clone(&self.registry);
        let node = tree.node(key)?;
        let node_id = node.id().clone();
        let assigned: Vec<NodeTypeId> = node.all_types().cloned().collect();
        let node_types = Self::resolve_types(&registry, &node_id, &assigned)?;
        let file_info = node.file_info().cloned();
        let bound = node.domain_object().cloned();

        let parent = match tree.parent(key) {
            Some(p) => {
                let parent_node = tree.node(p)?;
                match parent_node.domain_object() {
                    Some(o) if self.contains_object(o) => {
                        Some((o.clone(), parent_node.node_type().cloned()))
                    }
                    _ => {
                        return Err(StoreError::Precondition {
                            node: node_id,
                            reason: PreconditionFailure::ParentUnbound {
                                parent: parent_node.id().clone(),
                            },
                        })
                    }
                }
            }
            None => None,
        };

        let children: HashSet<Iri> = tree
            .children(key)
            .iter()
            .filter_map(|&c| tree.get(c)?.domain_object())
            .map(|o| o.as_iri().clone())
            .collect();

        let (object, created) = match bound {
            Some(o) if self.contains_object(&o) => {
                let s = subject(&o);
                let rdf_type = rdf_vocab::rdf_type();
                let stripped = self.graph.remove_values(&s, &rdf_type);
                let edges = self.strip_structural(&o, &children);
                debug!(node = %node_id, object = %o, types = stripped, edges, "resyncing domain object");
                (o, false)
            }
            Some(o) => (o, true),
            None => (ObjectId::mint(&self.object_base), true),
        };

        let s = subject(&object);
        self.graph
            .insert(s.clone(), rdf_vocab::rdf_type(), domain_object());
        for nt in &node_types {
            for class in &nt.domain_types {
                self.graph.insert(s.clone(), rdf_vocab::rdf_type(), class.clone());
            }
        }

        if let Some((parent_object, parent_type)) = &parent {
            match node_types[0].parent_rule(parent_type.as_ref()) {
                Some(rule) => self.link_parent(&object, parent_object, rule),
                None => debug!(
                    node = %node_id,
                    parent_type = ?parent_type,
                    "parent type not accepted, no structural relation added"
                ),
            }
        }

        if created {
            self.populate_from_profile(&object, &node_types, file_info.as_ref());
            debug!(node = %node_id, object = %object, "created domain object");
        }

        tree.node_mut(key)?.set_domain_object(Some(object.clone()));
        Ok(object)
    }

    fn add_property(&mut self, object: &ObjectId, value: PropertyValue) -> Result<(), StoreError> {
        let pt = self.writable(object, value.property_type())?;
        let single = pt.cardinality == Cardinality::Single;
        self.check_value(&value)?;

        if self.find_term(object, &value).is_some() {
            return Ok(());
        }
        if single && !self.get_properties(object, value.property_type()).is_empty() {
            return Err(StoreError::CardinalityExceeded {
                object: object.clone(),
                property_type: value.property_type().clone(),
            });
        }

        let term = values::encode(&mut self.graph, value.data());
        self.graph
            .insert(subject(object), value.property_type().as_iri().clone(), term);
        Ok(())
    }

    fn remove_property(
        &mut self,
        object: &ObjectId,
        value: &PropertyValue,
    ) -> Result<bool, StoreError> {
        self.writable(object, value.property_type())?;
        let Some(term) = self.find_term(object, value) else {
            return Ok(false);
        };
        self.graph
            .remove(&subject(object), value.property_type().as_iri(), &term);
        values::remove_nested(&mut self.graph, &term);
        Ok(true)
    }

    fn remove_property_type(
        &mut self,
        object: &ObjectId,
        property_type: &PropertyTypeId,
    ) -> Result<usize, StoreError> {
        self.writable(object, property_type)?;
        let s = subject(object);
        let terms: Vec<Term> = self
            .graph
            .objects(&s, property_type.as_iri())
            .cloned()
            .collect();
        let removed = self.graph.remove_values(&s, property_type.as_iri());
        for term in &terms {
            values::remove_nested(&mut self.graph, term);
        }
        Ok(removed)
    }

    fn get_properties_by_node_type(
        &self,
        object: &ObjectId,
        node_type: &NodeTypeId,
    ) -> Vec<PropertyValue> {
        let Some(nt) = self.registry.node_type(node_type) else {
            return Vec::new();
        };
        let mut declared: Vec<&PropertyTypeId> = Vec::new();
        let names = nt
            .property_constraints
            .iter()
            .map(|c| &c.property_type)
            .chain(nt.supplied_properties.iter().map(|s| &s.property_type));
        for pt in names {
            if !declared.contains(&pt) {
                declared.push(pt);
            }
        }
        declared
            .into_iter()
            .flat_map(|pt| self.get_properties(object, pt))
            .collect()
    }

    fn get_properties(&self, object: &ObjectId, property_type: &PropertyTypeId) -> Vec<PropertyValue> {
        let Some(pt) = self.registry.property_type(property_type) else {
            return Vec::new();
        };
        self.graph
            .objects(&subject(object), pt.id.as_iri())
            .filter_map(|term| values::decode(&self.graph, &self.registry, pt, term))
            .collect()
    }

    fn has_relationship(&self, subject: &Iri, predicate: &Iri, object: &Iri) -> bool {
        self.graph.contains(
            &Resource::Iri(subject.clone()),
            predicate,
            &object.clone().into(),
        )
    }
}

fn subject(object: &ObjectId) -> Resource {
    Resource::Iri(object.as_iri().clone())
}

/// Values a file metadata source provides for a property of `kind`.
fn supplied_values(info: &FileInfo, source: SuppliedSource, kind: PropertyValueType) -> Vec<PropertyData> {
    let text = |s: &str| match kind {
        PropertyValueType::Uri => Iri::new(s).ok().map(PropertyData::Uri),
        _ => Some(PropertyData::String(s.to_string())),
    };
    match source {
        SuppliedSource::FileName => vec![PropertyData::String(info.name().to_string())],
        SuppliedSource::FileSize => info
            .size()
            .and_then(|s| i64::try_from(s).ok())
            .map(PropertyData::Long)
            .into_iter()
            .collect(),
        SuppliedSource::FileFormat => info.formats().iter().filter_map(|f| text(f)).collect(),
        SuppliedSource::FileLocation => info.location().and_then(text).into_iter().collect(),
        SuppliedSource::FileCreated => info.created().map(PropertyData::DateTime).into_iter().collect(),
        SuppliedSource::FileModified => {
            info.modified().map(PropertyData::DateTime).into_iter().collect()
        }
    }
}

/// Property types that hold any value on `object` but are allowed by none
/// of `types`.
pub(crate) fn invalid_property_types(
    store: &ObjectStore,
    object: &ObjectId,
    types: &[&NodeTypeId],
) -> BTreeSet<PropertyTypeId> {
    let valid = store.registry.valid_property_types(types.iter().copied());
    store
        .property_types(object)
        .into_iter()
        .filter(|pt| !valid.contains(pt))
        .collect()
}
