//! core::profile
//!
//! Domain profile schema: node types, property types, constraints, and
//! node transforms.
//!
//! # Modules
//!
//! - [`schema`] - Profile documents (JSON, v1) and parsing
//! - [`registry`] - Merged, validated, read-only view over loaded profiles
//!
//! # Design
//!
//! Profiles are loaded once per session and never mutated afterwards. Every
//! consumer receives the [`ProfileRegistry`] explicitly instead of reaching
//! for a process-wide store.
//!
//! # Example
//!
//! ```
//! use ipmkit::core::profile::{parse_profile, ProfileRegistry};
//!
//! let json = r#"{
//!     "kind": "ipmkit.domain-profile",
//!     "schema_version": 1,
//!     "id": "http://example.org/profiles/basic",
//!     "label": "Basic",
//!     "property_types": [
//!         { "id": "http://example.org/props/title", "label": "Title", "value_type": "string" }
//!     ],
//!     "node_types": [
//!         {
//!             "id": "http://example.org/types/Collection",
//!             "label": "Collection",
//!             "property_constraints": [
//!                 { "property_type": "http://example.org/props/title", "required": true }
//!             ]
//!         }
//!     ]
//! }"#;
//!
//! let profile = parse_profile(json).unwrap();
//! let registry = ProfileRegistry::new(vec![profile]).unwrap();
//! assert_eq!(registry.node_types().count(), 1);
//! ```

pub mod registry;
pub mod schema;

use serde::{Deserialize, Serialize};

use super::property::PropertyData;
use super::types::{Iri, NodeTypeId, PropertyTypeId};

pub use registry::ProfileRegistry;
pub use schema::{parse_profile, DomainProfile, ProfileError, PROFILE_KIND, SCHEMA_VERSION};

/// Kind of value a property type holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValueType {
    String,
    Long,
    Boolean,
    DateTime,
    Uri,
    /// Nested sub-properties, described by `complex_constraints`.
    Complex,
}

/// How many values of a property type one object may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Single,
    #[default]
    Multiple,
}

/// A schema-declared property kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyType {
    pub id: PropertyTypeId,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub value_type: PropertyValueType,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Read-only types can only be populated by the system.
    #[serde(default)]
    pub read_only: bool,
    /// Sub-property constraints; only meaningful for `Complex` types.
    #[serde(default)]
    pub complex_constraints: Vec<PropertyConstraint>,
}

/// Binds a property type to a node type (or to a complex property type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyConstraint {
    pub property_type: PropertyTypeId,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<PropertyData>,
}

/// What kind of file-system entity a node type expects to back it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAssociation {
    File,
    Directory,
    /// No expectation; the node may or may not be backed by a file.
    #[default]
    Any,
}

impl FileAssociation {
    /// Whether a node with the given backing entity satisfies this association.
    ///
    /// `None` means the node has no `FileInfo` at all.
    pub fn accepts(self, kind: Option<super::file_info::FileKind>) -> bool {
        use super::file_info::FileKind;
        match self {
            FileAssociation::Any => true,
            FileAssociation::File => kind == Some(FileKind::File),
            FileAssociation::Directory => kind == Some(FileKind::Directory),
        }
    }
}

/// Where a system-supplied property takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppliedSource {
    FileName,
    FileSize,
    FileFormat,
    FileCreated,
    FileModified,
    FileLocation,
}

impl SuppliedSource {
    /// Value kinds a property type may have to receive this source.
    pub fn compatible_kinds(self) -> &'static [PropertyValueType] {
        match self {
            SuppliedSource::FileName => &[PropertyValueType::String],
            SuppliedSource::FileSize => &[PropertyValueType::Long],
            SuppliedSource::FileFormat | SuppliedSource::FileLocation => {
                &[PropertyValueType::String, PropertyValueType::Uri]
            }
            SuppliedSource::FileCreated | SuppliedSource::FileModified => {
                &[PropertyValueType::DateTime]
            }
        }
    }
}

/// A property the system fills in from file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuppliedProperty {
    pub property_type: PropertyTypeId,
    pub source: SuppliedSource,
}

/// Predicates linking a child's domain object to its parent's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuralRelation {
    /// Child object → parent object.
    pub has_parent: Iri,
    /// Parent object → child object, if the profile also records the inverse.
    #[serde(default)]
    pub has_child: Option<Iri>,
}

/// Which parents a node type accepts, and how it relates to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentConstraint {
    /// Required parent node type; `None` matches any parent and the root position.
    #[serde(default)]
    pub parent_type: Option<NodeTypeId>,
    #[serde(default)]
    pub relation: Option<StructuralRelation>,
}

/// A schema-declared category a node can assume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeType {
    pub id: NodeTypeId,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// RDF types given to domain objects of this node type.
    #[serde(default)]
    pub domain_types: Vec<Iri>,
    #[serde(default)]
    pub property_constraints: Vec<PropertyConstraint>,
    #[serde(default)]
    pub supplied_properties: Vec<SuppliedProperty>,
    /// Empty means any parent is accepted with no structural relation.
    #[serde(default)]
    pub parent_constraints: Vec<ParentConstraint>,
    #[serde(default)]
    pub file_association: FileAssociation,
}

impl NodeType {
    /// The constraint declared for a property type, if any.
    pub fn constraint_for(&self, property_type: &PropertyTypeId) -> Option<&PropertyConstraint> {
        self.property_constraints
            .iter()
            .find(|c| &c.property_type == property_type)
    }

    /// Pick the parent constraint that governs a parent of the given type.
    ///
    /// An exact type match wins over a wildcard (`parent_type: None`).
    /// Returns `None` when the parent type is not accepted. A node type with
    /// no parent constraints accepts anything; callers see that as
    /// `Some(None)`.
    pub fn parent_rule(&self, parent_type: Option<&NodeTypeId>) -> Option<Option<&ParentConstraint>> {
        if self.parent_constraints.is_empty() {
            return Some(None);
        }
        let exact = parent_type.and_then(|pt| {
            self.parent_constraints
                .iter()
                .find(|c| c.parent_type.as_ref() == Some(pt))
        });
        exact
            .or_else(|| self.parent_constraints.iter().find(|c| c.parent_type.is_none()))
            .map(Some)
    }
}

/// A declared rule changing a node's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeTransform {
    pub id: Iri,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Primary types the transform applies to.
    pub source_types: Vec<NodeTypeId>,
    /// If set, the node's parent must have this primary type.
    #[serde(default)]
    pub source_parent_type: Option<NodeTypeId>,
    pub result_type: NodeTypeId,
    /// If set, a synthetic node of this type is inserted above the node.
    #[serde(default)]
    pub insert_parent_type: Option<NodeTypeId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file_info::FileKind;

    fn type_id(name: &str) -> NodeTypeId {
        NodeTypeId::new(format!("http://example.org/types/{name}")).unwrap()
    }

    fn node_type(name: &str, parents: Vec<ParentConstraint>) -> NodeType {
        NodeType {
            id: type_id(name),
            label: name.into(),
            description: None,
            domain_types: vec![],
            property_constraints: vec![],
            supplied_properties: vec![],
            parent_constraints: parents,
            file_association: FileAssociation::Any,
        }
    }

    mod parent_rule {
        use super::*;

        #[test]
        fn no_constraints_accepts_anything() {
            let nt = node_type("Item", vec![]);
            assert_eq!(nt.parent_rule(Some(&type_id("Other"))), Some(None));
            assert_eq!(nt.parent_rule(None), Some(None));
        }

        #[test]
        fn exact_match_preferred_over_wildcard() {
            let wildcard = ParentConstraint {
                parent_type: None,
                relation: None,
            };
            let exact = ParentConstraint {
                parent_type: Some(type_id("Collection")),
                relation: Some(StructuralRelation {
                    has_parent: Iri::new("http://example.org/rel/isMemberOf").unwrap(),
                    has_child: None,
                }),
            };
            let nt = node_type("Item", vec![wildcard.clone(), exact.clone()]);

            assert_eq!(nt.parent_rule(Some(&type_id("Collection"))), Some(Some(&exact)));
            assert_eq!(nt.parent_rule(Some(&type_id("Other"))), Some(Some(&wildcard)));
            assert_eq!(nt.parent_rule(None), Some(Some(&wildcard)));
        }

        #[test]
        fn unlisted_parent_rejected() {
            let only = ParentConstraint {
                parent_type: Some(type_id("Collection")),
                relation: None,
            };
            let nt = node_type("Item", vec![only]);
            assert_eq!(nt.parent_rule(Some(&type_id("Other"))), None);
            assert_eq!(nt.parent_rule(None), None);
        }
    }

    mod file_association {
        use super::*;

        #[test]
        fn accepts() {
            assert!(FileAssociation::Any.accepts(None));
            assert!(FileAssociation::Any.accepts(Some(FileKind::File)));
            assert!(FileAssociation::File.accepts(Some(FileKind::File)));
            assert!(!FileAssociation::File.accepts(Some(FileKind::Directory)));
            assert!(!FileAssociation::Directory.accepts(None));
        }
    }

    #[test]
    fn cardinality_defaults_to_multiple() {
        let json = r#"{ "id": "http://example.org/p", "label": "P", "value_type": "long" }"#;
        let pt: PropertyType = serde_json::from_str(json).unwrap();
        assert_eq!(pt.cardinality, Cardinality::Multiple);
        assert!(!pt.read_only);
    }
}
