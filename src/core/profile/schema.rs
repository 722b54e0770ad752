//! core::profile::schema
//!
//! Domain profile documents (v1).
//!
//! # Schema Design
//!
//! A profile document is:
//! - Self-describing with `kind` and `schema_version`
//! - Strictly parsed (unknown fields rejected)
//! - Semantically checked once merged into a [`ProfileRegistry`](super::ProfileRegistry)
//!
//! # Example
//!
//! ```
//! use ipmkit::core::profile::schema::{parse_profile, PROFILE_KIND};
//!
//! let json = r#"{
//!     "kind": "ipmkit.domain-profile",
//!     "schema_version": 1,
//!     "id": "http://example.org/profiles/empty",
//!     "label": "Empty"
//! }"#;
//!
//! let profile = parse_profile(json).unwrap();
//! assert_eq!(profile.kind, PROFILE_KIND);
//! assert!(profile.node_types.is_empty());
//!
//! let back = profile.to_json().unwrap();
//! assert_eq!(parse_profile(&back).unwrap(), profile);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{NodeTransform, NodeType, PropertyType, PropertyValueType};
use crate::core::types::{Iri, NodeTypeId, PropertyTypeId, TypeError};

/// The kind identifier for domain profile documents.
pub const PROFILE_KIND: &str = "ipmkit.domain-profile";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from loading and validating profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to parse profile: {0}")]
    ParseError(String),

    #[error("invalid kind '{found}', expected '{}'", PROFILE_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("duplicate profile '{0}'")]
    DuplicateProfile(Iri),

    #[error("node type '{0}' is declared more than once")]
    DuplicateNodeType(NodeTypeId),

    #[error("property type '{0}' is declared more than once")]
    DuplicatePropertyType(PropertyTypeId),

    #[error("transform '{0}' is declared more than once")]
    DuplicateTransform(Iri),

    #[error("'{owner}' refers to unknown property type '{property_type}'")]
    UnknownPropertyType {
        owner: Iri,
        property_type: PropertyTypeId,
    },

    #[error("'{owner}' refers to unknown node type '{node_type}'")]
    UnknownNodeType { owner: Iri, node_type: NodeTypeId },

    #[error(
        "default for '{property_type}' on '{owner}' is {found:?}, property type expects {expected:?}"
    )]
    DefaultKindMismatch {
        owner: Iri,
        property_type: PropertyTypeId,
        expected: PropertyValueType,
        found: PropertyValueType,
    },

    #[error("'{owner}' constrains '{property_type}' more than once")]
    DuplicateConstraint {
        owner: Iri,
        property_type: PropertyTypeId,
    },

    #[error("supplied property '{property_type}' on '{node_type}' cannot hold {source_name}")]
    IncompatibleSuppliedSource {
        node_type: NodeTypeId,
        property_type: PropertyTypeId,
        source_name: String,
    },

    #[error("complex property type '{0}' declares no sub-property constraints")]
    EmptyComplex(PropertyTypeId),

    #[error("scalar property type '{0}' declares sub-property constraints")]
    ScalarWithConstraints(PropertyTypeId),

    #[error("type validation failed: {0}")]
    TypeError(#[from] TypeError),
}

/// Envelope for version dispatch before full parsing.
#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    kind: String,
    schema_version: u32,
}

/// Parse a profile document with version dispatch.
///
/// # Errors
///
/// Returns an error if:
/// - The JSON is malformed or carries unknown fields
/// - The `kind` field doesn't match [`PROFILE_KIND`]
/// - The `schema_version` is not supported
///
/// Cross-references are checked by
/// [`ProfileRegistry::new`](super::ProfileRegistry::new), not here, since
/// one profile may refer to types declared by another.
pub fn parse_profile(json: &str) -> Result<DomainProfile, ProfileError> {
    let envelope: ProfileEnvelope =
        serde_json::from_str(json).map_err(|e| ProfileError::ParseError(e.to_string()))?;

    if envelope.kind != PROFILE_KIND {
        return Err(ProfileError::InvalidKind {
            found: envelope.kind,
        });
    }

    match envelope.schema_version {
        1 => {
            let profile: DomainProfile =
                serde_json::from_str(json).map_err(|e| ProfileError::ParseError(e.to_string()))?;
            Ok(profile)
        }
        v => Err(ProfileError::UnsupportedVersion(v)),
    }
}

/// A domain profile document (v1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainProfile {
    /// Kind identifier (always "ipmkit.domain-profile")
    pub kind: String,

    /// Schema version (always 1 for this struct)
    pub schema_version: u32,

    pub id: Iri,

    pub label: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub property_types: Vec<PropertyType>,

    #[serde(default)]
    pub node_types: Vec<NodeType>,

    #[serde(default)]
    pub transforms: Vec<NodeTransform>,
}

impl DomainProfile {
    /// Create an empty profile with the current kind and version.
    pub fn new(id: Iri, label: impl Into<String>) -> Self {
        Self {
            kind: PROFILE_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            id,
            label: label.into(),
            description: None,
            property_types: Vec::new(),
            node_types: Vec::new(),
            transforms: Vec::new(),
        }
    }

    /// Check the envelope fields of an in-memory profile.
    pub fn validate_envelope(&self) -> Result<(), ProfileError> {
        if self.kind != PROFILE_KIND {
            return Err(ProfileError::InvalidKind {
                found: self.kind.clone(),
            });
        }
        if self.schema_version != SCHEMA_VERSION {
            return Err(ProfileError::UnsupportedVersion(self.schema_version));
        }
        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ProfileError> {
        serde_json::to_string_pretty(self).map_err(|e| ProfileError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::{Cardinality, SuppliedSource};
    use crate::core::property::PropertyData;

    const FULL: &str = r#"{
        "kind": "ipmkit.domain-profile",
        "schema_version": 1,
        "id": "http://example.org/profiles/dcs",
        "label": "Data Conservancy",
        "property_types": [
            { "id": "http://example.org/props/title", "label": "Title",
              "value_type": "string", "cardinality": "single" },
            { "id": "http://example.org/props/size", "label": "Size",
              "value_type": "long", "read_only": true }
        ],
        "node_types": [
            {
                "id": "http://example.org/types/File",
                "label": "File",
                "domain_types": ["http://example.org/model/DataFile"],
                "file_association": "file",
                "property_constraints": [
                    { "property_type": "http://example.org/props/title",
                      "default_value": { "kind": "string", "value": "untitled" } }
                ],
                "supplied_properties": [
                    { "property_type": "http://example.org/props/size", "source": "file_size" }
                ],
                "parent_constraints": [
                    { "parent_type": "http://example.org/types/Item",
                      "relation": { "has_parent": "http://example.org/rel/isPartOf" } }
                ]
            }
        ],
        "transforms": [
            { "id": "http://example.org/transforms/file-to-item", "label": "File to Item",
              "source_types": ["http://example.org/types/File"],
              "result_type": "http://example.org/types/Item" }
        ]
    }"#;

    mod parse_profile_fn {
        use super::*;

        #[test]
        fn full_document() {
            let profile = parse_profile(FULL).unwrap();
            assert_eq!(profile.property_types.len(), 2);
            assert_eq!(profile.property_types[0].cardinality, Cardinality::Single);
            assert!(profile.property_types[1].read_only);

            let file = &profile.node_types[0];
            assert_eq!(file.domain_types.len(), 1);
            assert_eq!(
                file.property_constraints[0].default_value,
                Some(PropertyData::String("untitled".into()))
            );
            assert_eq!(file.supplied_properties[0].source, SuppliedSource::FileSize);
            assert_eq!(profile.transforms.len(), 1);
        }

        #[test]
        fn invalid_kind() {
            let json = r#"{ "kind": "wrong-kind", "schema_version": 1 }"#;
            let result = parse_profile(json);
            assert!(matches!(result, Err(ProfileError::InvalidKind { .. })));
        }

        #[test]
        fn unsupported_version() {
            let json = r#"{ "kind": "ipmkit.domain-profile", "schema_version": 7 }"#;
            let result = parse_profile(json);
            assert!(matches!(result, Err(ProfileError::UnsupportedVersion(7))));
        }

        #[test]
        fn missing_envelope() {
            let result = parse_profile(r#"{ "id": "http://example.org/p" }"#);
            assert!(matches!(result, Err(ProfileError::ParseError(_))));
        }

        #[test]
        fn unknown_fields_rejected() {
            let json = r#"{
                "kind": "ipmkit.domain-profile",
                "schema_version": 1,
                "id": "http://example.org/p",
                "label": "P",
                "colour": "blue"
            }"#;
            let result = parse_profile(json);
            assert!(matches!(result, Err(ProfileError::ParseError(_))));
        }

        #[test]
        fn invalid_identifier_rejected() {
            let json = r#"{
                "kind": "ipmkit.domain-profile",
                "schema_version": 1,
                "id": "not an iri",
                "label": "P"
            }"#;
            assert!(parse_profile(json).is_err());
        }
    }

    mod domain_profile {
        use super::*;

        #[test]
        fn new_has_current_envelope() {
            let profile = DomainProfile::new(Iri::new("urn:profile:a").unwrap(), "A");
            assert!(profile.validate_envelope().is_ok());
        }

        #[test]
        fn validate_catches_bad_version() {
            let mut profile = DomainProfile::new(Iri::new("urn:profile:a").unwrap(), "A");
            profile.schema_version = 2;
            assert!(matches!(
                profile.validate_envelope(),
                Err(ProfileError::UnsupportedVersion(2))
            ));
        }

        #[test]
        fn roundtrip() {
            let profile = parse_profile(FULL).unwrap();
            let json = profile.to_json().unwrap();
            assert_eq!(parse_profile(&json).unwrap(), profile);
        }
    }
}
