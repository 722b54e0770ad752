//! core::property
//!
//! Concrete property values carried by domain objects.
//!
//! A [`PropertyValue`] pairs a property type identifier with typed data.
//! The data variant is a closed set matching [`PropertyValueType`]; complex
//! values nest further property values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::PropertyValueType;
use super::types::{Iri, PropertyTypeId};

/// Typed payload of a property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyData {
    String(String),
    Long(i64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Uri(Iri),
    Complex(Vec<PropertyValue>),
}

impl PropertyData {
    /// The value kind of this payload.
    pub fn kind(&self) -> PropertyValueType {
        match self {
            PropertyData::String(_) => PropertyValueType::String,
            PropertyData::Long(_) => PropertyValueType::Long,
            PropertyData::Boolean(_) => PropertyValueType::Boolean,
            PropertyData::DateTime(_) => PropertyValueType::DateTime,
            PropertyData::Uri(_) => PropertyValueType::Uri,
            PropertyData::Complex(_) => PropertyValueType::Complex,
        }
    }
}

/// One concrete value of a property type.
///
/// # Example
///
/// ```
/// use ipmkit::core::property::{PropertyData, PropertyValue};
/// use ipmkit::core::profile::PropertyValueType;
/// use ipmkit::core::types::PropertyTypeId;
///
/// let title = PropertyTypeId::new("http://example.org/props/title").unwrap();
/// let value = PropertyValue::string(title.clone(), "Field notes");
///
/// assert_eq!(value.property_type(), &title);
/// assert_eq!(value.kind(), PropertyValueType::String);
/// assert_eq!(value.data(), &PropertyData::String("Field notes".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyValue {
    property_type: PropertyTypeId,
    data: PropertyData,
}

impl PropertyValue {
    pub fn new(property_type: PropertyTypeId, data: PropertyData) -> Self {
        Self {
            property_type,
            data,
        }
    }

    pub fn string(property_type: PropertyTypeId, value: impl Into<String>) -> Self {
        Self::new(property_type, PropertyData::String(value.into()))
    }

    pub fn long(property_type: PropertyTypeId, value: i64) -> Self {
        Self::new(property_type, PropertyData::Long(value))
    }

    pub fn boolean(property_type: PropertyTypeId, value: bool) -> Self {
        Self::new(property_type, PropertyData::Boolean(value))
    }

    pub fn date_time(property_type: PropertyTypeId, value: DateTime<Utc>) -> Self {
        Self::new(property_type, PropertyData::DateTime(value))
    }

    pub fn uri(property_type: PropertyTypeId, value: Iri) -> Self {
        Self::new(property_type, PropertyData::Uri(value))
    }

    pub fn complex(property_type: PropertyTypeId, parts: Vec<PropertyValue>) -> Self {
        Self::new(property_type, PropertyData::Complex(parts))
    }

    pub fn property_type(&self) -> &PropertyTypeId {
        &self.property_type
    }

    pub fn data(&self) -> &PropertyData {
        &self.data
    }

    pub fn kind(&self) -> PropertyValueType {
        self.data.kind()
    }

    /// Sub-properties of a complex value; empty for scalars.
    pub fn parts(&self) -> &[PropertyValue] {
        match &self.data {
            PropertyData::Complex(parts) => parts,
            _ => &[],
        }
    }
}
