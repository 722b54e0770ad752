//! store::traits
//!
//! The object store seam consumed by presentation and CLI layers.

use super::StoreError;
use crate::core::property::PropertyValue;
use crate::core::tree::{IpmTree, NodeKey};
use crate::core::types::{Iri, NodeTypeId, ObjectId, PropertyTypeId};

/// Keeps each node's domain object consistent with the loaded profiles.
///
/// Implementations must be `Send` so a session can be moved to a worker
/// thread. They are not required to be internally synchronized.
pub trait DomainProfileObjectStore: Send {
    /// Create or re-synchronize the domain object bound to `node`.
    ///
    /// The parent's object must already exist, so trees are processed
    /// top-down. On success the node is bound to the returned identifier.
    fn update_object(&mut self, tree: &mut IpmTree, node: NodeKey)
        -> Result<ObjectId, StoreError>;

    /// Add one property value to an object.
    fn add_property(&mut self, object: &ObjectId, value: PropertyValue) -> Result<(), StoreError>;

    /// Remove exactly the matching value. Returns whether it was present.
    fn remove_property(
        &mut self,
        object: &ObjectId,
        value: &PropertyValue,
    ) -> Result<bool, StoreError>;

    /// Remove every value of a property type. Returns how many were removed.
    fn remove_property_type(
        &mut self,
        object: &ObjectId,
        property_type: &PropertyTypeId,
    ) -> Result<usize, StoreError>;

    /// Values of every property type the node type declares, in constraint
    /// order. Empty if there are none.
    fn get_properties_by_node_type(
        &self,
        object: &ObjectId,
        node_type: &NodeTypeId,
    ) -> Vec<PropertyValue>;

    /// Values of one property type, in insertion order. Empty if there are none.
    fn get_properties(&self, object: &ObjectId, property_type: &PropertyTypeId)
        -> Vec<PropertyValue>;

    /// Whether `subject predicate object` is present.
    fn has_relationship(&self, subject: &Iri, predicate: &Iri, object: &Iri) -> bool;
}
