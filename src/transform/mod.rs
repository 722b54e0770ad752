//! transform
//!
//! Node type transforms and metadata inheritance.
//!
//! # Modules
//!
//! - [`engine`] - Transform discovery, advisory planning, commit
//! - [`inheritance`] - Push property values down a subtree
//!
//! # Architecture
//!
//! A type change runs in two phases. [`TransformEngine::plan`] is read-only
//! and reports which property values the change would leave without a
//! declaring type. The caller decides, then [`TransformEngine::commit`]
//! swaps types, inserts any synthetic parent, and resyncs the affected
//! objects top-down.
//!
//! Nothing here deletes property values. Values that fall out of the valid
//! set stay on the object until the caller removes them.

pub mod engine;
pub mod inheritance;

use thiserror::Error;

use crate::core::tree::TreeError;
use crate::core::types::{Iri, NodeId, NodeTypeId};
use crate::store::StoreError;

pub use engine::{CommitReport, PlannedNode, PropertyLossAdvisory, TransformEngine, TransformPlan};
pub use inheritance::{inherit_metadata, InheritReport};

/// Errors from the transform engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("transform '{0}' is not declared by any loaded profile")]
    UnknownTransform(Iri),

    #[error("transform '{transform}' does not apply to node '{node}'")]
    NotApplicable { node: NodeId, transform: Iri },

    #[error("node '{node}' changed since planning (expected type '{expected}')")]
    Stale {
        node: NodeId,
        expected: NodeTypeId,
        found: Option<NodeTypeId>,
    },

    #[error("node '{0}' has no domain object")]
    Unbound(NodeId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}
