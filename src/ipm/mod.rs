//! ipm
//!
//! Graph transform service: content tree to triple graph and back.
//!
//! # Modules
//!
//! - [`vocab`] - Wire vocabulary
//! - [`encode`] - Tree to graph
//! - [`decode`] - Graph to tree, with strict validation
//!
//! # Wire form
//!
//! Each node is a blank resource typed `IPMNode` carrying its identifier,
//! type identifiers, ignore flag and domain object identifier as literals.
//! The root carries `isRoot true`; every other node links to its parent
//! with `hasParent`. Children hang off a single `hasChild` edge as an RDF
//! list, so order survives. File metadata is a nested `FileInfo` resource.
//!
//! # Invariants
//!
//! - `decode(encode(t))` reproduces `t`'s identifiers, types, ignore
//!   flags, bindings, file metadata and child order
//! - Decoding never guesses: wherever exactly one value is expected and
//!   several are present, it fails with a structural error
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ipmkit::core::profile::ProfileRegistry;
//! use ipmkit::core::tree::{IpmTree, Node};
//! use ipmkit::core::types::NodeId;
//! use ipmkit::ipm::IpmRdfTransform;
//!
//! let (mut tree, root) = IpmTree::with_root(Node::new(NodeId::new("urn:node:root").unwrap())).unwrap();
//! let child = tree.insert(Node::new(NodeId::new("urn:node:child").unwrap())).unwrap();
//! tree.attach(root, child).unwrap();
//!
//! let service = IpmRdfTransform::new(Arc::new(ProfileRegistry::empty()));
//! let graph = service.encode(&tree).unwrap();
//! let decoded = service.decode(&graph).unwrap();
//!
//! assert_eq!(decoded.snapshot(), tree.snapshot());
//! ```

pub mod decode;
pub mod encode;
pub mod vocab;

use std::sync::Arc;

use thiserror::Error;

use crate::core::file_info::FileInfoError;
use crate::core::profile::ProfileRegistry;
use crate::core::tree::TreeError;
use crate::core::types::{Iri, NodeId, NodeTypeId};
use crate::rdf::{ListError, Resource};

use vocab::Vocab;

/// Coarse classification of a transform failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The graph does not describe a well-formed tree.
    Structural,
    /// The graph names a type the loaded profiles do not declare.
    Reference,
}

/// Errors from encoding or decoding a tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("graph has no root node")]
    NoRoot,

    #[error("graph has {0} root nodes, expected one")]
    MultipleRoots(usize),

    #[error("root node {0} has a parent")]
    RootHasParent(Resource),

    #[error("node resource {0} has no identifier")]
    MissingId(Resource),

    #[error("{resource} has no {predicate}")]
    MissingValue { resource: Resource, predicate: Iri },

    #[error("{resource} has more than one {predicate}")]
    MultipleValues { resource: Resource, predicate: Iri },

    #[error("{resource} {predicate} should be a literal")]
    ExpectedLiteral { resource: Resource, predicate: Iri },

    #[error("{resource} {predicate} should be a resource")]
    ExpectedResource { resource: Resource, predicate: Iri },

    #[error("{resource} {predicate} has unparseable value '{lexical}'")]
    InvalidLiteral {
        resource: Resource,
        predicate: Iri,
        lexical: String,
    },

    #[error("node identifier '{0}' is used by more than one resource")]
    DuplicateId(NodeId),

    #[error("{child} is listed more than once under {parent}")]
    DuplicateChild { parent: Resource, child: Resource },

    #[error("{0} is listed under several parents")]
    SharedChild(Resource),

    #[error("shared child {0} does not name one parent with hasParent")]
    UnresolvedParent(Resource),

    #[error("{child} names parent {parent}, which does not list it")]
    ParentMismatch { child: Resource, parent: Resource },

    #[error("{child} names parent {parent}, which is not reachable from the root")]
    UnreachableParent { child: Resource, parent: Resource },

    #[error("node resource {0} is reachable from itself")]
    Cycle(Resource),

    #[error("node '{node}' has invalid file metadata: {source}")]
    InvalidFileInfo {
        node: NodeId,
        #[source]
        source: FileInfoError,
    },

    #[error("malformed children list: {0}")]
    List(#[from] ListError),

    #[error("node '{node}' has type '{node_type}', which no loaded profile declares")]
    UnknownNodeType { node: NodeId, node_type: NodeTypeId },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::UnknownNodeType { .. } => ErrorKind::Reference,
            _ => ErrorKind::Structural,
        }
    }
}

/// Encodes and decodes content trees against one set of loaded profiles.
#[derive(Debug, Clone)]
pub struct IpmRdfTransform {
    registry: Arc<ProfileRegistry>,
    vocab: Vocab,
    allow_shared_children: bool,
}

impl IpmRdfTransform {
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self {
            registry,
            vocab: Vocab::default(),
            allow_shared_children: true,
        }
    }

    /// Whether decode resolves a resource listed under several parents
    /// (the default) or rejects it.
    pub fn with_shared_children(mut self, allow: bool) -> Self {
        self.allow_shared_children = allow;
        self
    }

    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        &self.registry
    }
}
