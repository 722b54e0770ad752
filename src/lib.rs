//! ipmkit - Internal package model toolkit
//!
//! ipmkit holds the in-memory model of a content package before it is
//! assembled: a tree mirroring the files on disk, the domain objects bound
//! to its nodes under one or more domain profiles, and a triple graph form
//! of both for persistence and exchange.
//!
//! # Architecture
//!
//! The codebase is layered, each layer depending only on the ones above it:
//!
//! - [`core`] - Identifiers, file metadata, the content tree, profile schema, config
//! - [`rdf`] - In-memory triple graph, RDF lists and N-Triples
//! - [`store`] - Domain profile object store and profile validation
//! - [`transform`] - Node type transforms and metadata inheritance
//! - [`ipm`] - Tree to graph encoding and strict decoding
//! - [`session`] - Save and restore of a working package
//! - [`logging`] - Tracing subscriber setup
//!
//! # Correctness Invariants
//!
//! ipmkit maintains the following invariants:
//!
//! 1. The tree is acyclic and every node has at most one parent
//! 2. A bound domain object carries exactly its node's profile types and
//!    one structural edge to its parent's object
//! 3. Changing a node's type never drops property values silently
//! 4. Decoding a graph either yields a whole tree or fails

pub mod core;
pub mod ipm;
pub mod logging;
pub mod rdf;
pub mod session;
pub mod store;
pub mod transform;
