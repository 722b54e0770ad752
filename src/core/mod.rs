//! core
//!
//! Core domain types and schemas for ipmkit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Iri, NodeId, ObjectId, Fingerprint, etc.
//! - [`file_info`] - File metadata carried by tree nodes
//! - [`tree`] - Arena-backed content tree
//! - [`verify`] - Link and reachability checks over a tree
//! - [`property`] - Property values attached to domain objects
//! - [`profile`] - Domain profile schema and registry
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Profiles are immutable once loaded and passed explicitly

pub mod config;
pub mod file_info;
pub mod profile;
pub mod property;
pub mod tree;
pub mod types;
pub mod verify;
