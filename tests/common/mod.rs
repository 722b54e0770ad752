//! Shared fixtures for integration tests.
//!
//! The profile models a small archive: Collections hold Items (files) and
//! Folders (directories), with `isMemberOf` / `isPartOf` as the structural
//! relations.

#![allow(dead_code)]

use std::sync::Arc;

use ipmkit::core::file_info::FileInfo;
use ipmkit::core::profile::{parse_profile, ProfileRegistry};
use ipmkit::core::tree::{IpmTree, Node, NodeKey};
use ipmkit::core::types::{Iri, NodeId, NodeTypeId, PropertyTypeId};

pub const PROFILE_JSON: &str = r#"{
    "kind": "ipmkit.domain-profile",
    "schema_version": 1,
    "id": "http://example.org/profiles/archive",
    "label": "Archive",
    "property_types": [
        { "id": "http://example.org/props/title", "label": "Title", "value_type": "string", "cardinality": "single" },
        { "id": "http://example.org/props/creator", "label": "Creator", "value_type": "string" },
        { "id": "http://example.org/props/rights", "label": "Rights", "value_type": "string" },
        { "id": "http://example.org/props/extent", "label": "Extent", "value_type": "long", "cardinality": "single", "read_only": true }
    ],
    "node_types": [
        {
            "id": "http://example.org/types/Collection",
            "label": "Collection",
            "domain_types": ["http://example.org/domain/Collection"],
            "property_constraints": [
                { "property_type": "http://example.org/props/title", "required": true, "default_value": { "kind": "string", "value": "Untitled" } },
                { "property_type": "http://example.org/props/creator" },
                { "property_type": "http://example.org/props/rights" }
            ],
            "parent_constraints": [
                { "parent_type": null }
            ]
        },
        {
            "id": "http://example.org/types/Folder",
            "label": "Folder",
            "domain_types": ["http://example.org/domain/Folder"],
            "property_constraints": [
                { "property_type": "http://example.org/props/title" },
                { "property_type": "http://example.org/props/rights" }
            ],
            "parent_constraints": [
                {
                    "parent_type": "http://example.org/types/Collection",
                    "relation": { "has_parent": "http://example.org/rel/isPartOf", "has_child": "http://example.org/rel/hasPart" }
                }
            ],
            "file_association": "directory"
        },
        {
            "id": "http://example.org/types/Item",
            "label": "Item",
            "domain_types": ["http://example.org/domain/Item"],
            "property_constraints": [
                { "property_type": "http://example.org/props/title" },
                { "property_type": "http://example.org/props/rights" },
                { "property_type": "http://example.org/props/extent" }
            ],
            "supplied_properties": [
                { "property_type": "http://example.org/props/extent", "source": "file_size" },
                { "property_type": "http://example.org/props/title", "source": "file_name" }
            ],
            "parent_constraints": [
                {
                    "parent_type": "http://example.org/types/Collection",
                    "relation": { "has_parent": "http://example.org/rel/isMemberOf", "has_child": "http://example.org/rel/hasMember" }
                },
                {
                    "parent_type": "http://example.org/types/Folder",
                    "relation": { "has_parent": "http://example.org/rel/isPartOf" }
                }
            ],
            "file_association": "file"
        }
    ],
    "transforms": [
        {
            "id": "http://example.org/transforms/collection-to-folder",
            "label": "Collection to Folder",
            "source_types": ["http://example.org/types/Collection"],
            "source_parent_type": "http://example.org/types/Collection",
            "result_type": "http://example.org/types/Folder"
        },
        {
            "id": "http://example.org/transforms/folder-to-collection",
            "label": "Folder to Collection",
            "source_types": ["http://example.org/types/Folder"],
            "result_type": "http://example.org/types/Collection"
        }
    ]
}"#;

pub fn registry() -> Arc<ProfileRegistry> {
    let profile = parse_profile(PROFILE_JSON).unwrap();
    Arc::new(ProfileRegistry::new(vec![profile]).unwrap())
}

pub fn iri(s: &str) -> Iri {
    Iri::new(format!("http://example.org/{s}")).unwrap()
}

pub fn node_type(name: &str) -> NodeTypeId {
    NodeTypeId::from(iri(&format!("types/{name}")))
}

pub fn prop(name: &str) -> PropertyTypeId {
    PropertyTypeId::from(iri(&format!("props/{name}")))
}

pub fn transform(name: &str) -> Iri {
    iri(&format!("transforms/{name}"))
}

pub fn node_id(s: &str) -> NodeId {
    NodeId::new(format!("urn:node:{s}")).unwrap()
}

pub fn node(id: &str, ty: &str) -> Node {
    Node::new(node_id(id)).with_type(node_type(ty))
}

pub fn file(id: &str, name: &str, size: u64) -> Node {
    let mut info = FileInfo::file(name).unwrap();
    info.set_size(Some(size));
    node(id, "Item").with_file_info(info)
}

pub fn directory(id: &str, name: &str) -> Node {
    node(id, "Folder").with_file_info(FileInfo::directory(name).unwrap())
}

/// The archive fixture:
///
/// ```text
/// root (Collection)
/// ├── docs (Folder)
/// │   └── readme (Item, 120 bytes)
/// ├── sub (Collection)
/// └── data (Item, 4096 bytes)
/// ```
pub struct Archive {
    pub tree: IpmTree,
    pub root: NodeKey,
    pub docs: NodeKey,
    pub readme: NodeKey,
    pub sub: NodeKey,
    pub data: NodeKey,
}

pub fn archive() -> Archive {
    let (mut tree, root) = IpmTree::with_root(node("root", "Collection")).unwrap();
    let docs = tree.insert(directory("docs", "docs")).unwrap();
    let readme = tree.insert(file("readme", "README.txt", 120)).unwrap();
    let sub = tree.insert(node("sub", "Collection")).unwrap();
    let data = tree.insert(file("data", "data.csv", 4096)).unwrap();
    tree.attach(root, docs).unwrap();
    tree.attach(docs, readme).unwrap();
    tree.attach(root, sub).unwrap();
    tree.attach(root, data).unwrap();
    Archive {
        tree,
        root,
        docs,
        readme,
        sub,
        data,
    }
}
