//! Integration tests for the graph transform service.
//!
//! Trees go through the full persistence path: encode, N-Triples text,
//! parse, decode.

mod common;

use chrono::{TimeZone, Utc};
use tracing_test::traced_test;

use ipmkit::core::file_info::{ChecksumAlgorithm, FileInfo};
use ipmkit::core::tree::IpmTree;
use ipmkit::core::types::Iri;
use ipmkit::ipm::vocab::{HAS_CHILD, HAS_FILE_INFO, HAS_ID, HAS_PARENT, IS_ROOT};
use ipmkit::ipm::{ErrorKind, IpmRdfTransform, TransformError};
use ipmkit::rdf::{ntriples, Graph, Literal, Resource, Term};
use ipmkit::store::{DomainProfileObjectStore, ObjectStore};

use common::{archive, node_id};

// =============================================================================
// Test Helpers
// =============================================================================

fn service() -> IpmRdfTransform {
    IpmRdfTransform::new(common::registry())
}

fn through_text(graph: &Graph) -> Graph {
    ntriples::parse(&ntriples::write(graph)).unwrap()
}

fn predicate(s: &str) -> Iri {
    Iri::new(s).unwrap()
}

fn resource_for(graph: &Graph, id: &str) -> Resource {
    let found = graph.subjects(
        &predicate(HAS_ID),
        &Literal::string(node_id(id).as_str()).into(),
    );
    assert_eq!(found.len(), 1, "one resource for {id}");
    found[0].clone()
}

/// The archive with file metadata filled in, one ignored node and bound
/// domain objects.
fn rich_tree() -> IpmTree {
    let mut arc = archive();
    let readme = arc.tree.node_mut(arc.readme).unwrap();
    let mut info = FileInfo::file("README.txt").unwrap();
    info.set_location("file:///pkg/docs/README.txt").unwrap();
    info.set_size(Some(120));
    info.add_format("text/plain");
    info.add_format("info:pronom/x-fmt/111");
    info.set_checksum(
        ChecksumAlgorithm::Sha1,
        "da39a3ee5e6b4b0d3255bfef95601890afd80709",
    )
    .unwrap();
    info.set_created(Some(Utc.timestamp_millis_opt(1_500_000_000_000).unwrap()));
    info.set_modified(Some(Utc.timestamp_millis_opt(1_500_000_123_456).unwrap()));
    readme.set_file_info(Some(info));
    arc.tree.set_ignored(arc.data, true, false).unwrap();

    let mut store = ObjectStore::new(common::registry());
    for key in arc.tree.depth_first(false) {
        store.update_object(&mut arc.tree, key).unwrap();
    }
    arc.tree
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn round_trip_through_ntriples() {
    let tree = rich_tree();
    let service = service();
    let graph = through_text(&service.encode(&tree).unwrap());
    let decoded = service.decode(&graph).unwrap();

    assert_eq!(decoded.snapshot(), tree.snapshot());
    let data = decoded.find(&node_id("data")).unwrap();
    assert!(decoded.node(data).unwrap().is_ignored());
    assert!(decoded.node(data).unwrap().domain_object().is_none());
}

#[test]
fn child_order_survives() {
    let tree = rich_tree();
    let service = service();
    let decoded = service.decode(&service.encode(&tree).unwrap()).unwrap();
    let names: Vec<String> = decoded
        .children(decoded.root().unwrap())
        .iter()
        .map(|&k| decoded.node(k).unwrap().id().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["urn:node:docs", "urn:node:sub", "urn:node:data"]
    );
}

#[test]
fn encoding_is_deterministic_up_to_blank_labels() {
    let tree = rich_tree();
    let service = service();
    let a = service.encode(&tree).unwrap();
    let b = service.encode(&tree).unwrap();
    assert_eq!(a.len(), b.len());
    assert_eq!(
        service.decode(&a).unwrap().snapshot(),
        service.decode(&b).unwrap().snapshot()
    );
}

#[test]
fn subtree_encoding_covers_connected_nodes() {
    let arc = archive();
    let service = service();
    let graph = service.encode_from(&arc.tree, arc.readme).unwrap();
    for id in ["root", "docs", "readme", "sub", "data"] {
        resource_for(&graph, id);
    }
}

#[test]
fn deep_chain_round_trips() {
    const DEPTH: usize = 10_000;
    let (mut tree, root) = IpmTree::with_root(common::node("level0", "Collection")).unwrap();
    let mut keys = vec![root];
    for i in 1..=DEPTH {
        keys.push(tree.insert(common::node(&format!("level{i}"), "Folder")).unwrap());
    }
    // Bottom-up, so each attach happens under a floating parent.
    for i in (1..=DEPTH).rev() {
        tree.attach(keys[i - 1], keys[i]).unwrap();
    }

    let service = service();
    let graph = service.encode(&tree).unwrap();
    let decoded = service.decode(&graph).unwrap();
    assert_eq!(decoded.len(), DEPTH + 1);
    let leaf = decoded.find(&node_id(&format!("level{DEPTH}"))).unwrap();
    assert_eq!(decoded.depth(leaf), DEPTH);
}

// =============================================================================
// Shared references
// =============================================================================

#[test]
fn shared_listing_decodes_to_one_node() {
    let arc = archive();
    let service = service();
    let mut graph = service.encode(&arc.tree).unwrap();

    // List readme a second time, under sub.
    let sub = resource_for(&graph, "sub");
    let readme = resource_for(&graph, "readme");
    let head = graph.insert_list(vec![Term::from(readme)]);
    graph.insert(sub, predicate(HAS_CHILD), head);

    let decoded = service.decode(&graph).unwrap();
    assert_eq!(decoded.len(), 5);
    let readme = decoded.find(&node_id("readme")).unwrap();
    let docs = decoded.find(&node_id("docs")).unwrap();
    assert_eq!(decoded.parent(readme), Some(docs));
    assert_eq!(decoded.snapshot(), arc.tree.snapshot());
}

#[test]
#[traced_test]
fn shared_listing_is_logged() {
    let arc = archive();
    let service = service();
    let mut graph = service.encode(&arc.tree).unwrap();
    let data = resource_for(&graph, "data");
    let sub = resource_for(&graph, "sub");
    let head = graph.insert_list(vec![Term::from(data)]);
    graph.insert(sub, predicate(HAS_CHILD), head);

    service.decode(&graph).unwrap();
    assert!(logs_contain("deferring shared child"));
    assert!(logs_contain("decoded tree"));
}

// =============================================================================
// Rejections
// =============================================================================

mod rejections {
    use super::*;

    #[test]
    fn second_root_marker() {
        let service = service();
        let mut graph = service.encode(&archive().tree).unwrap();
        let sub = resource_for(&graph, "sub");
        graph.remove_values(&sub, &predicate(HAS_PARENT));
        graph.insert(sub, predicate(IS_ROOT), Literal::boolean(true));
        let err = service.decode(&graph).unwrap_err();
        assert_eq!(err, TransformError::MultipleRoots(2));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn no_root_marker() {
        let service = service();
        let mut graph = service.encode(&archive().tree).unwrap();
        let root = resource_for(&graph, "root");
        graph.remove_values(&root, &predicate(IS_ROOT));
        assert_eq!(service.decode(&graph).err(), Some(TransformError::NoRoot));
    }

    #[test]
    fn root_with_parent_edge() {
        let service = service();
        let mut graph = service.encode(&archive().tree).unwrap();
        let root = resource_for(&graph, "root");
        let sub = resource_for(&graph, "sub");
        graph.insert(root.clone(), predicate(HAS_PARENT), sub);
        assert_eq!(
            service.decode(&graph).err(),
            Some(TransformError::RootHasParent(root))
        );
    }

    #[test]
    fn second_file_info() {
        let service = service();
        let mut graph = service.encode(&archive().tree).unwrap();
        let readme = resource_for(&graph, "readme");
        let data = resource_for(&graph, "data");
        let info = graph
            .objects(&data, &predicate(HAS_FILE_INFO))
            .next()
            .cloned()
            .unwrap();
        graph.insert(readme.clone(), predicate(HAS_FILE_INFO), info);
        assert_eq!(
            service.decode(&graph).err(),
            Some(TransformError::MultipleValues {
                resource: readme,
                predicate: predicate(HAS_FILE_INFO),
            })
        );
    }

    #[test]
    fn child_claimed_by_a_parent_outside_the_tree() {
        let arc = archive();
        let service = service();
        let mut graph = service.encode(&arc.tree).unwrap();
        let readme = resource_for(&graph, "readme");
        let stray = graph.new_blank();
        let head = graph.insert_list(vec![Term::from(readme.clone())]);
        graph.insert(stray.clone(), predicate(HAS_CHILD), head);
        graph.remove_values(&readme, &predicate(HAS_PARENT));
        graph.insert(readme.clone(), predicate(HAS_PARENT), stray.clone());

        let err = service.decode(&graph).unwrap_err();
        assert_eq!(
            err,
            TransformError::UnreachableParent {
                child: readme,
                parent: stray,
            }
        );
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn declared_parent_disagrees_with_only_listing() {
        let service = service();
        let mut graph = service.encode(&archive().tree).unwrap();
        let readme = resource_for(&graph, "readme");
        let sub = resource_for(&graph, "sub");
        graph.remove_values(&readme, &predicate(HAS_PARENT));
        graph.insert(readme.clone(), predicate(HAS_PARENT), sub.clone());
        assert_eq!(
            service.decode(&graph).err(),
            Some(TransformError::ParentMismatch {
                child: readme,
                parent: sub,
            })
        );
    }

    #[test]
    fn duplicate_identifier() {
        let service = service();
        let mut graph = service.encode(&archive().tree).unwrap();
        let sub = resource_for(&graph, "sub");
        graph.remove_values(&sub, &predicate(HAS_ID));
        graph.insert(sub, predicate(HAS_ID), Literal::string(node_id("data").as_str()));
        assert_eq!(
            service.decode(&graph).err(),
            Some(TransformError::DuplicateId(node_id("data")))
        );
    }

    #[test]
    fn foreign_profile_is_a_reference_error() {
        let graph = service().encode(&archive().tree).unwrap();
        let bare = IpmRdfTransform::new(std::sync::Arc::new(
            ipmkit::core::profile::ProfileRegistry::empty(),
        ));
        let err = bare.decode(&graph).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
        assert!(matches!(err, TransformError::UnknownNodeType { .. }));
    }

    #[test]
    fn tolerates_missing_optional_predicates_in_text() {
        let text = format!(
            "_:n <{HAS_ID}> \"urn:node:solo\" .\n_:n <{IS_ROOT}> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> .\n"
        );
        let graph = ntriples::parse(&text).unwrap();
        let tree = service().decode(&graph).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.find(&node_id("solo")), tree.root());
    }
}
