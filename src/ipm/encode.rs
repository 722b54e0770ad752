//! ipm::encode
//!
//! Tree to graph.
//!
//! Resources are indexed by node identifier while the graph is built. A node
//! reached a second time, as a parent target or as a child, reuses the
//! resource already allocated, so each node is written exactly once.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{IpmRdfTransform, TransformError};
use crate::core::file_info::{ChecksumAlgorithm, FileInfo};
use crate::core::tree::{IpmTree, NodeKey};
use crate::core::types::NodeId;
use crate::rdf::{vocab as rdf_vocab, Graph, Literal, Resource, Term};

impl IpmRdfTransform {
    /// Encode the whole tree, starting at the root.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::NoRoot` for a tree without a root.
    pub fn encode(&self, tree: &IpmTree) -> Result<Graph, TransformError> {
        let root = tree.root().ok_or(TransformError::NoRoot)?;
        self.encode_from(tree, root)
    }

    /// Encode starting at any node.
    ///
    /// Parents are emitted before they are linked, so the result covers
    /// every node connected to `start`.
    pub fn encode_from(&self, tree: &IpmTree, start: NodeKey) -> Result<Graph, TransformError> {
        let mut encoder = Encoder {
            service: self,
            tree,
            graph: Graph::new(),
            emitted: HashMap::new(),
        };
        encoder.emit(start)?;
        debug!(
            nodes = encoder.emitted.len(),
            statements = encoder.graph.len(),
            "encoded tree"
        );
        Ok(encoder.graph)
    }
}

struct Encoder<'a> {
    service: &'a IpmRdfTransform,
    tree: &'a IpmTree,
    graph: Graph,
    emitted: HashMap<NodeId, Resource>,
}

impl Encoder<'_> {
    /// The resource standing for `id`, allocated on first use.
    fn resource_for(&mut self, id: &NodeId) -> Resource {
        if let Some(existing) = self.emitted.get(id) {
            return existing.clone();
        }
        let resource = self.graph.new_blank();
        self.emitted.insert(id.clone(), resource.clone());
        resource
    }

    /// Write every node connected to `start`, walking parents and children
    /// with an explicit stack.
    fn emit(&mut self, start: NodeKey) -> Result<(), TransformError> {
        let tree = self.tree;
        let mut pending = vec![start];
        let mut written = HashSet::new();

        while let Some(key) = pending.pop() {
            let node = tree.node(key)?;
            if !written.insert(key) {
                continue;
            }
            let resource = self.resource_for(node.id());
            self.write_node(key, &resource)?;

            if let Some(parent) = tree.parent(key) {
                pending.push(parent);
            }
            pending.extend(tree.children(key).iter().rev().copied());
        }
        Ok(())
    }

    fn write_node(&mut self, key: NodeKey, resource: &Resource) -> Result<(), TransformError> {
        let (service, tree) = (self.service, self.tree);
        let v = &service.vocab;
        let node = tree.node(key)?;

        self.graph
            .insert(resource.clone(), rdf_vocab::rdf_type(), v.ipm_node.clone());
        self.graph.insert(
            resource.clone(),
            v.has_id.clone(),
            Literal::string(node.id().as_str()),
        );
        if let Some(node_type) = node.node_type() {
            self.graph.insert(
                resource.clone(),
                v.has_node_type.clone(),
                Literal::string(node_type.as_str()),
            );
        }
        for sub_type in node.sub_types() {
            self.graph.insert(
                resource.clone(),
                v.has_sub_type.clone(),
                Literal::string(sub_type.as_str()),
            );
        }

        match tree.parent(key) {
            None => {
                self.graph
                    .insert(resource.clone(), v.is_root.clone(), Literal::boolean(true));
            }
            Some(parent) => {
                let parent = self.resource_for(tree.node(parent)?.id());
                self.graph.insert(resource.clone(), v.has_parent.clone(), parent);
            }
        }

        let children = tree.children(key);
        if !children.is_empty() {
            let mut items: Vec<Term> = Vec::with_capacity(children.len());
            for &child in children {
                items.push(self.resource_for(tree.node(child)?.id()).into());
            }
            let head = self.graph.insert_list(items);
            self.graph.insert(resource.clone(), v.has_child.clone(), head);
        }

        self.graph.insert(
            resource.clone(),
            v.is_ignored.clone(),
            Literal::boolean(node.is_ignored()),
        );
        if let Some(object) = node.domain_object() {
            self.graph.insert(
                resource.clone(),
                v.has_domain_object.clone(),
                Literal::string(object.as_str()),
            );
        }
        if let Some(info) = node.file_info() {
            let info_resource = self.emit_file_info(info);
            self.graph
                .insert(resource.clone(), v.has_file_info.clone(), info_resource);
        }
        Ok(())
    }

    fn emit_file_info(&mut self, info: &FileInfo) -> Resource {
        let v = &self.service.vocab;
        let g = &mut self.graph;
        let r = g.new_blank();

        g.insert(r.clone(), rdf_vocab::rdf_type(), v.file_info.clone());
        g.insert(r.clone(), v.has_name.clone(), Literal::string(info.name()));
        if let Some(location) = info.location() {
            g.insert(r.clone(), v.has_location.clone(), Literal::string(location));
        }
        if let Some(size) = info.size().and_then(|s| i64::try_from(s).ok()) {
            g.insert(r.clone(), v.has_size.clone(), Literal::long(size));
        }
        g.insert(r.clone(), v.is_byte_stream.clone(), Literal::boolean(info.is_file()));
        g.insert(
            r.clone(),
            v.is_directory.clone(),
            Literal::boolean(info.is_directory()),
        );
        for format in info.formats() {
            g.insert(r.clone(), v.has_format.clone(), Literal::string(format.as_str()));
        }
        for (algorithm, digest) in info.checksums() {
            let predicate = match algorithm {
                ChecksumAlgorithm::Sha1 => v.has_sha1_checksum.clone(),
                ChecksumAlgorithm::Md5 => v.has_md5_checksum.clone(),
            };
            g.insert(r.clone(), predicate, Literal::string(digest));
        }
        if let Some(created) = info.created() {
            g.insert(
                r.clone(),
                v.has_created_date.clone(),
                Literal::long(created.timestamp_millis()),
            );
        }
        if let Some(modified) = info.modified() {
            g.insert(
                r.clone(),
                v.has_modified_date.clone(),
                Literal::long(modified.timestamp_millis()),
            );
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::profile::ProfileRegistry;
    use crate::core::tree::Node;
    use crate::core::types::Iri;
    use crate::ipm::vocab;

    fn node(id: &str) -> Node {
        Node::new(NodeId::new(format!("urn:node:{id}")).unwrap())
    }

    fn service() -> IpmRdfTransform {
        IpmRdfTransform::new(Arc::new(ProfileRegistry::empty()))
    }

    fn id_literal(id: &str) -> Term {
        Literal::string(format!("urn:node:{id}")).into()
    }

    fn sample() -> (IpmTree, NodeKey, NodeKey) {
        let (mut tree, root) = IpmTree::with_root(node("root")).unwrap();
        let a = tree.insert(node("a")).unwrap();
        let b = tree.insert(node("b")).unwrap();
        tree.attach(root, a).unwrap();
        tree.attach(a, b).unwrap();
        (tree, root, b)
    }

    #[test]
    fn one_resource_per_node() {
        let (tree, _, _) = sample();
        let graph = service().encode(&tree).unwrap();
        let has_id = Iri::from_static(vocab::HAS_ID);
        for id in ["root", "a", "b"] {
            assert_eq!(graph.subjects(&has_id, &id_literal(id)).len(), 1, "{id}");
        }
        let roots = graph.subjects(
            &Iri::from_static(vocab::IS_ROOT),
            &Literal::boolean(true).into(),
        );
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn encoding_from_a_leaf_reaches_the_whole_tree() {
        let (tree, _, leaf) = sample();
        let from_root = service().encode(&tree).unwrap();
        let from_leaf = service().encode_from(&tree, leaf).unwrap();
        assert_eq!(from_root.len(), from_leaf.len());

        let has_id = Iri::from_static(vocab::HAS_ID);
        for id in ["root", "a", "b"] {
            assert_eq!(from_leaf.subjects(&has_id, &id_literal(id)).len(), 1);
        }
    }

    #[test]
    fn empty_tree_has_no_root() {
        assert_eq!(service().encode(&IpmTree::new()), Err(TransformError::NoRoot));
    }

    #[test]
    fn file_info_requires_no_optional_fields() {
        let (mut tree, _) =
            IpmTree::with_root(node("root").with_file_info(FileInfo::directory("top").unwrap()))
                .unwrap();
        tree.set_ignored(tree.root().unwrap(), true, false).unwrap();
        let graph = service().encode(&tree).unwrap();
        // root: type, id, isRoot, isIgnored, hasFileInfo.
        // file info: type, name, isByteStream, isDirectory.
        assert_eq!(graph.len(), 9);
    }
}
