//! ipm::decode
//!
//! Graph to tree.
//!
//! # Algorithm
//!
//! 1. Find the single resource with `isRoot true`
//! 2. Read every `hasChild` list once and index which resources list which
//!    children. A resource listed under several parents is placed under
//!    the parent its own `hasParent` names; the other listings are skipped
//! 3. Rebuild nodes depth-first from the root in list order
//! 4. Reject any skipped listing whose declared parent was never reached
//!
//! Type identifiers are resolved against the registry, so a graph only
//! decodes under the profiles it was written with.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::{IpmRdfTransform, TransformError};
use crate::core::file_info::{from_epoch_millis, ChecksumAlgorithm, FileInfo, FileInfoError};
use crate::core::tree::{IpmTree, Node, NodeKey, TreeError};
use crate::core::types::{Iri, NodeId, NodeTypeId, ObjectId};
use crate::rdf::{Graph, Literal, Resource, Term};

impl IpmRdfTransform {
    /// Rebuild a tree from its graph encoding.
    ///
    /// # Errors
    ///
    /// Any malformed structure fails the whole call; see [`TransformError`].
    pub fn decode(&self, graph: &Graph) -> Result<IpmTree, TransformError> {
        let root = self.find_root(graph)?;
        let placement = self.place_children(graph)?;

        let mut decoder = Decoder {
            service: self,
            graph,
            placement,
            tree: IpmTree::new(),
            visited: HashSet::new(),
            deferred: Vec::new(),
        };
        decoder.run(root)?;

        debug!(nodes = decoder.tree.len(), "decoded tree");
        Ok(decoder.tree)
    }

    fn find_root(&self, graph: &Graph) -> Result<Resource, TransformError> {
        let is_root = &self.vocab.is_root;
        let mut roots = Vec::new();
        for subject in graph.all_subjects() {
            if let Some(flag) = optional_bool(graph, subject, is_root)? {
                if flag {
                    roots.push(subject.clone());
                }
            }
        }

        let root = match roots.len() {
            0 => return Err(TransformError::NoRoot),
            1 => roots.remove(0),
            n => return Err(TransformError::MultipleRoots(n)),
        };
        if graph.objects(&root, &self.vocab.has_parent).next().is_some() {
            return Err(TransformError::RootHasParent(root));
        }
        Ok(root)
    }

    /// Decide, for every listed child, which listing parent gets it.
    fn place_children(&self, graph: &Graph) -> Result<HashMap<Resource, Resource>, TransformError> {
        let has_child = &self.vocab.has_child;
        let mut listings: HashMap<Resource, Vec<Resource>> = HashMap::new();

        for parent in graph.all_subjects() {
            for child in children_of(graph, parent, has_child)? {
                let parents = listings.entry(child.clone()).or_default();
                if parents.contains(parent) {
                    return Err(TransformError::DuplicateChild {
                        parent: parent.clone(),
                        child,
                    });
                }
                parents.push(parent.clone());
            }
        }

        let mut placement = HashMap::with_capacity(listings.len());
        for (child, parents) in listings {
            let chosen = if parents.len() == 1 {
                let listed_by = parents[0].clone();
                if let Some(declared) = single_resource(graph, &child, &self.vocab.has_parent)? {
                    if declared != listed_by {
                        return Err(TransformError::ParentMismatch {
                            child,
                            parent: declared,
                        });
                    }
                }
                listed_by
            } else {
                if !self.allow_shared_children {
                    return Err(TransformError::SharedChild(child));
                }
                let declared =
                    single_resource(graph, &child, &self.vocab.has_parent)?
                        .ok_or_else(|| TransformError::UnresolvedParent(child.clone()))?;
                if !parents.contains(&declared) {
                    return Err(TransformError::ParentMismatch {
                        child,
                        parent: declared,
                    });
                }
                trace!(child = %child, listings = parents.len(), "deferring shared child to declared parent");
                declared
            };
            placement.insert(child, chosen);
        }
        Ok(placement)
    }
}

struct Decoder<'a> {
    service: &'a IpmRdfTransform,
    graph: &'a Graph,
    placement: HashMap<Resource, Resource>,
    tree: IpmTree,
    visited: HashSet<Resource>,
    /// Listings skipped because the child is placed elsewhere, in visit order.
    deferred: Vec<(Resource, Resource)>,
}

impl Decoder<'_> {
    /// Build depth-first from `root` with an explicit stack, so graph depth
    /// is not bounded by the call stack.
    fn run(&mut self, root: Resource) -> Result<(), TransformError> {
        let mut pending = vec![(root, None)];
        while let Some((resource, parent)) = pending.pop() {
            let (key, children) = self.build(&resource, parent)?;
            pending.extend(children.into_iter().rev().map(|child| (child, Some(key))));
        }

        // A skipped listing is only safe if the declared parent was reached.
        for (child, parent) in &self.deferred {
            if !self.visited.contains(child) {
                return Err(TransformError::UnreachableParent {
                    child: child.clone(),
                    parent: parent.clone(),
                });
            }
        }
        Ok(())
    }

    /// Insert one node and return the children placed under it, in list order.
    fn build(
        &mut self,
        resource: &Resource,
        parent: Option<NodeKey>,
    ) -> Result<(NodeKey, Vec<Resource>), TransformError> {
        let (service, graph) = (self.service, self.graph);
        let v = &service.vocab;

        if !self.visited.insert(resource.clone()) {
            return Err(TransformError::Cycle(resource.clone()));
        }

        let id: NodeId = single_literal(graph, resource, &v.has_id)?
            .ok_or_else(|| TransformError::MissingId(resource.clone()))
            .and_then(|l| parse_id(resource, &v.has_id, l))?;

        let mut node = Node::new(id.clone());
        if let Some(lit) = single_literal(graph, resource, &v.has_node_type)? {
            let node_type = parse_id(resource, &v.has_node_type, lit)?;
            node.set_node_type(Some(self.resolve(&id, node_type)?));
        }
        for lit in literals(graph, resource, &v.has_sub_type)? {
            let sub_type = parse_id(resource, &v.has_sub_type, lit)?;
            node.add_sub_type(self.resolve(&id, sub_type)?);
        }
        if let Some(lit) = single_literal(graph, resource, &v.has_domain_object)? {
            node.set_domain_object(Some(parse_id::<ObjectId>(resource, &v.has_domain_object, lit)?));
        }
        if let Some(info) = single_resource(graph, resource, &v.has_file_info)? {
            node.set_file_info(Some(self.file_info(&id, &info)?));
        }
        let ignored = optional_bool(graph, resource, &v.is_ignored)?.unwrap_or(false);

        let key = self.tree.insert(node).map_err(|e| match e {
            TreeError::DuplicateId(id) => TransformError::DuplicateId(id),
            other => other.into(),
        })?;
        match parent {
            Some(p) => self.tree.attach(p, key)?,
            None => self.tree.set_root(key)?,
        }
        if ignored {
            self.tree.set_ignored(key, true, false)?;
        }

        let mut placed = Vec::new();
        for child in children_of(graph, resource, &v.has_child)? {
            match self.placement.get(&child) {
                Some(chosen) if chosen == resource => placed.push(child),
                Some(chosen) => self.deferred.push((child, chosen.clone())),
                None => {}
            }
        }
        Ok((key, placed))
    }

    fn resolve(&self, node: &NodeId, node_type: NodeTypeId) -> Result<NodeTypeId, TransformError> {
        match self.service.registry.node_type(&node_type) {
            Some(nt) => Ok(nt.id.clone()),
            None => Err(TransformError::UnknownNodeType {
                node: node.clone(),
                node_type,
            }),
        }
    }

    fn file_info(&self, node: &NodeId, r: &Resource) -> Result<FileInfo, TransformError> {
        let (graph, v) = (self.graph, &self.service.vocab);
        let invalid = |source: FileInfoError| TransformError::InvalidFileInfo {
            node: node.clone(),
            source,
        };

        let name = single_literal(graph, r, &v.has_name)?
            .ok_or_else(|| TransformError::MissingValue {
                resource: r.clone(),
                predicate: v.has_name.clone(),
            })?
            .lexical()
            .to_string();
        let directory = optional_bool(graph, r, &v.is_directory)?.unwrap_or(false);
        let mut info = if directory {
            FileInfo::directory(name)
        } else {
            FileInfo::file(name)
        }
        .map_err(invalid)?;

        if let Some(location) = single_literal(graph, r, &v.has_location)? {
            info.set_location(location.lexical()).map_err(invalid)?;
        }
        if let Some(size) = optional_long(graph, r, &v.has_size)? {
            info.set_size(u64::try_from(size).ok());
        }
        for format in literals(graph, r, &v.has_format)? {
            info.add_format(format.lexical());
        }
        for (algorithm, predicate) in [
            (ChecksumAlgorithm::Sha1, &v.has_sha1_checksum),
            (ChecksumAlgorithm::Md5, &v.has_md5_checksum),
        ] {
            if let Some(digest) = single_literal(graph, r, predicate)? {
                info.set_checksum(algorithm, digest.lexical()).map_err(invalid)?;
            }
        }
        if let Some(millis) = optional_long(graph, r, &v.has_created_date)? {
            info.set_created(Some(from_epoch_millis(millis).map_err(invalid)?));
        }
        if let Some(millis) = optional_long(graph, r, &v.has_modified_date)? {
            info.set_modified(Some(from_epoch_millis(millis).map_err(invalid)?));
        }
        Ok(info)
    }
}

/// At most one value of `predicate`.
fn single<'g>(
    graph: &'g Graph,
    resource: &Resource,
    predicate: &'g Iri,
) -> Result<Option<&'g Term>, TransformError> {
    let mut values = graph.objects(resource, predicate);
    let first = values.next();
    if values.next().is_some() {
        return Err(TransformError::MultipleValues {
            resource: resource.clone(),
            predicate: predicate.clone(),
        });
    }
    Ok(first)
}

fn as_literal<'g>(
    resource: &Resource,
    predicate: &Iri,
    term: &'g Term,
) -> Result<&'g Literal, TransformError> {
    term.as_literal()
        .ok_or_else(|| TransformError::ExpectedLiteral {
            resource: resource.clone(),
            predicate: predicate.clone(),
        })
}

fn single_literal<'g>(
    graph: &'g Graph,
    resource: &Resource,
    predicate: &'g Iri,
) -> Result<Option<&'g Literal>, TransformError> {
    single(graph, resource, predicate)?
        .map(|t| as_literal(resource, predicate, t))
        .transpose()
}

fn single_resource(
    graph: &Graph,
    resource: &Resource,
    predicate: &Iri,
) -> Result<Option<Resource>, TransformError> {
    single(graph, resource, predicate)?
        .map(|t| {
            t.as_resource()
                .cloned()
                .ok_or_else(|| TransformError::ExpectedResource {
                    resource: resource.clone(),
                    predicate: predicate.clone(),
                })
        })
        .transpose()
}

fn literals<'g>(
    graph: &'g Graph,
    resource: &Resource,
    predicate: &'g Iri,
) -> Result<Vec<&'g Literal>, TransformError> {
    graph
        .objects(resource, predicate)
        .map(|t| as_literal(resource, predicate, t))
        .collect()
}

fn invalid_literal(resource: &Resource, predicate: &Iri, lit: &Literal) -> TransformError {
    TransformError::InvalidLiteral {
        resource: resource.clone(),
        predicate: predicate.clone(),
        lexical: lit.lexical().to_string(),
    }
}

fn optional_bool(graph: &Graph, resource: &Resource, predicate: &Iri) -> Result<Option<bool>, TransformError> {
    single_literal(graph, resource, predicate)?
        .map(|l| l.as_bool().ok_or_else(|| invalid_literal(resource, predicate, l)))
        .transpose()
}

fn optional_long(graph: &Graph, resource: &Resource, predicate: &Iri) -> Result<Option<i64>, TransformError> {
    single_literal(graph, resource, predicate)?
        .map(|l| l.as_i64().ok_or_else(|| invalid_literal(resource, predicate, l)))
        .transpose()
}

fn parse_id<T: From<Iri>>(resource: &Resource, predicate: &Iri, lit: &Literal) -> Result<T, TransformError> {
    Iri::new(lit.lexical())
        .map(T::from)
        .map_err(|_| invalid_literal(resource, predicate, lit))
}

/// The resources in `parent`'s children list, in list order.
fn children_of(graph: &Graph, parent: &Resource, has_child: &Iri) -> Result<Vec<Resource>, TransformError> {
    let Some(head) = single_resource(graph, parent, has_child)? else {
        return Ok(Vec::new());
    };
    graph
        .read_list(&head)?
        .into_iter()
        .map(|item| match item {
            Term::Resource(r) => Ok(r),
            Term::Literal(_) => Err(TransformError::ExpectedResource {
                resource: parent.clone(),
                predicate: has_child.clone(),
            }),
        })
        .collect()
}
