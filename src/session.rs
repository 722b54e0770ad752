//! session
//!
//! One working package: loaded profiles, the content tree and the domain
//! objects bound to it.
//!
//! A session is not internally synchronized. It is `Send`, so a caller can
//! hand it to a worker, but concurrent use needs outside locking.
//!
//! # Persistence
//!
//! [`Session::save`] writes the tree and the object graph as two N-Triples
//! documents plus the list of profiles they were built against. Restoring
//! decodes both into a fresh tree and store and never touches an existing
//! session unless everything decoded.

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::config::Config;
use crate::core::profile::{parse_profile, ProfileRegistry};
use crate::core::tree::{IpmTree, NodeKey};
use crate::core::types::{Iri, PropertyTypeId};
use crate::core::verify::fast_verify;
use crate::ipm::IpmRdfTransform;
use crate::rdf::ntriples;
use crate::store::{DomainProfileObjectStore, ObjectStore};
use crate::transform::{
    inherit_metadata, CommitReport, InheritReport, TransformEngine, TransformPlan,
};

/// Saved form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Profiles the tree and objects were built against.
    pub profiles: Vec<Iri>,
    /// Tree graph, N-Triples. Empty for an empty tree.
    pub tree: String,
    /// Object graph, N-Triples.
    pub objects: String,
}

#[derive(Debug)]
pub struct Session {
    registry: Arc<ProfileRegistry>,
    tree: IpmTree,
    store: ObjectStore,
    service: IpmRdfTransform,
    engine: TransformEngine,
}

impl Session {
    /// An empty session over `registry`, minting `urn:uuid:` identifiers.
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self {
            tree: IpmTree::new(),
            store: ObjectStore::new(Arc::clone(&registry)),
            service: IpmRdfTransform::new(Arc::clone(&registry)),
            engine: TransformEngine::default(),
            registry,
        }
    }

    /// Load every configured profile document and apply the configured
    /// identifier bases and decode options.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut profiles = Vec::new();
        for path in config.profile_paths() {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read profile {}", path.display()))?;
            let profile = parse_profile(&json)
                .with_context(|| format!("Invalid profile {}", path.display()))?;
            trace!(profile = %profile.id, path = %path.display(), "loaded profile");
            profiles.push(profile);
        }
        let registry =
            ProfileRegistry::new(profiles).context("Failed to combine domain profiles")?;

        let session = Self::new(Arc::new(registry))
            .with_id_bases(config.object_base(), config.node_base())
            .with_shared_children(config.allow_shared_children());
        debug!(
            profiles = session.registry.profile_ids().len(),
            "session configured"
        );
        Ok(session)
    }

    /// Set the prefixes for minted object and synthetic node identifiers.
    pub fn with_id_bases(mut self, object_base: impl Into<String>, node_base: impl Into<String>) -> Self {
        let empty = ObjectStore::new(Arc::clone(&self.registry));
        let graph = std::mem::replace(&mut self.store, empty).into_graph();
        self.store = ObjectStore::from_graph(Arc::clone(&self.registry), graph, object_base);
        self.engine = TransformEngine::new(node_base);
        self
    }

    pub fn with_shared_children(mut self, allow: bool) -> Self {
        self.service = self.service.with_shared_children(allow);
        self
    }

    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        &self.registry
    }

    pub fn tree(&self) -> &IpmTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut IpmTree {
        &mut self.tree
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    pub fn service(&self) -> &IpmRdfTransform {
        &self.service
    }

    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    /// Replace the tree, for example with fresh scanner output.
    pub fn set_tree(&mut self, tree: IpmTree) {
        self.tree = tree;
    }

    /// Create or repair the domain object of every node that is not
    /// ignored, parents first. Returns how many nodes were processed.
    pub fn bind_all(&mut self) -> Result<usize> {
        let order = self.tree.depth_first(false);
        for &key in &order {
            self.store
                .update_object(&mut self.tree, key)
                .with_context(|| format!("Failed to bind node {}", self.node_label(key)))?;
        }
        debug!(nodes = order.len(), "bound tree");
        Ok(order.len())
    }

    pub fn plan_transform(&self, nodes: &[NodeKey], transform: &Iri) -> Result<TransformPlan> {
        self.engine
            .plan(&self.store, &self.tree, nodes, transform)
            .with_context(|| format!("Failed to plan transform {transform}"))
    }

    pub fn commit_transform(&mut self, plan: &TransformPlan) -> Result<CommitReport> {
        self.engine
            .commit(&mut self.store, &mut self.tree, plan)
            .with_context(|| format!("Failed to commit transform {}", plan.transform))
    }

    pub fn inherit(
        &mut self,
        key: NodeKey,
        inheritable: &std::collections::BTreeSet<PropertyTypeId>,
    ) -> Result<InheritReport> {
        inherit_metadata(&mut self.store, &self.tree, key, inheritable)
            .with_context(|| format!("Failed to inherit metadata from {}", self.node_label(key)))
    }

    /// Serialize the tree and object graph.
    pub fn save(&self) -> Result<SessionSnapshot> {
        let tree = if self.tree.is_empty() {
            String::new()
        } else {
            let graph = self
                .service
                .encode(&self.tree)
                .context("Failed to encode content tree")?;
            ntriples::write(&graph)
        };
        Ok(SessionSnapshot {
            profiles: self.registry.profile_ids().to_vec(),
            tree,
            objects: ntriples::write(self.store.graph()),
        })
    }

    /// Rebuild a session from a snapshot.
    ///
    /// Every profile the snapshot names must be loaded in `registry`.
    pub fn restore(registry: Arc<ProfileRegistry>, snapshot: &SessionSnapshot) -> Result<Self> {
        let mut session = Self::new(registry);
        session.reload(snapshot)?;
        Ok(session)
    }

    /// Replace this session's tree and objects with a snapshot's.
    ///
    /// On error the session is left as it was.
    pub fn reload(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let loaded = self.registry.profile_ids();
        for profile in &snapshot.profiles {
            if !loaded.contains(profile) {
                bail!("Snapshot needs profile {profile}, which is not loaded");
            }
        }

        let tree = if snapshot.tree.trim().is_empty() {
            IpmTree::new()
        } else {
            let graph = ntriples::parse(&snapshot.tree).context("Malformed tree graph")?;
            self.service
                .decode(&graph)
                .context("Failed to decode content tree")?
        };
        if !tree.is_empty() {
            let verified = fast_verify(&tree);
            if !verified.ok {
                bail!("Restored tree is inconsistent: {:?}", verified.errors);
            }
        }

        let graph = ntriples::parse(&snapshot.objects).context("Malformed object graph")?;
        let object_base = self.store.object_base().to_string();
        let store = ObjectStore::from_graph(Arc::clone(&self.registry), graph, object_base);

        for key in tree.keys() {
            let Some(object) = tree.get(key).and_then(|n| n.domain_object()) else {
                continue;
            };
            if !store.contains_object(object) {
                warn!(object = %object, "restored node is bound to a missing object");
            }
        }

        self.tree = tree;
        self.store = store;
        debug!(nodes = self.tree.len(), objects = self.store.objects().len(), "restored session");
        Ok(())
    }

    fn node_label(&self, key: NodeKey) -> String {
        self.tree
            .get(key)
            .map(|n| n.id().to_string())
            .unwrap_or_else(|| "<missing>".to_string())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(ProfileRegistry::empty()))
    }
}
