//! `NodeTypes` - resolves node type names to loaded implementations.
//!
//! Lookup goes through the loaded-type cache first and falls back to the
//! known-type index, loading the class through the configured
//! [`NodeLoader`]. Entries are immutable once cached; a tool variant is a
//! separate cache entry under `<name>Tool`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::KnownNodes;
use super::description::{NeededNodeType, NodeTypeDescription, BASE_NAMESPACE};
use super::error::{NodeTypesError, NodeTypesResult};
use super::loader::NodeLoader;
use super::node_type::{AnyNodeType, LoadedClass, NodeType};
use super::special_parameters;
use super::tool::{self, TOOL_SUFFIX};
use super::translation;

/// A description copy together with the node's source path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionWithSource {
    pub description: NodeTypeDescription,
    pub source_path: PathBuf,
}

/// Node type registry.
pub struct NodeTypes {
    known: KnownNodes,
    loaded: DashMap<String, LoadedClass>,
    loader: Arc<dyn NodeLoader>,
    tool_namespaces: Vec<String>,
}

impl NodeTypes {
    pub fn new(known: KnownNodes, loader: Arc<dyn NodeLoader>) -> Self {
        Self {
            known,
            loaded: DashMap::new(),
            loader,
            tool_namespaces: vec![BASE_NAMESPACE.to_string()],
        }
    }

    /// Namespaces whose `...Tool` names are treated as tool requests.
    pub fn with_tool_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.tool_namespaces = namespaces;
        self
    }

    /// The raw implementation (possibly a versioned container) for `node_type`.
    pub fn get_by_name(&self, node_type: &str) -> NodeTypesResult<AnyNodeType> {
        Ok(self.get_node(node_type)?.node_type)
    }

    /// The concrete implementation of `node_type` at `version`.
    ///
    /// A `<name>Tool` request in a tool namespace resolves `<name>`, checks
    /// that it is usable as a tool and returns its cached tool variant,
    /// deriving it on first use.
    pub fn get_by_name_and_version(
        &self,
        node_type: &str,
        version: Option<u32>,
    ) -> NodeTypesResult<Arc<NodeType>> {
        let Some(base_name) = self.tool_base_name(node_type) else {
            return self.get_node(node_type)?.node_type.resolve_version(version);
        };

        let loaded = self.get_node(base_name)?;
        let base = loaded.node_type.resolve_version(version)?;
        if !base.description().usable_as_tool {
            return Err(NodeTypesError::NotUsableAsTool(base_name.to_string()));
        }

        if let Some(cached) = self.cached_single(node_type) {
            return Ok(cached);
        }

        let variant = AnyNodeType::from(tool::convert_node_to_ai_tool(&base));
        let stored = self
            .loaded
            .entry(node_type.to_string())
            .or_insert_with(|| {
                debug!(node_type, base = base_name, "Derived tool variant");
                LoadedClass::new(loaded.source_path, variant)
            })
            .node_type
            .clone();

        match stored {
            AnyNodeType::Single(node) => Ok(node),
            versioned @ AnyNodeType::Versioned(_) => versioned.resolve_version(version),
        }
    }

    /// Description copy and source path of `node_type` at `version`.
    pub fn get_with_source_path(
        &self,
        node_type: &str,
        version: Option<u32>,
    ) -> NodeTypesResult<DescriptionWithSource> {
        let loaded = self.get_node(node_type)?;
        let node = loaded.node_type.resolve_version(version)?;
        Ok(DescriptionWithSource {
            description: node.description().clone(),
            source_path: loaded.source_path,
        })
    }

    /// Descriptions for a batch of node types, with namespaced names.
    ///
    /// Fails as a whole on the first request that cannot be resolved.
    pub fn get_node_type_descriptions(
        &self,
        node_types: &[NeededNodeType],
    ) -> NodeTypesResult<Vec<NodeTypeDescription>> {
        node_types
            .iter()
            .map(|needed| {
                let loaded = self.get_node(&needed.name)?;
                let node = loaded.node_type.resolve_version(Some(needed.version))?;
                Ok(node.description().with_namespaced_name())
            })
            .collect()
    }

    /// Every node type that can be resolved without a prior load.
    pub fn known_types(&self) -> &KnownNodes {
        &self.known
    }

    /// Where the translation bundle of a node lives, see
    /// [`translation::node_translation_path`].
    pub async fn node_translation_path(
        &self,
        node_source_path: &Path,
        long_node_type: &str,
        locale: &str,
    ) -> io::Result<PathBuf> {
        translation::node_translation_path(node_source_path, long_node_type, locale).await
    }

    /// Whether `node_type` currently has a cache entry.
    pub fn is_loaded(&self, node_type: &str) -> bool {
        self.loaded.contains_key(node_type)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Hand a pre-instantiated entry to the cache.
    ///
    /// Meant for loading passes that run before [`Self::apply_special_node_parameters`].
    /// An existing entry under the same name wins.
    pub fn register_loaded(&self, node_type: impl Into<String>, loaded: LoadedClass) {
        self.loaded.entry(node_type.into()).or_insert(loaded);
    }

    /// Resolve every known type, stopping at the first failure.
    pub fn load_all(&self) -> NodeTypesResult<usize> {
        for name in self.known.names() {
            self.get_node(name)?;
        }
        info!(count = self.loaded.len(), "Loaded node types");
        Ok(self.loaded.len())
    }

    /// Normalize every cached entry once a loading pass is complete.
    ///
    /// Entries that are already normalized are left as they are.
    pub fn apply_special_node_parameters(&self) -> usize {
        let mut changed = 0;
        for mut entry in self.loaded.iter_mut() {
            if special_parameters::normalize(&mut entry.value_mut().node_type) {
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, "Applied special node parameters");
        }
        changed
    }

    fn tool_base_name<'a>(&self, node_type: &'a str) -> Option<&'a str> {
        let base = node_type.strip_suffix(TOOL_SUFFIX)?;
        self.tool_namespaces
            .iter()
            .any(|ns| node_type.starts_with(ns.as_str()))
            .then_some(base)
    }

    fn cached_single(&self, node_type: &str) -> Option<Arc<NodeType>> {
        match self.loaded.get(node_type).map(|e| e.node_type.clone()) {
            Some(AnyNodeType::Single(node)) => Some(node),
            _ => None,
        }
    }

    fn get_node(&self, node_type: &str) -> NodeTypesResult<LoadedClass> {
        if let Some(loaded) = self.loaded.get(node_type).map(|e| e.value().clone()) {
            return Ok(loaded);
        }

        let Some(known) = self.known.get(node_type) else {
            return Err(NodeTypesError::UnknownType(node_type.to_string()));
        };

        debug!(
            node_type,
            class_name = %known.class_name,
            source_path = %known.source_path.display(),
            "Loading node type"
        );

        let mut node = self
            .loader
            .load(&known.source_path, &known.class_name)
            .map_err(|e| {
                warn!(node_type, error = %e, "Failed to load node type");
                NodeTypesError::from(e)
            })?;
        special_parameters::normalize(&mut node);

        // A concurrent first access may have stored an entry meanwhile; keep that one.
        let stored = self
            .loaded
            .entry(node_type.to_string())
            .or_insert_with(|| LoadedClass::new(known.source_path.clone(), node))
            .value()
            .clone();
        Ok(stored)
    }
}
