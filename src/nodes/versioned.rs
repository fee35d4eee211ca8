//! Multi-version node container.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::description::NodeTypeBaseDescription;
use super::node_type::NodeType;

/// Container holding several versions of one node under a single name.
#[derive(Debug, Clone)]
pub struct VersionedNodeType {
    base: NodeTypeBaseDescription,
    node_versions: BTreeMap<u32, Arc<NodeType>>,
}

impl VersionedNodeType {
    /// Build a container. Returns `None` when the base description's default
    /// version is not among `versions`, or when `versions` is empty.
    pub fn new(
        base: NodeTypeBaseDescription,
        versions: impl IntoIterator<Item = (u32, NodeType)>,
    ) -> Option<Self> {
        let node_versions: BTreeMap<u32, Arc<NodeType>> = versions
            .into_iter()
            .map(|(version, node)| (version, Arc::new(node)))
            .collect();

        if !node_versions.contains_key(&base.default_version) {
            return None;
        }

        Some(Self {
            base,
            node_versions,
        })
    }

    pub fn base_description(&self) -> &NodeTypeBaseDescription {
        &self.base
    }

    pub fn default_version(&self) -> u32 {
        self.base.default_version
    }

    /// Exact-match lookup.
    pub fn get(&self, version: u32) -> Option<&Arc<NodeType>> {
        self.node_versions.get(&version)
    }

    /// All version numbers, ascending.
    pub fn version_numbers(&self) -> Vec<u32> {
        self.node_versions.keys().copied().collect()
    }

    pub(crate) fn versions_mut(&mut self) -> impl Iterator<Item = &mut Arc<NodeType>> {
        self.node_versions.values_mut()
    }

    pub(crate) fn versions(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        self.node_versions.values()
    }
}
