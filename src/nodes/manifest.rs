//! JSON node manifests on disk.
//!
//! A manifest (`<Name>.node.json`) declares one node class, either with a
//! single description or with one description per version:
//!
//! ```json
//! { "className": "Slack", "description": { "name": "slack", ... } }
//! { "className": "Slack", "baseDescription": { "name": "slack", "defaultVersion": 2, ... },
//!   "nodeVersions": { "1": { ... }, "2": { ... } } }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::description::{NodeTypeBaseDescription, NodeTypeDescription};
use super::error::LoadError;
use super::loader::NodeLoader;
use super::node_type::{AnyNodeType, NodeType};
use super::versioned::VersionedNodeType;

/// File suffix identifying node manifests.
pub const MANIFEST_SUFFIX: &str = ".node.json";

/// Parsed contents of a manifest file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeManifest {
    pub class_name: String,
    #[serde(default)]
    pub description: Option<NodeTypeDescription>,
    #[serde(default)]
    pub base_description: Option<NodeTypeBaseDescription>,
    #[serde(default)]
    pub node_versions: BTreeMap<u32, NodeTypeDescription>,
}

impl NodeManifest {
    /// Read and parse the manifest at `path`.
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path).map_err(|e| LoadError::Io {
            source_path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| LoadError::Malformed {
            source_path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Name the node describes itself with.
    pub fn node_name(&self) -> Option<&str> {
        match (&self.description, &self.base_description) {
            (Some(desc), _) => Some(&desc.name),
            (None, Some(base)) => Some(&base.name),
            (None, None) => None,
        }
    }

    /// Turn the manifest into an implementation.
    pub fn into_node_type(self, path: &Path) -> Result<AnyNodeType, LoadError> {
        let malformed = |message: &str| LoadError::Malformed {
            source_path: path.to_path_buf(),
            message: message.to_string(),
        };

        match (self.description, self.base_description) {
            (Some(desc), None) if self.node_versions.is_empty() => Ok(AnyNodeType::single(desc)),
            (None, Some(base)) => {
                let versions = self
                    .node_versions
                    .into_iter()
                    .map(|(version, desc)| (version, NodeType::new(desc)));
                VersionedNodeType::new(base, versions)
                    .map(AnyNodeType::from)
                    .ok_or_else(|| malformed("nodeVersions must include the default version"))
            }
            (None, None) => Err(malformed("manifest declares no description")),
            _ => Err(malformed(
                "manifest mixes a single description with versioned descriptions",
            )),
        }
    }
}

/// Loads node classes from JSON manifests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestLoader;

impl NodeLoader for ManifestLoader {
    fn load(&self, source_path: &Path, class_name: &str) -> Result<AnyNodeType, LoadError> {
        let manifest = NodeManifest::read(source_path)?;
        if manifest.class_name != class_name {
            return Err(LoadError::ClassNotFound {
                class_name: class_name.to_string(),
                source_path: source_path.to_path_buf(),
            });
        }
        manifest.into_node_type(source_path)
    }
}
