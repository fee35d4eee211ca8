//! Known-type index: node types discovered on disk but not yet loaded.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use super::manifest::{NodeManifest, MANIFEST_SUFFIX};

/// Where a known node type lives and which class implements it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownNode {
    pub class_name: String,
    pub source_path: PathBuf,
}

impl KnownNode {
    pub fn new(class_name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            class_name: class_name.into(),
            source_path: source_path.into(),
        }
    }
}

/// Ordered map from type name to [`KnownNode`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct KnownNodes {
    nodes: BTreeMap<String, KnownNode>,
}

impl KnownNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, node: KnownNode) {
        self.nodes.insert(name.into(), node);
    }

    /// Add every entry of `other`, replacing entries with the same name.
    pub fn extend(&mut self, other: KnownNodes) {
        self.nodes.extend(other.nodes);
    }

    pub fn get(&self, name: &str) -> Option<&KnownNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &KnownNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index every `*.node.json` manifest below `dir` as `<package>.<node name>`.
    ///
    /// Manifests that cannot be read or parsed are skipped with a warning.
    /// A missing `dir` yields an empty index.
    pub fn scan_dir(dir: &Path, package: &str) -> io::Result<Self> {
        let mut known = Self::new();
        if !dir.exists() {
            debug!(dir = %dir.display(), "Node directory does not exist, nothing to scan");
            return Ok(known);
        }

        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !is_manifest(&path) {
                    continue;
                }

                match NodeManifest::read(&path) {
                    Ok(manifest) => {
                        let Some(name) = manifest.node_name() else {
                            warn!(path = %path.display(), "Node manifest has no description, skipping");
                            continue;
                        };
                        let type_name = format!("{}.{}", package, name);
                        debug!(node_type = %type_name, class_name = %manifest.class_name, "Discovered node");
                        known.insert(type_name, KnownNode::new(manifest.class_name.clone(), path));
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable node manifest"),
                }
            }
        }

        Ok(known)
    }
}

fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(MANIFEST_SUFFIX))
}
