//! Concrete node implementations and the single-or-versioned wrapper.

use std::path::PathBuf;
use std::sync::Arc;

use super::description::NodeTypeDescription;
use super::error::{NodeTypesError, NodeTypesResult};
use super::versioned::VersionedNodeType;

/// A concrete, resolved node implementation.
///
/// Derived implementations (tool variants) keep a link to the node they were
/// derived from; their description is an independent copy.
#[derive(Debug, Clone)]
pub struct NodeType {
    description: NodeTypeDescription,
    derived_from: Option<Arc<NodeType>>,
}

impl NodeType {
    pub fn new(description: NodeTypeDescription) -> Self {
        Self {
            description,
            derived_from: None,
        }
    }

    /// Layer a new implementation with its own description over `base`.
    pub fn derived(base: Arc<NodeType>, description: NodeTypeDescription) -> Self {
        Self {
            description,
            derived_from: Some(base),
        }
    }

    pub fn description(&self) -> &NodeTypeDescription {
        &self.description
    }

    pub fn description_mut(&mut self) -> &mut NodeTypeDescription {
        &mut self.description
    }

    /// The implementation this one was derived from, if any.
    pub fn base(&self) -> Option<&Arc<NodeType>> {
        self.derived_from.as_ref()
    }

    pub fn is_derived(&self) -> bool {
        self.derived_from.is_some()
    }
}

/// Either a single implementation or a container of versioned ones.
#[derive(Debug, Clone)]
pub enum AnyNodeType {
    Single(Arc<NodeType>),
    Versioned(Arc<VersionedNodeType>),
}

impl AnyNodeType {
    pub fn single(description: NodeTypeDescription) -> Self {
        Self::Single(Arc::new(NodeType::new(description)))
    }

    /// Name under which the implementation describes itself.
    pub fn name(&self) -> &str {
        match self {
            Self::Single(node) => &node.description().name,
            Self::Versioned(versioned) => &versioned.base_description().name,
        }
    }

    pub fn is_versioned(&self) -> bool {
        matches!(self, Self::Versioned(_))
    }

    /// Select the concrete implementation for `version`.
    ///
    /// Single implementations ignore the version. Containers return their
    /// default version when none is given, and an exact match otherwise.
    pub fn resolve_version(&self, version: Option<u32>) -> NodeTypesResult<Arc<NodeType>> {
        match self {
            Self::Single(node) => Ok(Arc::clone(node)),
            Self::Versioned(versioned) => {
                let wanted = version.unwrap_or_else(|| versioned.default_version());
                versioned
                    .get(wanted)
                    .cloned()
                    .ok_or_else(|| NodeTypesError::VersionNotFound {
                        node_type: versioned.base_description().name.clone(),
                        version: wanted,
                    })
            }
        }
    }

    /// Whether both values point at the same cached instance.
    pub fn same_instance(&self, other: &AnyNodeType) -> bool {
        match (self, other) {
            (Self::Single(a), Self::Single(b)) => Arc::ptr_eq(a, b),
            (Self::Versioned(a), Self::Versioned(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<NodeType> for AnyNodeType {
    fn from(node: NodeType) -> Self {
        Self::Single(Arc::new(node))
    }
}

impl From<VersionedNodeType> for AnyNodeType {
    fn from(versioned: VersionedNodeType) -> Self {
        Self::Versioned(Arc::new(versioned))
    }
}

/// A cached implementation together with the file it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedClass {
    pub source_path: PathBuf,
    pub node_type: AnyNodeType,
}

impl LoadedClass {
    pub fn new(source_path: impl Into<PathBuf>, node_type: AnyNodeType) -> Self {
        Self {
            source_path: source_path.into(),
            node_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::description::{NodeTypeBaseDescription, NodeVersion};

    fn description(name: &str, version: u32) -> NodeTypeDescription {
        NodeTypeDescription {
            name: name.to_string(),
            display_name: name.to_string(),
            group: vec![],
            description: String::new(),
            version: NodeVersion::Single(version),
            default_version: None,
            icon: None,
            inputs: vec![],
            outputs: vec![],
            properties: vec![],
            credentials: None,
            polling: false,
            usable_as_tool: false,
            codex: None,
        }
    }

    fn container(default_version: u32) -> AnyNodeType {
        let base = NodeTypeBaseDescription {
            name: "webhook".to_string(),
            display_name: "Webhook".to_string(),
            description: String::new(),
            group: vec![],
            icon: None,
            default_version,
        };
        let versioned = VersionedNodeType::new(
            base,
            vec![
                (1, NodeType::new(description("webhook", 1))),
                (2, NodeType::new(description("webhook", 2))),
            ],
        )
        .unwrap();
        AnyNodeType::from(versioned)
    }

    #[test]
    fn test_single_ignores_version() {
        let single = AnyNodeType::single(description("noOp", 1));
        let a = single.resolve_version(None).unwrap();
        let b = single.resolve_version(Some(42)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_default_version_matches_explicit() {
        let node = container(2);
        let implicit = node.resolve_version(None).unwrap();
        let explicit = node.resolve_version(Some(2)).unwrap();
        assert!(Arc::ptr_eq(&implicit, &explicit));
        assert_eq!(implicit.description().version, NodeVersion::Single(2));
    }

    #[test]
    fn test_missing_version_has_no_fallback() {
        let node = container(2);
        let err = node.resolve_version(Some(3)).unwrap_err();
        assert_eq!(
            err,
            NodeTypesError::VersionNotFound {
                node_type: "webhook".to_string(),
                version: 3,
            }
        );
    }

    #[test]
    fn test_derived_keeps_base_link() {
        let base = Arc::new(NodeType::new(description("slack", 1)));
        let derived = NodeType::derived(Arc::clone(&base), description("slackTool", 1));
        assert!(derived.is_derived());
        assert!(Arc::ptr_eq(derived.base().unwrap(), &base));
        assert_eq!(base.description().name, "slack");
    }
}
