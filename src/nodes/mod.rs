//! Node type registry.
//!
//! Maps node type names (`n8n-nodes-base.webhook`) to loaded node
//! implementations, including:
//! - Lazy, exactly-once loading through a pluggable [`NodeLoader`]
//! - Version resolution for versioned node containers
//! - AI tool variants (`...Tool`) derived from tool-capable nodes
//! - Translation file lookup next to the node sources

pub mod builtin;
pub mod catalog;
pub mod description;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod node_type;
pub mod registry;
pub mod special_parameters;
pub mod tool;
pub mod translation;
pub mod versioned;

pub use builtin::BuiltinLoader;
pub use catalog::{KnownNode, KnownNodes};
pub use description::{
    NeededNodeType, NodeConnectionConfig, NodeProperty, NodePropertyType, NodeTypeBaseDescription,
    NodeTypeDescription, NodeVersion,
};
pub use error::{LoadError, NodeTypesError, NodeTypesResult};
pub use loader::{IsolatedLoader, LoaderChain, NodeLoader};
pub use manifest::ManifestLoader;
pub use node_type::{AnyNodeType, LoadedClass, NodeType};
pub use registry::{DescriptionWithSource, NodeTypes};
pub use versioned::VersionedNodeType;
