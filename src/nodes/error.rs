//! Error types for node type resolution and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`NodeLoader`](super::NodeLoader) backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Class '{class_name}' not found in {}", source_path.display())]
    ClassNotFound {
        class_name: String,
        source_path: PathBuf,
    },

    #[error("Failed to read {}: {message}", source_path.display())]
    Io {
        source_path: PathBuf,
        message: String,
    },

    #[error("Malformed node module {}: {message}", source_path.display())]
    Malformed {
        source_path: PathBuf,
        message: String,
    },

    #[error("Loading class '{class_name}' timed out after {timeout_ms}ms")]
    Timeout { class_name: String, timeout_ms: u64 },

    #[error("Loading class '{0}' panicked")]
    Panicked(String),
}

impl LoadError {
    pub fn is_class_not_found(&self) -> bool {
        matches!(self, Self::ClassNotFound { .. })
    }
}

/// Errors surfaced by the node type registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeTypesError {
    #[error("Unrecognized node type: {0}")]
    UnknownType(String),

    #[error("Node cannot be used as a tool: {0}")]
    NotUsableAsTool(String),

    #[error("Version {version} of node type '{node_type}' not found")]
    VersionNotFound { node_type: String, version: u32 },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl NodeTypesError {
    /// Check if this is an unknown type error.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}

/// Result type for registry operations.
pub type NodeTypesResult<T> = Result<T, NodeTypesError>;
