//! Node type descriptions - declarative metadata about node capabilities.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Namespace of the nodes shipped with n8n.
pub const BASE_NAMESPACE: &str = "n8n-nodes-base";

/// Connection type used by nodes that can be attached to an AI agent.
pub const AI_TOOL_CONNECTION: &str = "ai_tool";

/// Node type connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConnectionConfig {
    /// Connection type name.
    #[serde(rename = "type")]
    pub connection_type: String,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether this connection is required.
    #[serde(default)]
    pub required: bool,
    /// Maximum number of connections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<usize>,
}

impl NodeConnectionConfig {
    /// A plain connection of the given type.
    pub fn of_type(connection_type: impl Into<String>) -> Self {
        Self {
            connection_type: connection_type.into(),
            display_name: None,
            required: false,
            max_connections: None,
        }
    }

    pub fn main() -> Self {
        Self::of_type("main")
    }
}

/// Node property definition for configuration UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    /// Property name/key.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Property type.
    #[serde(rename = "type")]
    pub property_type: NodePropertyType,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description/help text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the property is required.
    #[serde(default)]
    pub required: bool,
    /// Options for select/multiOptions types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<NodePropertyOption>>,
    /// Placeholder text for inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Editor hints (rows, password, multipleValues, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_options: Option<Value>,
    /// Conditions under which the property is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_data_expression: bool,
}

impl NodeProperty {
    /// Create a property with no default, options or hints.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        property_type: NodePropertyType,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            property_type,
            default: None,
            description: None,
            required: false,
            options: None,
            placeholder: None,
            type_options: None,
            display_options: None,
            no_data_expression: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_options(mut self, options: Vec<NodePropertyOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_type_options(mut self, type_options: Value) -> Self {
        self.type_options = Some(type_options);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether the editor masks this property's value.
    pub fn is_password(&self) -> bool {
        self.type_options
            .as_ref()
            .and_then(|opts| opts.get("password"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Node property types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NodePropertyType {
    String,
    Number,
    Boolean,
    Options,
    MultiOptions,
    Collection,
    FixedCollection,
    Json,
    Color,
    DateTime,
    ResourceLocator,
    ResourceMapper,
    Filter,
    AssignmentCollection,
    Credentials,
    Notice,
    Button,
}

/// Option for select properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodePropertyOption {
    /// Option display name.
    pub name: String,
    /// Option value.
    pub value: Value,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodePropertyOption {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Node version can be single or multiple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NodeVersion {
    Single(u32),
    Multiple(Vec<u32>),
}

impl NodeVersion {
    pub fn latest(&self) -> u32 {
        match self {
            NodeVersion::Single(v) => *v,
            NodeVersion::Multiple(vs) => *vs.iter().max().unwrap_or(&1),
        }
    }
}

/// Credential description for node type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeCredentialDescription {
    /// Credential type name.
    pub name: String,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Display conditions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<Value>,
}

/// Categorisation used by the node panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeCodex {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subcategories: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
}

/// Full description of one concrete node implementation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDescription {
    /// Node type identifier. Base nodes carry it unprefixed.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Node group/category.
    pub group: Vec<String>,
    /// Description text.
    pub description: String,
    /// Node version(s).
    pub version: NodeVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_version: Option<u32>,
    /// Icon identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Input connections.
    #[serde(default)]
    pub inputs: Vec<NodeConnectionConfig>,
    /// Output connections.
    #[serde(default)]
    pub outputs: Vec<NodeConnectionConfig>,
    /// Node properties.
    #[serde(default)]
    pub properties: Vec<NodeProperty>,
    /// Credential requirements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<NodeCredentialDescription>>,
    /// Whether this is a polling node.
    #[serde(default)]
    pub polling: bool,
    /// Whether an AI agent may invoke this node as a tool.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub usable_as_tool: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codex: Option<NodeCodex>,
}

impl NodeTypeDescription {
    /// Whether a property with the given name is declared.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    /// Copy of this description whose name carries a namespace prefix.
    pub fn with_namespaced_name(&self) -> Self {
        let mut copy = self.clone();
        copy.name = namespaced_name(&copy.name);
        copy
    }
}

/// Shared metadata of a versioned node, independent of any single version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeBaseDescription {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub default_version: u32,
}

/// A node type an execution needs a description for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NeededNodeType {
    pub name: String,
    pub version: u32,
}

impl NeededNodeType {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// Prefix `name` with the base namespace unless it already has an n8n namespace.
///
/// Nodes in the base package describe themselves unprefixed (`httpRequest`),
/// while the rest of the system addresses them as `n8n-nodes-base.httpRequest`.
pub fn namespaced_name(name: &str) -> String {
    if name.starts_with("n8n-nodes") {
        name.to_string()
    } else {
        format!("{}.{}", BASE_NAMESPACE, name)
    }
}

/// Drop a leading `n8n-nodes-base.` from a long type name.
pub fn strip_base_namespace(long_type: &str) -> &str {
    long_type
        .strip_prefix(BASE_NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(long_type)
}
