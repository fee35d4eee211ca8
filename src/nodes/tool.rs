//! Derivation of AI tool variants.
//!
//! A tool variant is a separate node layered over a base node. The base
//! node's description is copied, never edited, since the base stays
//! resolvable on its own.

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::description::{
    NodeCodex, NodeConnectionConfig, NodeProperty, NodePropertyOption, NodePropertyType,
    NodeTypeDescription, AI_TOOL_CONNECTION,
};
use super::node_type::NodeType;

/// Suffix that turns a node type name into its tool variant's name.
pub const TOOL_SUFFIX: &str = "Tool";

const TOOL_DESCRIPTION: &str = "toolDescription";

/// Derive the tool variant of `base`.
pub fn convert_node_to_ai_tool(base: &Arc<NodeType>) -> NodeType {
    let description = to_ai_tool_description(base.description());
    NodeType::derived(Arc::clone(base), description)
}

/// Adapt a copy of `base` for invocation by an AI agent.
pub fn to_ai_tool_description(base: &NodeTypeDescription) -> NodeTypeDescription {
    let mut description = base.clone();

    description.name.push_str(TOOL_SUFFIX);
    if !description.display_name.ends_with(TOOL_SUFFIX) {
        description.display_name.push_str(" Tool");
    }
    description.inputs = Vec::new();
    description.outputs = vec![NodeConnectionConfig::of_type(AI_TOOL_CONNECTION)];
    description.usable_as_tool = false;

    if !description.has_property(TOOL_DESCRIPTION) {
        let has_resource_or_operation =
            description.has_property("resource") || description.has_property("operation");

        let mut injected = vec![notice_property()];
        let mut tool_description = tool_description_property(&base.description);
        if has_resource_or_operation {
            injected.push(description_type_property());
            tool_description.display_options =
                Some(json!({ "show": { "descriptionType": ["manual"] } }));
        }
        injected.push(tool_description);

        description.properties.splice(0..0, injected);
    }

    let resources = description.codex.take().and_then(|codex| codex.resources);
    description.codex = Some(NodeCodex {
        categories: vec!["AI".to_string()],
        subcategories: BTreeMap::from([
            ("AI".to_string(), vec!["Tools".to_string()]),
            ("Tools".to_string(), vec!["Other Tools".to_string()]),
        ]),
        resources,
    });

    description
}

fn notice_property() -> NodeProperty {
    NodeProperty::new(
        "notice",
        "Use the expression {{ $fromAI('placeholder_name') }} for any data to be filled by the model",
        NodePropertyType::Notice,
    )
    .with_default(json!(""))
}

fn description_type_property() -> NodeProperty {
    let mut property = NodeProperty::new("descriptionType", "Tool Description", NodePropertyType::Options)
        .with_options(vec![
            NodePropertyOption::new("Set Automatically", "auto")
                .with_description("Automatically set based on resource / operation"),
            NodePropertyOption::new("Set Manually", "manual")
                .with_description("Manually set the description"),
        ])
        .with_default(json!("auto"));
    property.no_data_expression = true;
    property
}

fn tool_description_property(node_description: &str) -> NodeProperty {
    let mut property = NodeProperty::new(TOOL_DESCRIPTION, "Description", NodePropertyType::String)
        .with_default(json!(node_description))
        .with_description(
            "Explain to the LLM what this tool does, a good, specific description would allow LLMs to produce expected results much more often",
        )
        .with_placeholder(format!("e.g. {}", node_description))
        .required();
    property.type_options = Some(json!({ "rows": 2 }));
    property
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::description::NodeVersion;

    fn slack() -> NodeTypeDescription {
        NodeTypeDescription {
            name: "slack".to_string(),
            display_name: "Slack".to_string(),
            group: vec!["output".to_string()],
            description: "Consume the Slack API".to_string(),
            version: NodeVersion::Single(2),
            default_version: None,
            icon: None,
            inputs: vec![NodeConnectionConfig::main()],
            outputs: vec![NodeConnectionConfig::main()],
            properties: vec![
                NodeProperty::new("resource", "Resource", NodePropertyType::Options),
                NodeProperty::new("operation", "Operation", NodePropertyType::Options),
            ],
            credentials: None,
            polling: false,
            usable_as_tool: true,
            codex: Some(NodeCodex {
                categories: vec!["Communication".to_string()],
                subcategories: BTreeMap::new(),
                resources: Some(json!({ "primaryDocumentation": [] })),
            }),
        }
    }

    #[test]
    fn test_tool_description_shape() {
        let tool = to_ai_tool_description(&slack());

        assert_eq!(tool.name, "slackTool");
        assert_eq!(tool.display_name, "Slack Tool");
        assert!(tool.inputs.is_empty());
        assert_eq!(tool.outputs, vec![NodeConnectionConfig::of_type("ai_tool")]);
        assert!(!tool.usable_as_tool);

        let names: Vec<&str> = tool.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["notice", "descriptionType", "toolDescription", "resource", "operation"]
        );
        assert_eq!(
            tool.properties[2].display_options,
            Some(json!({ "show": { "descriptionType": ["manual"] } }))
        );

        let codex = tool.codex.unwrap();
        assert_eq!(codex.categories, vec!["AI"]);
        assert_eq!(codex.subcategories["Tools"], vec!["Other Tools"]);
        assert_eq!(codex.resources, Some(json!({ "primaryDocumentation": [] })));
    }

    #[test]
    fn test_without_resource_no_description_type() {
        let mut base = slack();
        base.properties.clear();
        let tool = to_ai_tool_description(&base);

        let names: Vec<&str> = tool.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["notice", "toolDescription"]);
        assert!(tool.properties[1].display_options.is_none());
        assert_eq!(tool.properties[1].default, Some(json!("Consume the Slack API")));
    }

    #[test]
    fn test_existing_tool_description_kept() {
        let mut base = slack();
        base.properties = vec![NodeProperty::new(
            "toolDescription",
            "Description",
            NodePropertyType::String,
        )];
        let tool = to_ai_tool_description(&base);
        assert_eq!(tool.properties.len(), 1);
    }

    #[test]
    fn test_base_untouched() {
        let base = Arc::new(NodeType::new(slack()));
        let tool = convert_node_to_ai_tool(&base);

        assert_eq!(base.description(), &slack());
        assert_ne!(tool.description().properties.len(), base.description().properties.len());
        assert!(Arc::ptr_eq(tool.base().unwrap(), &base));
    }
}
