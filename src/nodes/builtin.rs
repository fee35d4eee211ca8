//! Compiled-in node classes.

use serde_json::json;
use std::path::{Path, PathBuf};

use super::catalog::{KnownNode, KnownNodes};
use super::description::{
    NodeConnectionConfig, NodeCredentialDescription, NodeProperty, NodePropertyOption,
    NodePropertyType, NodeTypeBaseDescription, NodeTypeDescription, NodeVersion, BASE_NAMESPACE,
};
use super::error::LoadError;
use super::loader::NodeLoader;
use super::node_type::{AnyNodeType, NodeType};
use super::versioned::VersionedNodeType;

/// (class name, node name) of every compiled-in node.
const BUILTIN_CLASSES: &[(&str, &str)] = &[
    ("ManualTrigger", "manualTrigger"),
    ("ScheduleTrigger", "scheduleTrigger"),
    ("Webhook", "webhook"),
    ("Set", "set"),
    ("If", "if"),
    ("Merge", "merge"),
    ("Code", "code"),
    ("HttpRequest", "httpRequest"),
    ("NoOp", "noOp"),
];

/// Known-index entries for the compiled-in nodes, as if they lived under `dir`.
pub fn known_nodes(dir: &Path) -> KnownNodes {
    let mut known = KnownNodes::new();
    for (class_name, name) in BUILTIN_CLASSES {
        known.insert(
            format!("{}.{}", BASE_NAMESPACE, name),
            KnownNode::new(*class_name, builtin_source_path(dir, class_name)),
        );
    }
    known
}

fn builtin_source_path(dir: &Path, class_name: &str) -> PathBuf {
    dir.join(class_name).join(format!("{}.node.js", class_name))
}

/// Loader for the compiled-in node classes. The source path is not read.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLoader;

impl NodeLoader for BuiltinLoader {
    fn load(&self, source_path: &Path, class_name: &str) -> Result<AnyNodeType, LoadError> {
        let node_type = match class_name {
            "ManualTrigger" => AnyNodeType::single(manual_trigger()),
            "ScheduleTrigger" => AnyNodeType::single(schedule_trigger()),
            "Webhook" => webhook().ok_or_else(|| malformed(source_path, class_name))?,
            "Set" => AnyNodeType::single(set()),
            "If" => AnyNodeType::single(if_node()),
            "Merge" => AnyNodeType::single(merge()),
            "Code" => AnyNodeType::single(code()),
            "HttpRequest" => http_request().ok_or_else(|| malformed(source_path, class_name))?,
            "NoOp" => AnyNodeType::single(no_op()),
            _ => {
                return Err(LoadError::ClassNotFound {
                    class_name: class_name.to_string(),
                    source_path: source_path.to_path_buf(),
                });
            }
        };
        Ok(node_type)
    }
}

fn malformed(source_path: &Path, class_name: &str) -> LoadError {
    LoadError::Malformed {
        source_path: source_path.to_path_buf(),
        message: format!("{} does not provide its default version", class_name),
    }
}

fn node(name: &str, display_name: &str, group: &str, description: &str) -> NodeTypeDescription {
    NodeTypeDescription {
        name: name.to_string(),
        display_name: display_name.to_string(),
        group: vec![group.to_string()],
        description: description.to_string(),
        version: NodeVersion::Single(1),
        default_version: None,
        icon: None,
        inputs: vec![NodeConnectionConfig {
            required: true,
            ..NodeConnectionConfig::main()
        }],
        outputs: vec![NodeConnectionConfig::main()],
        properties: vec![],
        credentials: None,
        polling: false,
        usable_as_tool: false,
        codex: None,
    }
}

fn trigger(name: &str, display_name: &str, description: &str) -> NodeTypeDescription {
    let mut desc = node(name, display_name, "trigger", description);
    desc.inputs = vec![];
    desc
}

fn with_icon(mut desc: NodeTypeDescription, icon: &str) -> NodeTypeDescription {
    desc.icon = Some(icon.to_string());
    desc
}

fn manual_trigger() -> NodeTypeDescription {
    with_icon(
        trigger("manualTrigger", "Manual Trigger", "Triggers the workflow manually"),
        "fa:play",
    )
}

fn schedule_trigger() -> NodeTypeDescription {
    let mut desc = with_icon(
        trigger("scheduleTrigger", "Schedule Trigger", "Triggers the workflow on a time schedule"),
        "fa:clock",
    );
    desc.group.push("schedule".to_string());
    desc.polling = true;
    desc.properties = vec![
        NodeProperty::new("cronExpression", "Cron Expression", NodePropertyType::String)
            .with_description("Custom cron expression")
            .with_placeholder("0 0 * * *"),
    ];
    desc
}

fn webhook_version(version: u32) -> NodeTypeDescription {
    let mut desc = with_icon(
        trigger("webhook", "Webhook", "Starts the workflow when a webhook is called"),
        "fa:bolt",
    );
    desc.version = NodeVersion::Single(version);
    desc.properties = vec![
        NodeProperty::new("httpMethod", "HTTP Method", NodePropertyType::Options)
            .with_options(
                ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD"]
                    .iter()
                    .map(|m| NodePropertyOption::new(*m, *m))
                    .collect(),
            )
            .with_default(json!("GET")),
        NodeProperty::new("path", "Path", NodePropertyType::String)
            .with_description("Webhook path")
            .with_placeholder("/webhook-path")
            .required(),
        NodeProperty::new("responseMode", "Respond", NodePropertyType::Options)
            .with_description("When to respond to the webhook"),
    ];
    if version >= 2 {
        desc.properties.push(
            NodeProperty::new("options", "Options", NodePropertyType::Collection)
                .with_default(json!({})),
        );
    }
    desc
}

fn webhook() -> Option<AnyNodeType> {
    versioned(
        NodeTypeBaseDescription {
            name: "webhook".to_string(),
            display_name: "Webhook".to_string(),
            description: "Starts the workflow when a webhook is called".to_string(),
            group: vec!["trigger".to_string()],
            icon: Some("fa:bolt".to_string()),
            default_version: 2,
        },
        vec![(1, webhook_version(1)), (2, webhook_version(2))],
    )
}

fn set() -> NodeTypeDescription {
    let mut desc = with_icon(node("set", "Edit Fields (Set)", "input", "Set values on items"), "fa:pen");
    desc.properties = vec![
        NodeProperty::new("assignments", "Fields to Set", NodePropertyType::AssignmentCollection)
            .with_default(json!({})),
    ];
    desc
}

fn if_node() -> NodeTypeDescription {
    let mut desc = with_icon(node("if", "If", "transform", "Route items based on conditions"), "fa:map-signs");
    desc.outputs = ["True", "False"]
        .iter()
        .map(|label| NodeConnectionConfig {
            display_name: Some(label.to_string()),
            ..NodeConnectionConfig::main()
        })
        .collect();
    desc.properties = vec![
        NodeProperty::new("conditions", "Conditions", NodePropertyType::Filter)
            .with_default(json!({}))
            .required(),
    ];
    desc
}

fn merge() -> NodeTypeDescription {
    let mut desc = with_icon(node("merge", "Merge", "transform", "Merge data of multiple streams"), "fa:code-branch");
    desc.inputs = ["Input 1", "Input 2"]
        .iter()
        .map(|label| NodeConnectionConfig {
            display_name: Some(label.to_string()),
            required: true,
            ..NodeConnectionConfig::main()
        })
        .collect();
    desc.properties = vec![
        NodeProperty::new("mode", "Mode", NodePropertyType::Options)
            .with_options(vec![
                NodePropertyOption::new("Append", "append"),
                NodePropertyOption::new("Combine", "combine"),
                NodePropertyOption::new("Choose Branch", "chooseBranch"),
            ])
            .with_default(json!("append")),
    ];
    desc
}

fn code() -> NodeTypeDescription {
    let mut desc = with_icon(node("code", "Code", "transform", "Run custom JavaScript or Python code"), "fa:code");
    desc.usable_as_tool = true;
    desc.properties = vec![
        NodeProperty::new("language", "Language", NodePropertyType::Options)
            .with_options(vec![
                NodePropertyOption::new("JavaScript", "javaScript"),
                NodePropertyOption::new("Python (Beta)", "python"),
            ])
            .with_default(json!("javaScript")),
        NodeProperty::new("jsCode", "JavaScript", NodePropertyType::String)
            .with_description("JavaScript code to execute")
            .required(),
    ];
    desc
}

fn http_request_version(version: u32) -> NodeTypeDescription {
    let mut desc = with_icon(node("httpRequest", "HTTP Request", "output", "Makes an HTTP request and returns the response data"), "fa:at");
    desc.version = NodeVersion::Single(version);
    desc.usable_as_tool = version >= 4;
    desc.properties = vec![
        NodeProperty::new("method", "Method", NodePropertyType::Options)
            .with_options(
                ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"]
                    .iter()
                    .map(|m| NodePropertyOption::new(*m, *m))
                    .collect(),
            )
            .with_default(json!("GET")),
        NodeProperty::new("url", "URL", NodePropertyType::String)
            .with_default(json!(""))
            .with_placeholder("http://example.com/index.html")
            .required(),
    ];
    desc.credentials = Some(vec![NodeCredentialDescription {
        name: "httpBasicAuth".to_string(),
        required: false,
        display_options: None,
    }]);
    desc
}

fn http_request() -> Option<AnyNodeType> {
    versioned(
        NodeTypeBaseDescription {
            name: "httpRequest".to_string(),
            display_name: "HTTP Request".to_string(),
            description: "Makes an HTTP request and returns the response data".to_string(),
            group: vec!["output".to_string()],
            icon: Some("fa:at".to_string()),
            default_version: 4,
        },
        vec![(3, http_request_version(3)), (4, http_request_version(4))],
    )
}

fn no_op() -> NodeTypeDescription {
    with_icon(node("noOp", "No Operation, do nothing", "organization", "No Operation"), "fa:arrow-right")
}

fn versioned(
    base: NodeTypeBaseDescription,
    versions: Vec<(u32, NodeTypeDescription)>,
) -> Option<AnyNodeType> {
    let default_version = base.default_version;
    let nodes = versions.into_iter().map(|(version, mut desc)| {
        desc.version = NodeVersion::Single(version);
        desc.default_version = Some(default_version);
        (version, NodeType::new(desc))
    });
    VersionedNodeType::new(base, nodes).map(AnyNodeType::from)
}
