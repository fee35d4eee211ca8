//! Post-load parameter normalization.
//!
//! Some node kinds get parameters injected after loading instead of declaring
//! them themselves. Every function here is idempotent.

use serde_json::json;
use std::sync::Arc;

use super::description::{NodeProperty, NodePropertyType, NodeTypeDescription};
use super::node_type::{AnyNodeType, NodeType};
use super::versioned::VersionedNodeType;

const POLL_TIMES: &str = "pollTimes";

fn poll_times_property() -> NodeProperty {
    let mut property = NodeProperty::new(POLL_TIMES, "Poll Times", NodePropertyType::FixedCollection)
        .with_default(json!({ "item": [{ "mode": "everyMinute" }] }))
        .with_description("Time at which polling should occur")
        .with_placeholder("Add Poll Time");
    property.type_options = Some(json!({
        "multipleValues": true,
        "multipleValueButtonText": "Add Poll Time",
    }));
    property
}

/// Whether [`apply_special_node_parameters`] would change `description`.
pub fn needs_special_node_parameters(description: &NodeTypeDescription) -> bool {
    description.polling && !description.has_property(POLL_TIMES)
}

/// Inject the parameters a node needs because of its kind.
///
/// Returns `true` when the description was changed.
pub fn apply_special_node_parameters(description: &mut NodeTypeDescription) -> bool {
    if !needs_special_node_parameters(description) {
        return false;
    }
    description.properties.insert(0, poll_times_property());
    true
}

fn normalize_node(node: &mut Arc<NodeType>) -> bool {
    if !needs_special_node_parameters(node.description()) {
        return false;
    }
    apply_special_node_parameters(Arc::make_mut(node).description_mut())
}

fn versioned_needs_normalizing(versioned: &VersionedNodeType) -> bool {
    versioned
        .versions()
        .any(|node| needs_special_node_parameters(node.description()))
}

/// Normalize every concrete implementation inside `node_type`.
///
/// Instances that are shared are copied before being changed, and instances
/// that are already normalized are left untouched, so repeated calls keep
/// the identity of everything they do not need to change.
pub fn normalize(node_type: &mut AnyNodeType) -> bool {
    match node_type {
        AnyNodeType::Single(node) => normalize_node(node),
        AnyNodeType::Versioned(versioned) => {
            if !versioned_needs_normalizing(versioned) {
                return false;
            }
            let mut changed = false;
            for node in Arc::make_mut(versioned).versions_mut() {
                changed |= normalize_node(node);
            }
            changed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::description::NodeVersion;

    fn polling_description() -> NodeTypeDescription {
        NodeTypeDescription {
            name: "rssFeedReadTrigger".to_string(),
            display_name: "RSS Feed Trigger".to_string(),
            group: vec!["trigger".to_string()],
            description: "Starts a workflow when an RSS feed is updated".to_string(),
            version: NodeVersion::Single(1),
            default_version: None,
            icon: None,
            inputs: vec![],
            outputs: vec![],
            properties: vec![NodeProperty::new("feedUrl", "Feed URL", NodePropertyType::String)],
            credentials: None,
            polling: true,
            usable_as_tool: false,
            codex: None,
        }
    }

    #[test]
    fn test_poll_times_prepended_once() {
        let mut desc = polling_description();
        assert!(apply_special_node_parameters(&mut desc));
        assert!(!apply_special_node_parameters(&mut desc));

        assert_eq!(desc.properties.len(), 2);
        assert_eq!(desc.properties[0].name, "pollTimes");
        assert_eq!(desc.properties[1].name, "feedUrl");
    }

    #[test]
    fn test_non_polling_untouched() {
        let mut desc = polling_description();
        desc.polling = false;
        assert!(!apply_special_node_parameters(&mut desc));
        assert_eq!(desc.properties.len(), 1);
    }

    #[test]
    fn test_normalize_keeps_identity_when_nothing_changes() {
        let mut node_type = AnyNodeType::single(polling_description());
        assert!(normalize(&mut node_type));

        let before = node_type.clone();
        assert!(!normalize(&mut node_type));
        assert!(before.same_instance(&node_type));
    }

    #[test]
    fn test_normalize_copies_shared_instances() {
        let mut node_type = AnyNodeType::single(polling_description());
        let shared = node_type.clone();

        assert!(normalize(&mut node_type));
        assert!(!shared.same_instance(&node_type));

        let AnyNodeType::Single(original) = shared else {
            panic!("expected single node");
        };
        assert_eq!(original.description().properties.len(), 1);
    }
}
