//! Tests for the node type registry and its HTTP surface
//!
//! - Lazy loading: one load per type, one shared instance afterwards
//! - Versioned nodes: default version, explicit versions, missing versions
//! - AI tool variants: derived once, cached, base left untouched
//! - Batch descriptions fail as a whole
//! - JSON manifests discovered on disk and their translation paths
//! - Routes under /node-types and /healthz

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{app_state, body_json, node_types, request};
use n8n_registry::credentials::MemoryCredentialsRepository;
use n8n_registry::handlers::router;
use n8n_registry::nodes::description::AI_TOOL_CONNECTION;
use n8n_registry::nodes::{NeededNodeType, NodeTypesError};

fn write_slack_manifest(dir: &Path) {
    let slack_dir = dir.join("Slack");
    fs::create_dir_all(&slack_dir).unwrap();

    let version = |v: u32| {
        json!({
            "name": "slack",
            "displayName": "Slack",
            "group": ["output"],
            "description": "Consume the Slack API",
            "version": v,
            "properties": [
                {"displayName": "Channel", "name": "channel", "type": "string", "default": ""}
            ]
        })
    };
    let manifest = json!({
        "className": "Slack",
        "baseDescription": {"name": "slack", "displayName": "Slack", "defaultVersion": 2},
        "nodeVersions": {"1": version(1), "2": version(2)},
    });
    fs::write(
        slack_dir.join("Slack.node.json"),
        serde_json::to_vec_pretty(&manifest).unwrap(),
    )
    .unwrap();

    for version_dir in ["v1", "v2", "v10", "translations"] {
        fs::create_dir_all(slack_dir.join(version_dir)).unwrap();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_builtin_is_loaded_once_and_shared() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    assert!(!types.is_loaded("n8n-nodes-base.set"));
    let first = types.get_by_name("n8n-nodes-base.set").unwrap();
    let second = types.get_by_name("n8n-nodes-base.set").unwrap();

    assert!(types.is_loaded("n8n-nodes-base.set"));
    assert!(first.same_instance(&second));
    assert_eq!(types.loaded_count(), 1);
}

#[test]
fn test_default_version_matches_explicit_version() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let default = types.get_by_name_and_version("n8n-nodes-base.webhook", None).unwrap();
    let explicit = types.get_by_name_and_version("n8n-nodes-base.webhook", Some(2)).unwrap();
    assert!(Arc::ptr_eq(&default, &explicit));

    let v1 = types.get_by_name_and_version("n8n-nodes-base.webhook", Some(1)).unwrap();
    assert!(!Arc::ptr_eq(&default, &v1));
    assert_eq!(v1.description().version.latest(), 1);

    let http = types.get_by_name_and_version("n8n-nodes-base.httpRequest", None).unwrap();
    assert_eq!(http.description().version.latest(), 4);
}

#[test]
fn test_missing_version() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let err = types
        .get_by_name_and_version("n8n-nodes-base.webhook", Some(7))
        .unwrap_err();
    assert!(matches!(err, NodeTypesError::VersionNotFound { version: 7, .. }));
}

#[test]
fn test_unknown_type_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let err = types.get_by_name("n8n-nodes-base.doesNotExist").unwrap_err();
    assert!(err.is_unknown_type());
    assert!(!types.is_loaded("n8n-nodes-base.doesNotExist"));
}

#[test]
fn test_tool_variant_is_derived_once() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let tool = types
        .get_by_name_and_version("n8n-nodes-base.httpRequestTool", None)
        .unwrap();
    let again = types
        .get_by_name_and_version("n8n-nodes-base.httpRequestTool", None)
        .unwrap();
    assert!(Arc::ptr_eq(&tool, &again));

    let description = tool.description();
    assert_eq!(description.name, "httpRequestTool");
    assert!(description.inputs.is_empty());
    assert_eq!(description.outputs.len(), 1);
    assert_eq!(description.outputs[0].connection_type, AI_TOOL_CONNECTION);
    assert!(description.has_property("toolDescription"));

    // The base keeps its own description
    let base = types.get_by_name_and_version("n8n-nodes-base.httpRequest", None).unwrap();
    assert!(Arc::ptr_eq(tool.base().unwrap(), &base));
    assert_eq!(base.description().name, "httpRequest");
    assert!(!base.description().has_property("toolDescription"));
    assert!(!base.description().outputs.is_empty());
}

#[test]
fn test_tool_variant_requires_usable_base_version() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    // Cache the variant from v4 first, v3 must still be refused
    types
        .get_by_name_and_version("n8n-nodes-base.httpRequestTool", Some(4))
        .unwrap();
    let err = types
        .get_by_name_and_version("n8n-nodes-base.httpRequestTool", Some(3))
        .unwrap_err();
    assert_eq!(err, NodeTypesError::NotUsableAsTool("n8n-nodes-base.httpRequest".to_string()));

    let err = types
        .get_by_name_and_version("n8n-nodes-base.noOpTool", None)
        .unwrap_err();
    assert!(matches!(err, NodeTypesError::NotUsableAsTool(_)));
    assert!(!types.is_loaded("n8n-nodes-base.noOpTool"));
}

#[test]
fn test_descriptions_are_copies() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let mut copy = types
        .get_with_source_path("n8n-nodes-base.code", None)
        .unwrap()
        .description;
    copy.properties.clear();
    copy.name = "changed".to_string();

    let cached = types.get_by_name_and_version("n8n-nodes-base.code", None).unwrap();
    assert_eq!(cached.description().name, "code");
    assert!(!cached.description().properties.is_empty());
}

#[test]
fn test_batch_descriptions() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let descriptions = types
        .get_node_type_descriptions(&[
            NeededNodeType::new("n8n-nodes-base.webhook", 1),
            NeededNodeType::new("n8n-nodes-base.set", 1),
        ])
        .unwrap();
    assert_eq!(descriptions.len(), 2);
    assert_eq!(descriptions[0].name, "n8n-nodes-base.webhook");
    assert_eq!(descriptions[0].version.latest(), 1);
    assert_eq!(descriptions[1].name, "n8n-nodes-base.set");

    // Cached descriptions keep their short names
    let webhook = types.get_by_name_and_version("n8n-nodes-base.webhook", Some(1)).unwrap();
    assert_eq!(webhook.description().name, "webhook");

    let err = types
        .get_node_type_descriptions(&[
            NeededNodeType::new("n8n-nodes-base.set", 1),
            NeededNodeType::new("n8n-nodes-base.webhook", 9),
        ])
        .unwrap_err();
    assert!(matches!(err, NodeTypesError::VersionNotFound { .. }));
}

#[test]
fn test_polling_nodes_get_poll_times() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let schedule = types
        .get_by_name_and_version("n8n-nodes-base.scheduleTrigger", None)
        .unwrap();
    assert_eq!(schedule.description().properties[0].name, "pollTimes");

    let webhook = types.get_by_name_and_version("n8n-nodes-base.webhook", None).unwrap();
    assert!(!webhook.description().has_property("pollTimes"));
}

#[test]
fn test_load_all_then_normalize_keeps_instances() {
    let dir = tempfile::tempdir().unwrap();
    let types = node_types(dir.path());

    let loaded = types.load_all().unwrap();
    assert_eq!(loaded, types.known_types().len());

    let before = types.get_by_name("n8n-nodes-base.scheduleTrigger").unwrap();
    assert_eq!(types.apply_special_node_parameters(), 0);
    let after = types.get_by_name("n8n-nodes-base.scheduleTrigger").unwrap();
    assert!(before.same_instance(&after));
}

#[test]
fn test_manifest_nodes_are_discovered() {
    let dir = tempfile::tempdir().unwrap();
    write_slack_manifest(dir.path());
    let types = node_types(dir.path());

    assert!(types.known_types().contains("n8n-nodes-base.slack"));
    let slack = types.get_by_name("n8n-nodes-base.slack").unwrap();
    assert!(slack.is_versioned());

    let with_source = types.get_with_source_path("n8n-nodes-base.slack", Some(1)).unwrap();
    assert_eq!(with_source.description.version.latest(), 1);
    assert_eq!(
        with_source.source_path,
        dir.path().join("Slack").join("Slack.node.json")
    );
}

#[tokio::test]
async fn test_translation_path_uses_highest_version_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_slack_manifest(dir.path());
    let types = node_types(dir.path());

    let source = types
        .get_with_source_path("n8n-nodes-base.slack", None)
        .unwrap()
        .source_path;
    let path = types
        .node_translation_path(&source, "n8n-nodes-base.slack", "de")
        .await
        .unwrap();

    assert_eq!(
        path,
        dir.path()
            .join("Slack")
            .join("v10")
            .join("translations")
            .join("de")
            .join("slack.json")
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// HTTP routes
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_descriptions_route() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(app_state(dir.path(), &MemoryCredentialsRepository::new()));

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/node-types/descriptions",
            None,
            Some(json!([{"name": "n8n-nodes-base.webhook", "version": 2}])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["name"], "n8n-nodes-base.webhook");
    assert_eq!(body["data"][0]["version"], 2);

    let response = app
        .oneshot(request(
            Method::POST,
            "/node-types/descriptions",
            None,
            Some(json!([
                {"name": "n8n-nodes-base.webhook", "version": 2},
                {"name": "n8n-nodes-base.nope", "version": 1}
            ])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], 404);
    assert!(body["message"].as_str().unwrap().contains("n8n-nodes-base.nope"));
}

#[tokio::test]
async fn test_known_and_single_routes() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(app_state(dir.path(), &MemoryCredentialsRepository::new()));

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/node-types/known", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(names.contains(&"n8n-nodes-base.httpRequest"));
    assert!(!names.contains(&"n8n-nodes-base.httpRequestTool"));

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/node-types/n8n-nodes-base.codeTool", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "codeTool");
    assert_eq!(body["data"]["outputs"][0]["type"], AI_TOOL_CONNECTION);

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/node-types/n8n-nodes-base.webhook?version=1",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["version"], 1);

    let response = app
        .oneshot(request(Method::GET, "/node-types/n8n-nodes-base.setTool", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_translation_route() {
    let dir = tempfile::tempdir().unwrap();
    write_slack_manifest(dir.path());
    let app = router(app_state(dir.path(), &MemoryCredentialsRepository::new()));

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/node-types/n8n-nodes-base.slack/translation?locale=fr",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let expected = dir
        .path()
        .join("Slack")
        .join("v10")
        .join("translations")
        .join("fr")
        .join("slack.json");
    assert_eq!(body["data"]["path"], expected.to_str().unwrap());

    let response = app
        .oneshot(request(
            Method::GET,
            "/node-types/n8n-nodes-base.nope/translation",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_route() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path(), &MemoryCredentialsRepository::new());
    let known = state.node_types.known_types().len();
    let app = router(state);

    let response = app
        .oneshot(request(Method::GET, "/healthz", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["knownNodeTypes"], known);
    assert_eq!(body["loadedNodeTypes"], 0);
}
