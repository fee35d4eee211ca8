//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;

use n8n_registry::config::{AppState, Config};
use n8n_registry::credentials::controller::USER_ID_HEADER;
use n8n_registry::credentials::{AesGcmCipher, CredentialsService, MemoryCredentialsRepository};
use n8n_registry::nodes::description::BASE_NAMESPACE;
use n8n_registry::nodes::{builtin, BuiltinLoader, KnownNodes, LoaderChain, ManifestLoader, NodeTypes};

pub fn test_config(nodes_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        nodes_dir: nodes_dir.to_path_buf(),
        node_load_timeout: Duration::from_secs(5),
        tool_namespaces: vec![BASE_NAMESPACE.to_string()],
        encryption_key: "integration-test-key".to_string(),
        credentials_default_name: "My credentials".to_string(),
        sharing_enabled: true,
        owner_user_id: None,
    }
}

/// Registry over the compiled-in nodes plus any manifests under `nodes_dir`.
pub fn node_types(nodes_dir: &Path) -> NodeTypes {
    let mut known = builtin::known_nodes(nodes_dir);
    known.extend(KnownNodes::scan_dir(nodes_dir, BASE_NAMESPACE).unwrap());
    let loader = LoaderChain::new().with(BuiltinLoader).with(ManifestLoader);
    NodeTypes::new(known, Arc::new(loader))
}

pub fn credentials_service(repository: &MemoryCredentialsRepository) -> CredentialsService {
    CredentialsService::new(
        Arc::new(repository.clone()),
        Arc::new(AesGcmCipher::new("integration-test-key")),
    )
}

pub fn app_state(nodes_dir: &Path, repository: &MemoryCredentialsRepository) -> AppState {
    AppState::new(
        test_config(nodes_dir),
        node_types(nodes_dir),
        credentials_service(repository),
    )
}

pub fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
