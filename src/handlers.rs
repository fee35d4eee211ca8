//! HTTP request handlers for node types, plus the application router.
//!
//! Implements:
//! - POST /node-types/descriptions
//! - GET /node-types/known
//! - GET /node-types/:name
//! - GET /node-types/:name/translation
//! - GET /healthz
//!
//! and mounts the credentials API under `/credentials`.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppState;
use crate::credentials;
use crate::error::{ApiError, ApiResult};
use crate::nodes::{NeededNodeType, NodeTypeDescription, NodeTypes};

/// Response envelope: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VersionQuery {
    pub version: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TranslationQuery {
    pub locale: Option<String>,
    pub version: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TranslationPath {
    pub path: PathBuf,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/node-types/descriptions", post(node_type_descriptions_handler))
        .route("/node-types/known", get(known_node_types_handler))
        .route("/node-types/:name", get(node_type_handler))
        .route("/node-types/:name/translation", get(translation_path_handler))
        .route("/healthz", get(health_handler))
        .nest("/credentials", credentials::controller::router())
        // Add CORS support
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        // Add request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Registry lookups may run a loader; keep them off the async workers.
async fn with_registry<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&NodeTypes) -> ApiResult<T> + Send + 'static,
{
    let node_types = state.node_types.clone();
    tokio::task::spawn_blocking(move || f(&node_types))
        .await
        .map_err(|e| ApiError::Internal(format!("Registry task failed: {}", e)))?
}

/// POST /node-types/descriptions
///
/// All requested descriptions, or an error when any one cannot be resolved.
pub async fn node_type_descriptions_handler(
    State(state): State<AppState>,
    Json(needed): Json<Vec<NeededNodeType>>,
) -> ApiResult<Json<Data<Vec<NodeTypeDescription>>>> {
    let descriptions =
        with_registry(&state, move |types| Ok(types.get_node_type_descriptions(&needed)?)).await?;
    Ok(Json(Data::new(descriptions)))
}

/// GET /node-types/known
pub async fn known_node_types_handler(State(state): State<AppState>) -> Json<Data<Vec<String>>> {
    let names = state
        .node_types
        .known_types()
        .names()
        .map(str::to_string)
        .collect();
    Json(Data::new(names))
}

/// GET /node-types/:name?version=
pub async fn node_type_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<VersionQuery>,
) -> ApiResult<Json<Data<NodeTypeDescription>>> {
    let description = with_registry(&state, move |types| {
        let node = types.get_by_name_and_version(&name, query.version)?;
        Ok(node.description().clone())
    })
    .await?;
    Ok(Json(Data::new(description)))
}

/// GET /node-types/:name/translation?locale=&version=
pub async fn translation_path_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<TranslationQuery>,
) -> ApiResult<Json<Data<TranslationPath>>> {
    let lookup_name = name.clone();
    let version = query.version;
    let source = with_registry(&state, move |types| {
        Ok(types.get_with_source_path(&lookup_name, version)?.source_path)
    })
    .await?;

    let locale = query.locale.as_deref().unwrap_or("en");
    let path = state
        .node_types
        .node_translation_path(&source, &name, locale)
        .await?;
    Ok(Json(Data::new(TranslationPath { path })))
}

/// GET /healthz
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "knownNodeTypes": state.node_types.known_types().len(),
        "loadedNodeTypes": state.node_types.loaded_count(),
    }))
}
