//! n8n node type registry and credentials API server.
//!
//! ## Endpoints
//!
//! - `POST /node-types/descriptions` - Descriptions for a batch of node types
//! - `GET /node-types/known` - Names of every known node type
//! - `GET /node-types/:name` - Description of one node type (and its tool variant)
//! - `GET /node-types/:name/translation` - Translation file path of a node type
//! - `/credentials/...` - Credentials API
//! - `GET /healthz` - Health check
//!
//! ## Startup
//!
//! Compiled-in nodes and manifests under `N8N_NODES_DIR` are indexed, every
//! known node is loaded once and normalized, then the server starts.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use n8n_registry::config::{AppState, Config};
use n8n_registry::credentials::{
    AesGcmCipher, CredentialsService, GlobalRole, MemoryCredentialsRepository, User,
};
use n8n_registry::handlers::router;
use n8n_registry::nodes::description::BASE_NAMESPACE;
use n8n_registry::nodes::{
    builtin, BuiltinLoader, IsolatedLoader, KnownNodes, LoaderChain, ManifestLoader, NodeTypes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "n8n_registry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    info!("Starting n8n registry");
    info!("Nodes directory: {}", config.nodes_dir.display());
    info!("Binding to: {}", bind_addr);

    let node_types = build_node_types(&config)?;
    let credentials = build_credentials(&config).await;

    let state = AppState::new(config, node_types, credentials);
    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}

fn build_node_types(config: &Config) -> anyhow::Result<NodeTypes> {
    let mut known = builtin::known_nodes(&config.nodes_dir);
    let manifests = KnownNodes::scan_dir(&config.nodes_dir, BASE_NAMESPACE)
        .with_context(|| format!("Failed to scan {}", config.nodes_dir.display()))?;
    info!(
        builtin = known.len(),
        manifests = manifests.len(),
        "Indexed node types"
    );
    known.extend(manifests);

    let loader = IsolatedLoader::new(
        LoaderChain::new().with(BuiltinLoader).with(ManifestLoader),
        config.node_load_timeout,
    );
    let node_types =
        NodeTypes::new(known, Arc::new(loader)).with_tool_namespaces(config.tool_namespaces.clone());

    node_types.load_all().context("Failed to load node types")?;
    node_types.apply_special_node_parameters();
    Ok(node_types)
}

async fn build_credentials(config: &Config) -> CredentialsService {
    let repository = MemoryCredentialsRepository::new();

    let mut owner = User::new("owner@n8n.local", GlobalRole::Owner).with_name("Instance", "Owner");
    match config.owner_user_id {
        Some(id) => owner.id = id,
        None => warn!("N8N_OWNER_USER_ID is not set, generated owner id {}", owner.id),
    }
    let project = repository.insert_user_with_personal_project(owner.clone()).await;
    info!(user_id = %owner.id, project_id = %project.id, "Seeded instance owner");

    CredentialsService::new(
        Arc::new(repository),
        Arc::new(AesGcmCipher::new(&config.encryption_key)),
    )
    .with_default_name(config.credentials_default_name.clone())
    .with_sharing_enabled(config.sharing_enabled)
}
