//! Configuration module - Environment-based configuration

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::credentials::cipher::generate_encryption_key;
use crate::credentials::service::DEFAULT_CREDENTIAL_NAME;
use crate::credentials::CredentialsService;
use crate::nodes::description::BASE_NAMESPACE;
use crate::nodes::NodeTypes;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server config
    pub host: String,
    pub port: u16,

    // Node registry
    pub nodes_dir: PathBuf,
    pub node_load_timeout: Duration,
    pub tool_namespaces: Vec<String>,

    // Credentials
    pub encryption_key: String,
    pub credentials_default_name: String,
    pub sharing_enabled: bool,
    pub owner_user_id: Option<Uuid>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let host = env::var("N8N_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("N8N_PORT")
            .unwrap_or_else(|_| "5678".to_string())
            .parse()
            .unwrap_or(5678);

        let node_load_timeout_ms = env::var("N8N_NODE_LOAD_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let tool_namespaces = env::var("N8N_TOOL_NAMESPACES")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|_| vec![BASE_NAMESPACE.to_string()]);

        let encryption_key = match env::var("N8N_ENCRYPTION_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                warn!("N8N_ENCRYPTION_KEY is not set, using a generated key; stored credentials will not survive a restart");
                generate_encryption_key()
            }
        };

        Self {
            host,
            port,
            nodes_dir: env::var("N8N_NODES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./nodes")),
            node_load_timeout: Duration::from_millis(node_load_timeout_ms),
            tool_namespaces,
            encryption_key,
            credentials_default_name: env::var("CREDENTIALS_DEFAULT_NAME")
                .unwrap_or_else(|_| DEFAULT_CREDENTIAL_NAME.to_string()),
            sharing_enabled: env::var("N8N_SHARING_ENABLED")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
            owner_user_id: env::var("N8N_OWNER_USER_ID")
                .ok()
                .and_then(|v| Uuid::parse_str(&v).ok()),
        }
    }

    /// Get server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub node_types: Arc<NodeTypes>,
    pub credentials: Arc<CredentialsService>,
}

impl AppState {
    pub fn new(config: Config, node_types: NodeTypes, credentials: CredentialsService) -> Self {
        Self {
            config: Arc::new(config),
            node_types: Arc::new(node_types),
            credentials: Arc::new(credentials),
        }
    }
}
