//! Request and response bodies of the credentials API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entities::{CredentialsEntity, Project, ProjectType};

/// Credential as sent by the editor: for creation, testing or update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCredentialRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub credential_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestCredentialRequest {
    pub credentials: CredentialPayload,
}

/// `shareWithIds` is kept raw so a malformed list is a 400, not a rejection
/// by the JSON extractor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCredentialRequest {
    #[serde(default)]
    pub share_with_ids: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCredentialRequest {
    pub destination_project_id: String,
}

/// `filter` of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Parsed list query options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: CredentialFilter,
    pub take: Option<usize>,
    pub skip: usize,
}

/// Raw query string of `GET /credentials`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryParams {
    pub include_scopes: Option<String>,
    pub filter: Option<String>,
    pub take: Option<String>,
    pub skip: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForWorkflowParams {
    pub workflow_id: Option<String>,
    pub project_id: Option<String>,
}

/// Where the credentials of a for-workflow lookup will be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialUsage {
    Workflow(String),
    Project(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNameParams {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOneParams {
    pub include_data: Option<String>,
}

/// Project reference embedded in credential responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            project_type: project.project_type,
        }
    }
}

/// Credential as returned by the API. Never carries the encrypted payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub is_managed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_project: Option<ProjectSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with_projects: Vec<ProjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Decrypted and redacted payload, only on request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl From<&CredentialsEntity> for CredentialResponse {
    fn from(entity: &CredentialsEntity) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            credential_type: entity.credential_type.clone(),
            is_managed: entity.is_managed,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            home_project: None,
            shared_with_projects: Vec::new(),
            scopes: None,
            data: None,
        }
    }
}

/// Entry of the for-workflow listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsableCredential {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub scopes: Vec<String>,
    pub is_managed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewNameResponse {
    pub name: String,
}
