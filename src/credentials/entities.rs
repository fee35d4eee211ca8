//! Credential ownership model: credentials, their sharings, projects and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a nano ID (21 characters).
pub fn generate_nano_id() -> String {
    nanoid::nanoid!(21)
}

/// Credential scope strings.
pub mod scopes {
    pub const READ: &str = "credential:read";
    pub const UPDATE: &str = "credential:update";
    pub const DELETE: &str = "credential:delete";
    pub const SHARE: &str = "credential:share";
    pub const MOVE: &str = "credential:move";
    pub const CREATE: &str = "credential:create";
    pub const LIST: &str = "credential:list";

    /// Scopes granted on a credential by owning it outright.
    pub const OWNER: &[&str] = &[READ, UPDATE, DELETE, SHARE, MOVE];

    /// Every scope a global owner or admin holds on every credential.
    pub const ALL: &[&str] = &[CREATE, DELETE, LIST, MOVE, READ, SHARE, UPDATE];
}

/// A stored credential. `data` holds the encrypted payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsEntity {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub data: String,
    pub is_managed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialsEntity {
    pub fn new(
        name: impl Into<String>,
        credential_type: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_nano_id(),
            name: name.into(),
            credential_type: credential_type.into(),
            data: data.into(),
            is_managed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Role a project holds on a credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CredentialSharingRole {
    #[serde(rename = "credential:owner")]
    Owner,
    #[default]
    #[serde(rename = "credential:user")]
    User,
}

/// Access of one project to one credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedCredentials {
    pub credentials_id: String,
    pub project_id: String,
    pub role: CredentialSharingRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedCredentials {
    pub fn new(
        credentials_id: impl Into<String>,
        project_id: impl Into<String>,
        role: CredentialSharingRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            credentials_id: credentials_id.into(),
            project_id: project_id.into(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == CredentialSharingRole::Owner
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Personal,
    Team,
}

/// Project entity - team or personal projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new personal project.
    pub fn personal(name: impl Into<String>) -> Self {
        Self::with_type(name, ProjectType::Personal)
    }

    /// Create a new team project.
    pub fn team(name: impl Into<String>) -> Self {
        Self::with_type(name, ProjectType::Team)
    }

    fn with_type(name: impl Into<String>, project_type: ProjectType) -> Self {
        let now = Utc::now();
        Self {
            id: generate_nano_id(),
            name: name.into(),
            project_type,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_personal(&self) -> bool {
        self.project_type == ProjectType::Personal
    }
}

/// Role of a user inside a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectRole {
    #[serde(rename = "project:personalOwner")]
    PersonalOwner,
    #[serde(rename = "project:admin")]
    Admin,
    #[serde(rename = "project:editor")]
    Editor,
    #[serde(rename = "project:viewer")]
    Viewer,
}

impl ProjectRole {
    /// Credential scopes this role grants on credentials the project owns.
    pub fn owned_credential_scopes(self) -> &'static [&'static str] {
        match self {
            Self::PersonalOwner | Self::Admin => scopes::OWNER,
            Self::Editor => &[scopes::READ, scopes::UPDATE, scopes::DELETE],
            Self::Viewer => &[scopes::READ],
        }
    }

    /// Whether members with this role may create credentials in the project.
    pub fn can_create_credentials(self) -> bool {
        !matches!(self, Self::Viewer)
    }
}

/// ProjectRelation - project membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRelation {
    pub project_id: String,
    pub user_id: Uuid,
    pub role: ProjectRole,
}

impl ProjectRelation {
    pub fn new(project_id: impl Into<String>, user_id: Uuid, role: ProjectRole) -> Self {
        Self {
            project_id: project_id.into(),
            user_id,
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GlobalRole {
    #[serde(rename = "global:owner")]
    Owner,
    #[serde(rename = "global:admin")]
    Admin,
    #[serde(rename = "global:member")]
    Member,
}

/// User entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Email address (lowercased).
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: GlobalRole,
}

impl User {
    pub fn new(email: impl Into<String>, role: GlobalRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into().to_lowercase(),
            first_name: None,
            last_name: None,
            role,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Global owners and admins hold every credential scope.
    pub fn has_global_credential_access(&self) -> bool {
        matches!(self.role, GlobalRole::Owner | GlobalRole::Admin)
    }

    /// Name used for the user's personal project, `First Last <email>`.
    pub fn personal_project_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {} <{}>", first, last, self.email),
            _ => format!("<{}>", self.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nano_id_length() {
        assert_eq!(generate_nano_id().len(), 21);
        assert_ne!(generate_nano_id(), generate_nano_id());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_value(CredentialSharingRole::Owner).unwrap(),
            "credential:owner"
        );
        assert_eq!(
            serde_json::to_value(ProjectRole::PersonalOwner).unwrap(),
            "project:personalOwner"
        );
        assert_eq!(serde_json::to_value(GlobalRole::Member).unwrap(), "global:member");
        assert_eq!(serde_json::to_value(ProjectType::Team).unwrap(), "team");
    }

    #[test]
    fn test_project_role_scopes() {
        assert!(ProjectRole::Admin.owned_credential_scopes().contains(&scopes::SHARE));
        assert!(!ProjectRole::Editor.owned_credential_scopes().contains(&scopes::MOVE));
        assert_eq!(ProjectRole::Viewer.owned_credential_scopes(), &[scopes::READ]);
        assert!(!ProjectRole::Viewer.can_create_credentials());
        assert!(ProjectRole::Editor.can_create_credentials());
    }

    #[test]
    fn test_entity_serializes_type_field() {
        let entity = CredentialsEntity::new("Slack account", "slackApi", "encrypted");
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "slackApi");
        assert_eq!(json["isManaged"], false);
    }

    #[test]
    fn test_user_email_lowercased() {
        let user = User::new("Owner@Example.COM", GlobalRole::Owner).with_name("Ada", "Lovelace");
        assert_eq!(user.email, "owner@example.com");
        assert_eq!(user.personal_project_name(), "Ada Lovelace <owner@example.com>");
    }
}
