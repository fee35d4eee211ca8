//! Persistence for credentials and the ownership data they depend on.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::entities::{
    CredentialSharingRole, CredentialsEntity, Project, ProjectRelation, ProjectRole,
    SharedCredentials, User,
};
use super::error::CredentialsResult;

/// Storage backend for the credentials service.
#[async_trait]
pub trait CredentialsRepository: Send + Sync {
    /// Get a credential by ID.
    async fn find_credential(&self, id: &str) -> CredentialsResult<Option<CredentialsEntity>>;

    /// All credentials, ordered by name.
    async fn list_credentials(&self) -> CredentialsResult<Vec<CredentialsEntity>>;

    /// Store a new credential together with its owning sharing.
    async fn insert_credential(
        &self,
        credential: &CredentialsEntity,
        owner: SharedCredentials,
    ) -> CredentialsResult<()>;

    /// Replace a stored credential. Returns `None` when it no longer exists.
    async fn update_credential(
        &self,
        credential: &CredentialsEntity,
    ) -> CredentialsResult<Option<CredentialsEntity>>;

    /// Delete a credential and all of its sharings.
    async fn delete_credential(&self, id: &str) -> CredentialsResult<bool>;

    async fn sharings_for_credential(
        &self,
        credential_id: &str,
    ) -> CredentialsResult<Vec<SharedCredentials>>;

    /// Remove the sharings with `unshare` and add `share` in one step.
    /// Returns how many sharings were removed.
    async fn replace_sharings(
        &self,
        credential_id: &str,
        unshare: &[String],
        share: Vec<SharedCredentials>,
    ) -> CredentialsResult<usize>;

    /// Make `to_project` the owner of a credential in one step, dropping
    /// any previous owner sharing and any user sharing with `to_project`.
    async fn transfer_ownership(&self, credential_id: &str, to_project: &str) -> CredentialsResult<()>;

    async fn find_user(&self, id: Uuid) -> CredentialsResult<Option<User>>;

    async fn find_project(&self, id: &str) -> CredentialsResult<Option<Project>>;

    async fn relations_for_user(&self, user_id: Uuid) -> CredentialsResult<Vec<ProjectRelation>>;

    async fn relations_for_projects(
        &self,
        project_ids: &[String],
    ) -> CredentialsResult<Vec<ProjectRelation>>;

    /// Project that owns a workflow.
    async fn workflow_project(&self, workflow_id: &str) -> CredentialsResult<Option<String>>;
}

#[derive(Default)]
struct MemoryState {
    credentials: HashMap<String, CredentialsEntity>,
    sharings: Vec<SharedCredentials>,
    users: HashMap<Uuid, User>,
    projects: HashMap<String, Project>,
    relations: Vec<ProjectRelation>,
    workflows: HashMap<String, String>,
}

/// In-memory repository (for testing and development).
///
/// All data sits behind one lock, so every write is atomic.
#[derive(Clone, Default)]
pub struct MemoryCredentialsRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCredentialsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn insert_project(&self, project: Project) {
        self.state
            .write()
            .await
            .projects
            .insert(project.id.clone(), project);
    }

    pub async fn insert_relation(&self, relation: ProjectRelation) {
        let mut state = self.state.write().await;
        state
            .relations
            .retain(|r| !(r.project_id == relation.project_id && r.user_id == relation.user_id));
        state.relations.push(relation);
    }

    /// Store `user` with a personal project it owns.
    pub async fn insert_user_with_personal_project(&self, user: User) -> Project {
        let project = Project::personal(user.personal_project_name());
        let relation = ProjectRelation::new(&project.id, user.id, ProjectRole::PersonalOwner);
        let mut state = self.state.write().await;
        state.projects.insert(project.id.clone(), project.clone());
        state.relations.push(relation);
        state.users.insert(user.id, user);
        project
    }

    /// Record that `workflow_id` belongs to `project_id`.
    pub async fn assign_workflow(&self, workflow_id: impl Into<String>, project_id: impl Into<String>) {
        self.state
            .write()
            .await
            .workflows
            .insert(workflow_id.into(), project_id.into());
    }
}

#[async_trait]
impl CredentialsRepository for MemoryCredentialsRepository {
    async fn find_credential(&self, id: &str) -> CredentialsResult<Option<CredentialsEntity>> {
        Ok(self.state.read().await.credentials.get(id).cloned())
    }

    async fn list_credentials(&self) -> CredentialsResult<Vec<CredentialsEntity>> {
        let mut credentials: Vec<_> = self.state.read().await.credentials.values().cloned().collect();
        credentials.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(credentials)
    }

    async fn insert_credential(
        &self,
        credential: &CredentialsEntity,
        owner: SharedCredentials,
    ) -> CredentialsResult<()> {
        let mut state = self.state.write().await;
        state
            .credentials
            .insert(credential.id.clone(), credential.clone());
        state.sharings.push(owner);
        Ok(())
    }

    async fn update_credential(
        &self,
        credential: &CredentialsEntity,
    ) -> CredentialsResult<Option<CredentialsEntity>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.credentials.get_mut(&credential.id) else {
            return Ok(None);
        };
        *stored = credential.clone();
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_credential(&self, id: &str) -> CredentialsResult<bool> {
        let mut state = self.state.write().await;
        state.sharings.retain(|s| s.credentials_id != id);
        Ok(state.credentials.remove(id).is_some())
    }

    async fn sharings_for_credential(
        &self,
        credential_id: &str,
    ) -> CredentialsResult<Vec<SharedCredentials>> {
        Ok(self
            .state
            .read()
            .await
            .sharings
            .iter()
            .filter(|s| s.credentials_id == credential_id)
            .cloned()
            .collect())
    }

    async fn replace_sharings(
        &self,
        credential_id: &str,
        unshare: &[String],
        share: Vec<SharedCredentials>,
    ) -> CredentialsResult<usize> {
        let mut state = self.state.write().await;
        let before = state.sharings.len();
        state.sharings.retain(|s| {
            !(s.credentials_id == credential_id
                && s.role == CredentialSharingRole::User
                && unshare.contains(&s.project_id))
        });
        let removed = before - state.sharings.len();
        for sharing in share {
            let exists = state.sharings.iter().any(|s| {
                s.credentials_id == sharing.credentials_id && s.project_id == sharing.project_id
            });
            if !exists {
                state.sharings.push(sharing);
            }
        }
        Ok(removed)
    }

    async fn transfer_ownership(&self, credential_id: &str, to_project: &str) -> CredentialsResult<()> {
        let mut state = self.state.write().await;
        state.sharings.retain(|s| {
            s.credentials_id != credential_id || !(s.is_owner() || s.project_id == to_project)
        });
        state.sharings.push(SharedCredentials::new(
            credential_id,
            to_project,
            CredentialSharingRole::Owner,
        ));
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> CredentialsResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_project(&self, id: &str) -> CredentialsResult<Option<Project>> {
        Ok(self.state.read().await.projects.get(id).cloned())
    }

    async fn relations_for_user(&self, user_id: Uuid) -> CredentialsResult<Vec<ProjectRelation>> {
        Ok(self
            .state
            .read()
            .await
            .relations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn relations_for_projects(
        &self,
        project_ids: &[String],
    ) -> CredentialsResult<Vec<ProjectRelation>> {
        Ok(self
            .state
            .read()
            .await
            .relations
            .iter()
            .filter(|r| project_ids.contains(&r.project_id))
            .cloned()
            .collect())
    }

    async fn workflow_project(&self, workflow_id: &str) -> CredentialsResult<Option<String>> {
        Ok(self.state.read().await.workflows.get(workflow_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::entities::GlobalRole;

    #[tokio::test]
    async fn test_insert_and_delete_credential() {
        let repo = MemoryCredentialsRepository::new();
        let project = Project::team("Ops");
        let credential = CredentialsEntity::new("Slack", "slackApi", "enc");
        repo.insert_credential(
            &credential,
            SharedCredentials::new(&credential.id, &project.id, CredentialSharingRole::Owner),
        )
        .await
        .unwrap();

        assert_eq!(repo.sharings_for_credential(&credential.id).await.unwrap().len(), 1);
        assert!(repo.delete_credential(&credential.id).await.unwrap());
        assert!(repo.sharings_for_credential(&credential.id).await.unwrap().is_empty());
        assert!(!repo.delete_credential(&credential.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_sharings_keeps_owner() {
        let repo = MemoryCredentialsRepository::new();
        let credential = CredentialsEntity::new("Slack", "slackApi", "enc");
        repo.insert_credential(
            &credential,
            SharedCredentials::new(&credential.id, "owner", CredentialSharingRole::Owner),
        )
        .await
        .unwrap();
        repo.replace_sharings(
            &credential.id,
            &[],
            vec![SharedCredentials::new(&credential.id, "a", CredentialSharingRole::User)],
        )
        .await
        .unwrap();

        let removed = repo
            .replace_sharings(
                &credential.id,
                &["a".to_string(), "owner".to_string()],
                vec![SharedCredentials::new(&credential.id, "b", CredentialSharingRole::User)],
            )
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let mut projects: Vec<_> = repo
            .sharings_for_credential(&credential.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.project_id)
            .collect();
        projects.sort();
        assert_eq!(projects, vec!["b", "owner"]);
    }

    #[tokio::test]
    async fn test_replace_sharings_skips_existing_pairs() {
        let repo = MemoryCredentialsRepository::new();
        let credential = CredentialsEntity::new("Slack", "slackApi", "enc");
        repo.insert_credential(
            &credential,
            SharedCredentials::new(&credential.id, "owner", CredentialSharingRole::Owner),
        )
        .await
        .unwrap();

        let share = || {
            vec![
                SharedCredentials::new(&credential.id, "a", CredentialSharingRole::User),
                SharedCredentials::new(&credential.id, "owner", CredentialSharingRole::User),
            ]
        };
        repo.replace_sharings(&credential.id, &[], share()).await.unwrap();
        repo.replace_sharings(&credential.id, &[], share()).await.unwrap();

        let sharings = repo.sharings_for_credential(&credential.id).await.unwrap();
        assert_eq!(sharings.len(), 2);
        assert!(sharings.iter().any(|s| s.project_id == "owner" && s.is_owner()));
    }

    #[tokio::test]
    async fn test_transfer_ownership() {
        let repo = MemoryCredentialsRepository::new();
        let credential = CredentialsEntity::new("Slack", "slackApi", "enc");
        repo.insert_credential(
            &credential,
            SharedCredentials::new(&credential.id, "old", CredentialSharingRole::Owner),
        )
        .await
        .unwrap();
        repo.replace_sharings(
            &credential.id,
            &[],
            vec![SharedCredentials::new(&credential.id, "new", CredentialSharingRole::User)],
        )
        .await
        .unwrap();

        repo.transfer_ownership(&credential.id, "new").await.unwrap();

        let sharings = repo.sharings_for_credential(&credential.id).await.unwrap();
        assert_eq!(sharings.len(), 1);
        assert_eq!(sharings[0].project_id, "new");
        assert!(sharings[0].is_owner());
    }

    #[tokio::test]
    async fn test_personal_project_seed() {
        let repo = MemoryCredentialsRepository::new();
        let user = User::new("member@example.com", GlobalRole::Member);
        let project = repo.insert_user_with_personal_project(user.clone()).await;

        assert!(project.is_personal());
        let relations = repo.relations_for_user(user.id).await.unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].role, ProjectRole::PersonalOwner);
        assert_eq!(repo.find_user(user.id).await.unwrap(), Some(user));
    }
}
