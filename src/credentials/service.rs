//! Credentials service - access checks, validation and orchestration of
//! repository, cipher and tester for the credentials API.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::cipher::CredentialCipher;
use super::credential_types::CredentialTypes;
use super::entities::{
    scopes, CredentialSharingRole, CredentialsEntity, Project, ProjectRelation, ProjectRole,
    SharedCredentials, User,
};
use super::error::{CredentialsError, CredentialsResult};
use super::naming::unique_credential_name;
use super::redaction::{redact, unredact};
use super::repository::CredentialsRepository;
use super::requests::{
    CreateCredentialRequest, CredentialPayload, CredentialResponse, CredentialUsage, ListQuery,
    ProjectSummary, UsableCredential,
};
use super::tester::{CredentialTestResult, CredentialTester, NoTestFunction};

/// Target for domain events.
pub const EVENTS_TARGET: &str = "n8n::events";

pub const DEFAULT_CREDENTIAL_NAME: &str = "My credentials";

const NAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=128;
const TYPE_LENGTH: std::ops::RangeInclusive<usize> = 1..=128;

/// A credential the caller can reach, with its sharings and the caller's scopes.
struct Accessible {
    credential: CredentialsEntity,
    sharings: Vec<SharedCredentials>,
    scopes: BTreeSet<&'static str>,
}

impl Accessible {
    fn has(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    fn owner_project_id(&self) -> Option<&str> {
        owner_project_id(&self.sharings)
    }
}

pub struct CredentialsService {
    repository: Arc<dyn CredentialsRepository>,
    cipher: Arc<dyn CredentialCipher>,
    tester: Arc<dyn CredentialTester>,
    credential_types: CredentialTypes,
    default_name: String,
    sharing_enabled: bool,
}

impl CredentialsService {
    pub fn new(repository: Arc<dyn CredentialsRepository>, cipher: Arc<dyn CredentialCipher>) -> Self {
        Self {
            repository,
            cipher,
            tester: Arc::new(NoTestFunction),
            credential_types: CredentialTypes::builtin(),
            default_name: DEFAULT_CREDENTIAL_NAME.to_string(),
            sharing_enabled: true,
        }
    }

    pub fn with_tester(mut self, tester: Arc<dyn CredentialTester>) -> Self {
        self.tester = tester;
        self
    }

    pub fn with_credential_types(mut self, credential_types: CredentialTypes) -> Self {
        self.credential_types = credential_types;
        self
    }

    pub fn with_default_name(mut self, default_name: impl Into<String>) -> Self {
        self.default_name = default_name.into();
        self
    }

    /// Whether the instance is licensed for credential sharing.
    pub fn with_sharing_enabled(mut self, enabled: bool) -> Self {
        self.sharing_enabled = enabled;
        self
    }

    pub async fn find_user(&self, id: Uuid) -> CredentialsResult<Option<User>> {
        self.repository.find_user(id).await
    }

    /// Scopes `user` holds on the credential, sorted.
    pub async fn get_credential_scopes(
        &self,
        user: &User,
        credential_id: &str,
    ) -> CredentialsResult<Vec<String>> {
        let sharings = self.repository.sharings_for_credential(credential_id).await?;
        let relations = self.repository.relations_for_user(user.id).await?;
        Ok(scope_list(&credential_scopes(user, &sharings, &relations)))
    }

    /// Credentials `user` can read, filtered and paginated.
    pub async fn get_many(
        &self,
        user: &User,
        query: &ListQuery,
        include_scopes: bool,
    ) -> CredentialsResult<Vec<CredentialResponse>> {
        let relations = self.repository.relations_for_user(user.id).await?;
        let filter = &query.filter;
        let name_filter = filter.name.as_ref().map(|n| n.to_lowercase());
        let type_filter = filter.credential_type.as_ref().map(|t| t.to_lowercase());

        let mut matching = Vec::new();
        for credential in self.repository.list_credentials().await? {
            if let Some(name) = &name_filter {
                if !credential.name.to_lowercase().contains(name.as_str()) {
                    continue;
                }
            }
            if let Some(credential_type) = &type_filter {
                if !credential.credential_type.to_lowercase().contains(credential_type.as_str()) {
                    continue;
                }
            }

            let sharings = self.repository.sharings_for_credential(&credential.id).await?;
            if let Some(project_id) = &filter.project_id {
                if !sharings.iter().any(|s| &s.project_id == project_id) {
                    continue;
                }
            }

            let granted = credential_scopes(user, &sharings, &relations);
            if !granted.contains(scopes::READ) {
                continue;
            }
            matching.push(Accessible {
                credential,
                sharings,
                scopes: granted,
            });
        }

        let page = matching
            .into_iter()
            .skip(query.skip)
            .take(query.take.unwrap_or(usize::MAX));

        let mut result = Vec::new();
        for accessible in page {
            let mut response = self.describe(&accessible.credential, &accessible.sharings).await?;
            if include_scopes {
                response.scopes = Some(scope_list(&accessible.scopes));
            }
            result.push(response);
        }
        Ok(result)
    }

    /// Credentials `user` may use in a workflow or project.
    ///
    /// This is the intersection of what the user can read and what the
    /// project has access to.
    pub async fn get_for_workflow(
        &self,
        user: &User,
        usage: &CredentialUsage,
    ) -> CredentialsResult<Vec<UsableCredential>> {
        let project_id = match usage {
            CredentialUsage::Workflow(workflow_id) => self
                .repository
                .workflow_project(workflow_id)
                .await?
                .ok_or_else(|| {
                    CredentialsError::not_found(format!(
                        "Workflow with ID \"{}\" could not be found.",
                        workflow_id
                    ))
                })?,
            CredentialUsage::Project(project_id) => project_id.clone(),
        };

        let project_sees_all = self.project_has_global_access(&project_id).await?;
        let relations = self.repository.relations_for_user(user.id).await?;

        let mut usable = Vec::new();
        for credential in self.repository.list_credentials().await? {
            let sharings = self.repository.sharings_for_credential(&credential.id).await?;
            let in_project = project_sees_all || sharings.iter().any(|s| s.project_id == project_id);
            if !in_project {
                continue;
            }
            let granted = credential_scopes(user, &sharings, &relations);
            if !granted.contains(scopes::READ) {
                continue;
            }
            usable.push(UsableCredential {
                id: credential.id,
                name: credential.name,
                credential_type: credential.credential_type,
                scopes: scope_list(&granted),
                is_managed: credential.is_managed,
            });
        }
        Ok(usable)
    }

    /// A credential name based on `requested` (or the default name) that is not taken.
    pub async fn unique_name(&self, requested: Option<&str>) -> CredentialsResult<String> {
        let requested = requested.unwrap_or(&self.default_name);
        let credentials = self.repository.list_credentials().await?;
        Ok(unique_credential_name(
            requested,
            credentials.iter().map(|c| c.name.as_str()),
        ))
    }

    /// One credential with the caller's scopes.
    ///
    /// The decrypted payload is included, redacted, only when asked for and
    /// when the caller may update the credential.
    pub async fn get_one(
        &self,
        user: &User,
        credential_id: &str,
        include_data: bool,
    ) -> CredentialsResult<CredentialResponse> {
        let Some(credential) = self.repository.find_credential(credential_id).await? else {
            return Err(CredentialsError::not_found(format!(
                "Credential with ID \"{}\" could not be found.",
                credential_id
            )));
        };
        let sharings = self.repository.sharings_for_credential(credential_id).await?;
        let relations = self.repository.relations_for_user(user.id).await?;
        let granted = credential_scopes(user, &sharings, &relations);
        if !granted.contains(scopes::READ) {
            return Err(CredentialsError::forbidden());
        }

        let mut response = self.describe(&credential, &sharings).await?;
        if include_data && granted.contains(scopes::UPDATE) {
            let decrypted = self.decrypt(&credential)?;
            response.data = Some(redact(
                &decrypted,
                self.credential_types.get(&credential.credential_type),
            ));
        }
        response.scopes = Some(self.get_credential_scopes(user, credential_id).await?);
        Ok(response)
    }

    /// Test a credential with the configured tester.
    ///
    /// Callers without update access get the stored payload in place of
    /// theirs; placeholders are then restored from the stored payload.
    pub async fn test(
        &self,
        user: &User,
        credentials: &CredentialPayload,
    ) -> CredentialsResult<CredentialTestResult> {
        let credential_id = credentials.id.as_deref().unwrap_or_default();
        let Some(stored) = self
            .find_credential_for_user(user, credential_id, scopes::READ)
            .await?
        else {
            return Err(CredentialsError::forbidden());
        };

        let decrypted = self.decrypt(&stored.credential)?;
        let mut merged = credentials.clone();
        if !stored.has(scopes::UPDATE) {
            merged.data = Some(decrypted.clone());
        }
        if let Some(data) = &merged.data {
            merged.data = Some(unredact(data, &decrypted));
        }

        Ok(self.tester.test(user, &merged).await)
    }

    /// Create a credential owned by the given project, or by the caller's
    /// personal project.
    pub async fn create(
        &self,
        user: &User,
        request: CreateCredentialRequest,
    ) -> CredentialsResult<CredentialResponse> {
        validate_name_and_type(&request.name, &request.credential_type)?;
        let Value::Object(data) = request.data else {
            return Err(CredentialsError::bad_request("data must be an object"));
        };

        let relations = self.repository.relations_for_user(user.id).await?;
        let project = match &request.project_id {
            Some(project_id) => {
                let project = self.repository.find_project(project_id).await?;
                match project {
                    Some(project) if can_create_in(user, &relations, &project.id) => project,
                    _ => {
                        return Err(CredentialsError::bad_request(
                            "You don't have the permissions to save the credential in this project.",
                        ));
                    }
                }
            }
            None => self.personal_project(user, &relations).await?,
        };

        let encrypted = self.cipher.encrypt(&Value::Object(data))?;
        let credential = CredentialsEntity::new(request.name, request.credential_type, encrypted);
        let owner = SharedCredentials::new(&credential.id, &project.id, CredentialSharingRole::Owner);
        self.repository.insert_credential(&credential, owner.clone()).await?;

        info!(
            target: EVENTS_TARGET,
            user_id = %user.id,
            credential_type = %credential.credential_type,
            credential_id = %credential.id,
            public_api = false,
            project_id = %project.id,
            project_type = ?project.project_type,
            "credentials-created"
        );

        let sharings = vec![owner];
        let mut response = self.describe(&credential, &sharings).await?;
        response.scopes = Some(self.get_credential_scopes(user, &credential.id).await?);
        Ok(response)
    }

    /// Update name, type or payload of a credential.
    ///
    /// Placeholders in the new payload keep their stored values, and stored
    /// OAuth token data is never overwritten.
    pub async fn update(
        &self,
        user: &User,
        credential_id: &str,
        update: CredentialPayload,
    ) -> CredentialsResult<CredentialResponse> {
        let Some(stored) = self
            .find_credential_for_user(user, credential_id, scopes::UPDATE)
            .await?
        else {
            info!(
                credential_id,
                user_id = %user.id,
                "Attempt to update credential blocked due to lack of permissions"
            );
            return Err(CredentialsError::not_found(
                "Credential to be updated not found. You can only update credentials owned by you",
            ));
        };

        let decrypted = self.decrypt(&stored.credential)?;
        let mut updated = stored.credential.clone();
        if let Some(name) = update.name {
            updated.name = name;
        }
        if let Some(credential_type) = update.credential_type {
            updated.credential_type = credential_type;
        }
        validate_name_and_type(&updated.name, &updated.credential_type)?;

        let data = match update.data {
            Some(data) => {
                let mut data = unredact(&data, &decrypted);
                if let Some(token) = decrypted.get("oauthTokenData") {
                    data.insert("oauthTokenData".to_string(), token.clone());
                }
                data
            }
            None => decrypted,
        };
        updated.data = self.cipher.encrypt(&Value::Object(data))?;

        let Some(saved) = self.repository.update_credential(&updated).await? else {
            return Err(CredentialsError::not_found(format!(
                "Credential ID \"{}\" could not be found to be updated.",
                credential_id
            )));
        };
        debug!(credential_id, "Credential updated");

        info!(
            target: EVENTS_TARGET,
            user_id = %user.id,
            credential_type = %saved.credential_type,
            credential_id = %saved.id,
            "credentials-updated"
        );

        let mut response = self.describe(&saved, &stored.sharings).await?;
        response.scopes = Some(self.get_credential_scopes(user, &saved.id).await?);
        Ok(response)
    }

    pub async fn delete(&self, user: &User, credential_id: &str) -> CredentialsResult<bool> {
        let Some(stored) = self
            .find_credential_for_user(user, credential_id, scopes::DELETE)
            .await?
        else {
            info!(
                credential_id,
                user_id = %user.id,
                "Attempt to delete credential blocked due to lack of permissions"
            );
            return Err(CredentialsError::not_found(
                "Credential to be deleted not found. You can only removed credentials owned by you",
            ));
        };

        self.repository.delete_credential(credential_id).await?;

        info!(
            target: EVENTS_TARGET,
            user_id = %user.id,
            credential_type = %stored.credential.credential_type,
            credential_id = %stored.credential.id,
            "credentials-deleted"
        );
        Ok(true)
    }

    /// Set the projects a credential is shared with to exactly `share_with_ids`.
    ///
    /// The owning project and unknown projects are never added.
    pub async fn share(
        &self,
        user: &User,
        credential_id: &str,
        share_with_ids: &Value,
    ) -> CredentialsResult<()> {
        if !self.sharing_enabled {
            return Err(CredentialsError::Unlicensed);
        }
        let requested = parse_share_ids(share_with_ids)?;

        let Some(stored) = self
            .find_credential_for_user(user, credential_id, scopes::SHARE)
            .await?
        else {
            return Err(CredentialsError::forbidden());
        };

        let current: Vec<String> = stored
            .sharings
            .iter()
            .filter(|s| s.role == CredentialSharingRole::User)
            .map(|s| s.project_id.clone())
            .collect();
        let to_unshare: Vec<String> = current
            .iter()
            .filter(|id| !requested.contains(id))
            .cloned()
            .collect();

        let owner = stored.owner_project_id();
        let mut to_share = Vec::new();
        for project_id in requested.iter().filter(|id| !current.contains(id)) {
            if Some(project_id.as_str()) == owner || to_share.contains(project_id) {
                continue;
            }
            if self.repository.find_project(project_id).await?.is_some() {
                to_share.push(project_id.clone());
            }
        }

        let new_sharings = to_share
            .iter()
            .map(|project_id| SharedCredentials::new(credential_id, project_id, CredentialSharingRole::User))
            .collect();
        let removed = self
            .repository
            .replace_sharings(credential_id, &to_unshare, new_sharings)
            .await?;

        info!(
            target: EVENTS_TARGET,
            user_id = %user.id,
            credential_type = %stored.credential.credential_type,
            credential_id = %stored.credential.id,
            user_id_sharer = %user.id,
            sharees_added = ?to_share,
            sharees_removed = removed,
            "credentials-shared"
        );

        let notified: Vec<Uuid> = self
            .repository
            .relations_for_projects(&to_share)
            .await?
            .into_iter()
            .filter(|r| r.role == ProjectRole::PersonalOwner)
            .map(|r| r.user_id)
            .collect();
        if !notified.is_empty() {
            info!(
                credential_name = %stored.credential.name,
                sharer = %user.id,
                new_sharees = ?notified,
                "Notifying users about shared credential"
            );
        }
        Ok(())
    }

    /// Move ownership of a credential to another project.
    pub async fn transfer(
        &self,
        user: &User,
        credential_id: &str,
        destination_project_id: &str,
    ) -> CredentialsResult<()> {
        let Some(stored) = self
            .find_credential_for_user(user, credential_id, scopes::MOVE)
            .await?
        else {
            return Err(CredentialsError::not_found(format!(
                "Could not find the credential with the id \"{}\". Make sure you have the permission to move it.",
                credential_id
            )));
        };

        let relations = self.repository.relations_for_user(user.id).await?;
        let destination = self.repository.find_project(destination_project_id).await?;
        if !destination.is_some_and(|p| can_create_in(user, &relations, &p.id)) {
            return Err(CredentialsError::not_found(format!(
                "Could not find project with the id \"{}\". Make sure you have the permission to create credentials in it.",
                destination_project_id
            )));
        }

        if stored.owner_project_id() == Some(destination_project_id) {
            return Err(CredentialsError::bad_request(
                "You can't transfer a credential into the project that's already owning it.",
            ));
        }

        self.repository
            .transfer_ownership(credential_id, destination_project_id)
            .await?;
        debug!(
            credential_id,
            from = ?stored.owner_project_id(),
            to = destination_project_id,
            "Credential transferred"
        );
        Ok(())
    }

    async fn find_credential_for_user(
        &self,
        user: &User,
        credential_id: &str,
        scope: &str,
    ) -> CredentialsResult<Option<Accessible>> {
        let Some(credential) = self.repository.find_credential(credential_id).await? else {
            return Ok(None);
        };
        let sharings = self.repository.sharings_for_credential(credential_id).await?;
        let relations = self.repository.relations_for_user(user.id).await?;
        let granted = credential_scopes(user, &sharings, &relations);
        if !granted.contains(scope) {
            return Ok(None);
        }
        Ok(Some(Accessible {
            credential,
            sharings,
            scopes: granted,
        }))
    }

    async fn personal_project(
        &self,
        user: &User,
        relations: &[ProjectRelation],
    ) -> CredentialsResult<Project> {
        let personal = relations
            .iter()
            .find(|r| r.role == ProjectRole::PersonalOwner)
            .map(|r| r.project_id.as_str());
        match personal {
            Some(project_id) => self
                .repository
                .find_project(project_id)
                .await?
                .ok_or_else(|| CredentialsError::not_found("No personal project found")),
            None => {
                debug!(user_id = %user.id, "User has no personal project");
                Err(CredentialsError::not_found("No personal project found"))
            }
        }
    }

    /// Whether a project is the personal project of a global owner or admin.
    async fn project_has_global_access(&self, project_id: &str) -> CredentialsResult<bool> {
        let relations = self
            .repository
            .relations_for_projects(&[project_id.to_string()])
            .await?;
        for relation in relations.iter().filter(|r| r.role == ProjectRole::PersonalOwner) {
            if let Some(owner) = self.repository.find_user(relation.user_id).await? {
                if owner.has_global_credential_access() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn describe(
        &self,
        credential: &CredentialsEntity,
        sharings: &[SharedCredentials],
    ) -> CredentialsResult<CredentialResponse> {
        let mut response = CredentialResponse::from(credential);
        for sharing in sharings {
            let Some(project) = self.repository.find_project(&sharing.project_id).await? else {
                continue;
            };
            match sharing.role {
                CredentialSharingRole::Owner => {
                    response.home_project = Some(ProjectSummary::from(&project));
                }
                CredentialSharingRole::User => {
                    response.shared_with_projects.push(ProjectSummary::from(&project));
                }
            }
        }
        Ok(response)
    }

    fn decrypt(&self, credential: &CredentialsEntity) -> CredentialsResult<Map<String, Value>> {
        match self.cipher.decrypt(&credential.data)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Scopes `user` holds on a credential with the given sharings.
///
/// Global owners and admins hold every scope. Everyone else gets the union
/// over the sharings whose project they belong to: an owning project grants
/// what the member's project role allows, a sharing grants read access.
pub fn credential_scopes(
    user: &User,
    sharings: &[SharedCredentials],
    relations: &[ProjectRelation],
) -> BTreeSet<&'static str> {
    if user.has_global_credential_access() {
        return scopes::ALL.iter().copied().collect();
    }

    let mut granted = BTreeSet::new();
    for sharing in sharings {
        for relation in relations.iter().filter(|r| r.project_id == sharing.project_id) {
            match sharing.role {
                CredentialSharingRole::Owner => {
                    granted.extend(relation.role.owned_credential_scopes().iter().copied());
                }
                CredentialSharingRole::User => {
                    granted.insert(scopes::READ);
                }
            }
        }
    }
    granted
}

fn scope_list(scopes: &BTreeSet<&'static str>) -> Vec<String> {
    scopes.iter().map(|s| s.to_string()).collect()
}

fn owner_project_id(sharings: &[SharedCredentials]) -> Option<&str> {
    sharings
        .iter()
        .find(|s| s.is_owner())
        .map(|s| s.project_id.as_str())
}

fn can_create_in(user: &User, relations: &[ProjectRelation], project_id: &str) -> bool {
    user.has_global_credential_access()
        || relations
            .iter()
            .any(|r| r.project_id == project_id && r.role.can_create_credentials())
}

fn validate_name_and_type(name: &str, credential_type: &str) -> CredentialsResult<()> {
    if !NAME_LENGTH.contains(&name.chars().count()) {
        return Err(CredentialsError::bad_request(
            "Credential name must be 3 to 128 characters long.",
        ));
    }
    if !TYPE_LENGTH.contains(&credential_type.chars().count()) {
        return Err(CredentialsError::bad_request(
            "Credential type must be 1 to 128 characters long.",
        ));
    }
    Ok(())
}

fn parse_share_ids(value: &Value) -> CredentialsResult<Vec<String>> {
    let bad_request = || CredentialsError::bad_request("Bad request");
    value
        .as_array()
        .ok_or_else(bad_request)?
        .iter()
        .map(|id| id.as_str().map(str::to_string).ok_or_else(bad_request))
        .collect()
}
