//! HTTP handlers for `/credentials`.
//!
//! Implements:
//! - GET /credentials
//! - GET /credentials/for-workflow
//! - GET /credentials/new
//! - GET /credentials/:credentialId
//! - POST /credentials/test
//! - POST /credentials
//! - PATCH /credentials/:credentialId
//! - DELETE /credentials/:credentialId
//! - PUT /credentials/:credentialId/share
//! - PUT /credentials/:credentialId/transfer

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::request::Parts,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use super::entities::User;
use super::requests::{
    CreateCredentialRequest, CredentialFilter, CredentialPayload, CredentialResponse,
    CredentialUsage, ForWorkflowParams, GetOneParams, ListQuery, ListQueryParams, NewNameParams,
    NewNameResponse, ShareCredentialRequest, TestCredentialRequest, TransferCredentialRequest,
    UsableCredential,
};
use super::tester::CredentialTestResult;
use crate::config::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::Data;

/// Header carrying the id of the authenticated user.
pub const USER_ID_HEADER: &str = "x-n8n-user-id";

/// The authenticated caller, resolved from [`USER_ID_HEADER`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::Unauthorized("Unauthorized".to_string());

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(unauthorized)?;

        let user = state
            .credentials
            .find_user(user_id)
            .await?
            .ok_or_else(unauthorized)?;
        Ok(Self(user))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_many).post(create_credentials))
        .route("/for-workflow", get(get_project_credentials))
        .route("/new", get(generate_unique_name))
        .route("/test", post(test_credentials))
        .route(
            "/:credential_id",
            get(get_one).patch(update_credentials).delete(delete_credentials),
        )
        .route("/:credential_id/share", put(share_credentials))
        .route("/:credential_id/transfer", put(transfer))
}

/// GET /credentials
async fn get_many(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListQueryParams>,
) -> ApiResult<Json<Data<Vec<CredentialResponse>>>> {
    let query = parse_list_query(&params)?;
    let include_scopes = params.include_scopes.as_deref() == Some("true");
    let credentials = state
        .credentials
        .get_many(&user, &query, include_scopes)
        .await?;
    Ok(Json(Data::new(credentials)))
}

/// GET /credentials/for-workflow
async fn get_project_credentials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ForWorkflowParams>,
) -> ApiResult<Json<Data<Vec<UsableCredential>>>> {
    let usage = match (params.workflow_id, params.project_id) {
        (Some(workflow_id), None) => CredentialUsage::Workflow(workflow_id),
        (None, Some(project_id)) => CredentialUsage::Project(project_id),
        _ => {
            return Err(ApiError::BadRequest(
                "Exactly one of workflowId or projectId is required".to_string(),
            ));
        }
    };
    let credentials = state.credentials.get_for_workflow(&user, &usage).await?;
    Ok(Json(Data::new(credentials)))
}

/// GET /credentials/new
async fn generate_unique_name(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<NewNameParams>,
) -> ApiResult<Json<Data<NewNameResponse>>> {
    let name = state.credentials.unique_name(params.name.as_deref()).await?;
    Ok(Json(Data::new(NewNameResponse { name })))
}

/// GET /credentials/:credentialId
async fn get_one(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(credential_id): Path<String>,
    Query(params): Query<GetOneParams>,
) -> ApiResult<Json<Data<CredentialResponse>>> {
    let include_data = params.include_data.as_deref() == Some("true");
    let credential = state
        .credentials
        .get_one(&user, &credential_id, include_data)
        .await?;
    Ok(Json(Data::new(credential)))
}

/// POST /credentials/test
async fn test_credentials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<TestCredentialRequest>,
) -> ApiResult<Json<Data<CredentialTestResult>>> {
    let result = state.credentials.test(&user, &body.credentials).await?;
    Ok(Json(Data::new(result)))
}

/// POST /credentials
async fn create_credentials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateCredentialRequest>,
) -> ApiResult<Json<Data<CredentialResponse>>> {
    let credential = state.credentials.create(&user, body).await?;
    Ok(Json(Data::new(credential)))
}

/// PATCH /credentials/:credentialId
async fn update_credentials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(credential_id): Path<String>,
    Json(body): Json<CredentialPayload>,
) -> ApiResult<Json<Data<CredentialResponse>>> {
    let credential = state
        .credentials
        .update(&user, &credential_id, body)
        .await?;
    Ok(Json(Data::new(credential)))
}

/// DELETE /credentials/:credentialId
async fn delete_credentials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(credential_id): Path<String>,
) -> ApiResult<Json<Data<bool>>> {
    let deleted = state.credentials.delete(&user, &credential_id).await?;
    Ok(Json(Data::new(deleted)))
}

/// PUT /credentials/:credentialId/share
async fn share_credentials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(credential_id): Path<String>,
    Json(body): Json<ShareCredentialRequest>,
) -> ApiResult<Json<Data<()>>> {
    state
        .credentials
        .share(&user, &credential_id, &body.share_with_ids)
        .await?;
    Ok(Json(Data::new(())))
}

/// PUT /credentials/:credentialId/transfer
async fn transfer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(credential_id): Path<String>,
    Json(body): Json<TransferCredentialRequest>,
) -> ApiResult<Json<Data<()>>> {
    state
        .credentials
        .transfer(&user, &credential_id, &body.destination_project_id)
        .await?;
    Ok(Json(Data::new(())))
}

fn parse_list_query(params: &ListQueryParams) -> ApiResult<ListQuery> {
    let filter = match params.filter.as_deref() {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<CredentialFilter>(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid filter: {}", e)))?,
        _ => CredentialFilter::default(),
    };
    let take = params
        .take
        .as_deref()
        .map(|v| parse_count(v, "take"))
        .transpose()?;
    let skip = params
        .skip
        .as_deref()
        .map(|v| parse_count(v, "skip"))
        .transpose()?
        .unwrap_or(0);
    Ok(ListQuery { filter, take, skip })
}

fn parse_count(value: &str, name: &str) -> ApiResult<usize> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Parameter \"{}\" must be a non-negative integer", name)))
}
