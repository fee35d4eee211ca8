//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::credentials::CredentialsError;
use crate::nodes::NodeTypesError;

/// Error returned by every handler.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = json!({
            "code": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<NodeTypesError> for ApiError {
    fn from(err: NodeTypesError) -> Self {
        match err {
            NodeTypesError::UnknownType(_) | NodeTypesError::VersionNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            NodeTypesError::NotUsableAsTool(_) => Self::BadRequest(err.to_string()),
            NodeTypesError::Load(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<CredentialsError> for ApiError {
    fn from(err: CredentialsError) -> Self {
        match err {
            CredentialsError::NotFound(message) => Self::NotFound(message),
            CredentialsError::BadRequest(message) => Self::BadRequest(message),
            CredentialsError::Forbidden(message) => Self::Forbidden(message),
            CredentialsError::Unlicensed => Self::Forbidden(err.to_string()),
            CredentialsError::Cipher(_) | CredentialsError::Storage(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
