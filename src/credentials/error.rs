//! Credential service errors.

use thiserror::Error;

use super::cipher::CipherError;

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Plan lacks license for this feature")]
    Unlicensed,

    #[error("Credential data could not be processed: {0}")]
    Cipher(#[from] CipherError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CredentialsError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Forbidden without further detail.
    pub fn forbidden() -> Self {
        Self::Forbidden("User is missing a scope required to perform this action".to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type CredentialsResult<T> = Result<T, CredentialsError>;
