//! Credential testing capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::entities::User;
use super::requests::CredentialPayload;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CredentialTestStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

/// Outcome of testing a credential against its service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialTestResult {
    pub status: CredentialTestStatus,
    pub message: String,
}

impl CredentialTestResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: CredentialTestStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CredentialTestStatus::Error,
            message: message.into(),
        }
    }
}

/// Runs a credential's test against the service it authenticates to.
///
/// `credentials.data` is already unredacted when this is called.
#[async_trait]
pub trait CredentialTester: Send + Sync {
    async fn test(&self, user: &User, credentials: &CredentialPayload) -> CredentialTestResult;
}

/// Tester used when no node declares a test for a credential type.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTestFunction;

#[async_trait]
impl CredentialTester for NoTestFunction {
    async fn test(&self, _user: &User, _credentials: &CredentialPayload) -> CredentialTestResult {
        CredentialTestResult::error("No testing function found for this credential.")
    }
}
