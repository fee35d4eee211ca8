//! Credentials API: ownership-aware access to encrypted credentials.

pub mod cipher;
pub mod controller;
pub mod credential_types;
pub mod entities;
pub mod error;
pub mod naming;
pub mod redaction;
pub mod repository;
pub mod requests;
pub mod service;
pub mod tester;

pub use cipher::{AesGcmCipher, CipherError, CredentialCipher};
pub use credential_types::{CredentialType, CredentialTypes};
pub use entities::{
    CredentialSharingRole, CredentialsEntity, GlobalRole, Project, ProjectRelation, ProjectRole,
    ProjectType, SharedCredentials, User,
};
pub use error::{CredentialsError, CredentialsResult};
pub use repository::{CredentialsRepository, MemoryCredentialsRepository};
pub use service::CredentialsService;
pub use tester::{CredentialTestResult, CredentialTestStatus, CredentialTester, NoTestFunction};
