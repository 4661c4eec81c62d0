#![forbid(unsafe_code)]

use tirelog_contracts::auth::{OperationClass, Role};
use tirelog_contracts::ContractViolation;
use tirelog_engines::attachment::AttachmentError;
use tirelog_storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Admin elevation requested before any credential was configured.
    NoCredential,
    /// Supplied secret does not match the stored digest.
    Mismatch,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCredential => write!(f, "no credential configured"),
            Self::Mismatch => write!(f, "credential mismatch"),
        }
    }
}

/// The full error taxonomy surfaced to collaborators. Every failed
/// operation leaves session and store state untouched; there is no silent
/// recovery and no retry.
#[derive(Debug)]
pub enum OpError {
    Permission { role: Role, class: OperationClass },
    Auth(AuthError),
    NotFound(String),
    Conflict(String),
    Validation(&'static str),
    Contract(ContractViolation),
    Storage(StorageError),
    Format(String),
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permission { role, class } => {
                write!(
                    f,
                    "role {} is not permitted to {}",
                    role.label(),
                    class.label()
                )
            }
            Self::Auth(err) => write!(f, "authentication failed: {err}"),
            Self::NotFound(id) => write!(f, "no record with id {id}"),
            Self::Conflict(id) => {
                write!(f, "record {id} already exists; use update instead")
            }
            Self::Validation(reason) => write!(f, "validation failed: {reason}"),
            Self::Contract(v) => write!(f, "{v}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Format(reason) => write!(f, "format error: {reason}"),
        }
    }
}

impl std::error::Error for OpError {}

impl From<AuthError> for OpError {
    fn from(err: AuthError) -> Self {
        OpError::Auth(err)
    }
}

impl From<ContractViolation> for OpError {
    fn from(v: ContractViolation) -> Self {
        OpError::Contract(v)
    }
}

impl From<StorageError> for OpError {
    fn from(err: StorageError) -> Self {
        OpError::Storage(err)
    }
}

impl From<AttachmentError> for OpError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::UndecodableImage => {
                OpError::Format("input bytes are not a decodable image".to_string())
            }
            AttachmentError::EmptySignature => OpError::Validation("nothing drawn"),
            AttachmentError::Encode(inner) => OpError::Format(inner.to_string()),
            AttachmentError::Contract(v) => OpError::Contract(v),
        }
    }
}
