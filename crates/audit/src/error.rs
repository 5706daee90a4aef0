use thiserror::Error;

use campus_auth::{DenialReason, ScopeError};
use campus_core::DomainError;

use crate::store::AuditStoreError;

/// Error returned by the recorder and the aggregator.
///
/// Forbidden and not-found stay distinct kinds even when a transport maps them
/// to similar responses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("access denied: {0}")]
    AuthorizationDenied(DenialReason),

    #[error("{resource_type} '{id}' not found")]
    NotFound { resource_type: String, id: String },

    #[error("duplicate value for '{field}'")]
    ConflictDuplicate { field: String },

    #[error("validation failed: {field} ({rule})")]
    Validation { field: String, rule: String },

    #[error(transparent)]
    TransientStorage(#[from] AuditStoreError),
}

impl AuditError {
    pub fn not_found(resource_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Only storage failures are worth retrying; denials are final.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuditError::TransientStorage(_))
    }
}

impl From<DenialReason> for AuditError {
    fn from(value: DenialReason) -> Self {
        Self::AuthorizationDenied(value)
    }
}

impl From<ScopeError> for AuditError {
    fn from(value: ScopeError) -> Self {
        match value {
            ScopeError::Denied(reason) => Self::AuthorizationDenied(reason),
            ScopeError::Validation { field, rule } => Self::Validation { field, rule },
        }
    }
}

impl From<DomainError> for AuditError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation { field, rule } => Self::Validation { field, rule },
            DomainError::InvalidId(msg) => Self::Validation {
                field: "id".to_string(),
                rule: msg,
            },
            DomainError::NotFound { resource_type, id } => Self::NotFound { resource_type, id },
            DomainError::ConflictDuplicate { field } => Self::ConflictDuplicate { field },
        }
    }
}
