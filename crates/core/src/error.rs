//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, lookups,
/// conflicts). Authorization denials and storage outages have their own types
/// in the crates that produce them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed a validation rule (e.g. `limit` must be at least 1).
    #[error("validation failed: {field} ({rule})")]
    Validation { field: String, rule: String },

    /// An identifier was malformed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record does not exist.
    #[error("{resource_type} '{id}' not found")]
    NotFound { resource_type: String, id: String },

    /// A unique field is already taken.
    #[error("duplicate value for '{field}'")]
    ConflictDuplicate { field: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            rule: rule.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::ConflictDuplicate {
            field: field.into(),
        }
    }
}
