//! Errors surfaced by the lifecycle engine.

use thiserror::Error;

use lustre_auth::CredentialError;
use lustre_core::DomainError;
use lustre_orders::TransitionError;

use crate::store::StoreError;

/// Failure of a lifecycle operation, already classified for callers.
///
/// Every variant maps to exactly one HTTP status in the API layer. Storage
/// failures are reported after the surrounding transaction has been rolled
/// back.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Refused state change; the message names the blocking status.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden")]
    Forbidden,

    #[error("storage failure: {0}")]
    Store(StoreError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl LifecycleError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<DomainError> for LifecycleError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                LifecycleError::Validation(msg)
            }
            DomainError::InvalidTransition(msg) => LifecycleError::InvalidTransition(msg),
            DomainError::NotFound(what) => LifecycleError::NotFound(what),
            DomainError::Conflict(msg) => LifecycleError::Conflict(msg),
        }
    }
}

impl From<TransitionError> for LifecycleError {
    fn from(value: TransitionError) -> Self {
        LifecycleError::InvalidTransition(value.to_string())
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(field) if field == "order_number" => {
                LifecycleError::Conflict("order number already in use; retry the request".to_string())
            }
            StoreError::UniqueViolation(field) => {
                LifecycleError::Conflict(format!("duplicate {field}"))
            }
            StoreError::Concurrency(msg) => LifecycleError::Conflict(msg),
            other => LifecycleError::Store(other),
        }
    }
}
