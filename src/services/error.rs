use thiserror::Error;

use crate::auth::IdentityError;
use crate::database::manager::DatabaseError;

/// Failures of the tenant, provisioning and billing services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No bearer token, or the token does not resolve to an identity
    #[error("{0}")]
    Unauthenticated(String),

    /// The caller is known but its profile does not permit the operation
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A multi-step provisioning flow failed after compensation ran
    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    /// Classify a failed write that has already been compensated: duplicate
    /// keys stay conflicts, everything else is a provisioning failure
    pub fn after_compensation(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::ProvisioningFailed(other.to_string()),
        }
    }
}

/// Require a non-blank string field of a request body
pub fn require_field<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ServiceError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("Missing {}", name))),
    }
}
