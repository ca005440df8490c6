//! Core error type and result alias
//!
//! Every rejected precondition in the core maps to one of these variants so
//! handlers can surface a distinct, user-facing reason string plus a stable
//! machine code. The taxonomy mirrors the HTTP status classes the API exposes.

use hyper::StatusCode;
use thiserror::Error;

/// Errors produced by the CreatorsLab core
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or invalid bearer identity
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Referenced account/task/relation does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate follow/participation, or already claimed today
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient balance, expired task, capacity reached, self-action
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Malformed or out-of-vocabulary input
    #[error("bad input: {0}")]
    BadInput(String),

    /// MongoDB failure
    #[error("database error: {0}")]
    Database(String),

    /// Identity or chain service unavailable
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Password hashing / token signing failure
    #[error("auth error: {0}")]
    Auth(String),

    /// Malformed HTTP request (body too large, invalid JSON)
    #[error("http error: {0}")]
    Http(String),
}

impl CoreError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::PreconditionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::BadInput(_) => StatusCode::BAD_REQUEST,
            CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::Http(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Unauthenticated(_) => "UNAUTHENTICATED",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            CoreError::BadInput(_) => "BAD_INPUT",
            CoreError::Database(_) => "DB_ERROR",
            CoreError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            CoreError::Auth(_) => "AUTH_ERROR",
            CoreError::Http(_) => "BAD_REQUEST",
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            CoreError::Unauthenticated("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CoreError::NotFound("task".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CoreError::Conflict("already following".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CoreError::PreconditionFailed("insufficient balance".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CoreError::Upstream("rpc down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_code_is_stable() {
        assert_eq!(CoreError::Conflict("x".into()).code(), "CONFLICT");
        assert_eq!(
            CoreError::PreconditionFailed("x".into()).code(),
            "PRECONDITION_FAILED"
        );
        assert_eq!(CoreError::Database("x".into()).code(), "DB_ERROR");
    }

    #[test]
    fn test_display_includes_reason() {
        let err = CoreError::PreconditionFailed("insufficient balance".into());
        assert_eq!(err.to_string(), "precondition failed: insufficient balance");
    }
}
