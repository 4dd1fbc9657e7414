//! Store error taxonomy.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::error::ErrorCode;
use crate::net::api::ApiError;

/// Recoverable failures reported by store operations.
///
/// `Clone` so the last one can sit in published state snapshots.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("already a member of this community")]
    AlreadyMember,

    #[error("not a member of this community")]
    NotAMember,

    #[error("the creator cannot leave a community; delete it instead")]
    CreatorCannotLeave,

    #[error("message is empty")]
    EmptyMessage,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("server error (status {status}): {message}")]
    ServerError { status: u16, message: String },
}

impl From<ApiError> for StoreError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(msg) => Self::NotFound(msg),
            ApiError::ValidationFailed(msg) => Self::ValidationFailed(msg),
            ApiError::Unauthorized => Self::Unauthorized,
            ApiError::ServerError { status, message } => Self::ServerError { status, message },
            ApiError::NetworkError(msg) => Self::NetworkError(msg),
            ApiError::InvalidBaseUrl(_) | ApiError::HttpClientBuild(_) => Self::NetworkError(err.to_string()),
        }
    }
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::ValidationFailed(_) => "E_VALIDATION",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::AlreadyMember => "E_ALREADY_MEMBER",
            Self::NotAMember => "E_NOT_A_MEMBER",
            Self::CreatorCannotLeave => "E_CREATOR_CANNOT_LEAVE",
            Self::EmptyMessage => "E_EMPTY_MESSAGE",
            Self::NetworkError(_) => "E_NETWORK",
            Self::ServerError { .. } => "E_SERVER",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::ServerError { status: 429 | 500..=599, .. })
    }
}
