//! API gateway contract for community resources.
//!
//! DESIGN
//! ======
//! The store only ever talks to [`CommunityApi`]. The production
//! implementation lives in [`super::http`]; tests plug in an in-memory mock.
//! Every call returns either a typed payload or a typed [`ApiError`].
//!
//! AUTH
//! ====
//! The bearer token lives in an explicit [`Session`] handed to the HTTP
//! client at construction. `login`/`logout` are its whole lifecycle.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::{Arc, PoisonError, RwLock};

use super::types::{ChatMessage, Community, CommunityDraft, CommunityPage, Post};
use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Failures surfaced by the community API.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("server error (status {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::ValidationFailed(_) => "E_VALIDATION",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::ServerError { .. } => "E_SERVER",
            Self::NetworkError(_) => "E_NETWORK",
            Self::InvalidBaseUrl(_) => "E_INVALID_BASE_URL",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::ServerError { status: 429 | 500..=599, .. })
    }
}

/// Map a non-success HTTP status and its body to a typed failure.
#[must_use]
pub fn error_from_status(status: u16, body: &str) -> ApiError {
    let message = error_message(body).unwrap_or_else(|| default_reason(status).to_string());
    match status {
        404 => ApiError::NotFound(message),
        400 | 409 | 422 => ApiError::ValidationFailed(message),
        401 | 403 => ApiError::Unauthorized,
        _ => ApiError::ServerError { status, message },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Prefers a JSON `message` or `error` string field, then the raw body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(s)) = map.get(key) {
                if !s.trim().is_empty() {
                    return Some(s.trim().to_string());
                }
            }
        }
    }
    Some(trimmed.to_string())
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not found",
        409 => "conflict",
        422 => "unprocessable entity",
        429 => "too many requests",
        500..=599 => "server error",
        _ => "unexpected status",
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Explicit auth context shared between the login flow and the HTTP client.
#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.login(token);
        session
    }

    pub fn login(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn logout(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

// =============================================================================
// GATEWAY CONTRACT
// =============================================================================

/// Request/response pairs for every community resource the store uses.
#[async_trait::async_trait]
pub trait CommunityApi: Send + Sync {
    /// Fetch one page of the community collection (pages start at 1).
    async fn list_communities(&self, page: u32) -> Result<CommunityPage, ApiError>;

    async fn get_community(&self, id: &str) -> Result<Community, ApiError>;

    async fn create_community(&self, draft: &CommunityDraft) -> Result<Community, ApiError>;

    async fn update_community(&self, id: &str, draft: &CommunityDraft) -> Result<Community, ApiError>;

    async fn delete_community(&self, id: &str) -> Result<(), ApiError>;

    /// Join as the session's user. Returns the updated community.
    async fn join_community(&self, id: &str) -> Result<Community, ApiError>;

    /// Leave as the session's user. Returns the updated community.
    async fn leave_community(&self, id: &str) -> Result<Community, ApiError>;

    async fn community_posts(&self, id: &str) -> Result<Vec<Post>, ApiError>;

    async fn community_chat(&self, id: &str) -> Result<Vec<ChatMessage>, ApiError>;

    async fn send_message(&self, id: &str, content: &str) -> Result<ChatMessage, ApiError>;
}
