//! Client configuration parsed from environment variables.

use crate::net::types::CurrentUser;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_TOKEN_ENV: &str = "PETHAVEN_TOKEN";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(&'static str),
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub user: CurrentUser,
    /// Bearer token read through the variable named by `PETHAVEN_TOKEN_ENV`.
    pub token: Option<String>,
    pub timeouts: HttpTimeouts,
    pub page_size: usize,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Required:
    /// - `PETHAVEN_USER_ID`
    ///
    /// Optional:
    /// - `PETHAVEN_API_BASE_URL`: default `http://127.0.0.1:5000/api`
    /// - `PETHAVEN_USER_NAME`
    /// - `PETHAVEN_TOKEN_ENV`: names the env var holding the token, default `PETHAVEN_TOKEN`
    /// - `PETHAVEN_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PETHAVEN_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PETHAVEN_PAGE_SIZE`: default 12, must be non-zero
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] without a user id and
    /// [`ConfigError::Parse`] for a zero or malformed page size.
    pub fn from_env() -> Result<Self, ConfigError> {
        let id = env_non_empty("PETHAVEN_USER_ID").ok_or(ConfigError::MissingVar("PETHAVEN_USER_ID"))?;
        let user = CurrentUser { id, name: env_non_empty("PETHAVEN_USER_NAME") };

        let api_base_url = normalize_base_url(
            &env_non_empty("PETHAVEN_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        );

        let token_var = env_non_empty("PETHAVEN_TOKEN_ENV").unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());
        let token = env_non_empty(&token_var);

        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("PETHAVEN_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("PETHAVEN_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let page_size = parse_page_size(env_non_empty("PETHAVEN_PAGE_SIZE").as_deref())?;

        Ok(Self { api_base_url, user, token, timeouts, page_size })
    }
}

#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn env_non_empty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    match env_non_empty(key).map(|v| v.parse::<u64>()) {
        Some(Ok(value)) => value,
        _ => default,
    }
}

fn parse_page_size(raw: Option<&str>) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_PAGE_SIZE);
    };
    match raw.parse::<usize>() {
        Ok(0) => Err(ConfigError::Parse("PETHAVEN_PAGE_SIZE must be greater than zero".into())),
        Ok(size) => Ok(size),
        Err(e) => Err(ConfigError::Parse(format!("invalid PETHAVEN_PAGE_SIZE '{raw}': {e}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
