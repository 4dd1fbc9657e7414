//! Shared error classification.

/// Grepable error code and retryable flag for user-facing error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    /// Whether the same request might succeed if the user re-triggers it.
    /// Informational only; nothing in this crate retries automatically.
    fn retryable(&self) -> bool {
        false
    }
}
