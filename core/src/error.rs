use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Failure talking to an external provider. Callers convert these into a
/// user-visible assistant message or an HTTP error payload at the call
/// boundary; nothing retries and nothing terminates the process.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-2xx response from the provider.
    #[error("provider returned status {status}: {detail}")]
    Http { status: u16, detail: String },
    /// The request never completed (connection, DNS, ...).
    #[error("provider request failed: {0}")]
    Transport(String),
    /// 2xx response whose body was not in the expected shape.
    #[error("provider response was malformed: {0}")]
    MalformedResponse(String),
}

/// Structured error response returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "not_found")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const RATE_LIMITED: &str = "rate_limited";
}
