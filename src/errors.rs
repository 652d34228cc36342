//! Error types for the advisory pipeline
//!
//! A single closed taxonomy covers everything that can go wrong between
//! building an advisory request and trusting the remote response. Callers
//! branch on the variant (or on `code()` at the JSON boundary), never on
//! message text.

use thiserror::Error;

/// Errors raised by the advisory client and orchestrator.
///
/// The classifier and aggregator never fail; every variant here belongs to
/// the remote-advisory path or to reference-data validation at the boundary.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    /// Bad local setup (missing or malformed credential). Never retryable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad input, local or remote-reported. Not retryable without changing it.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level failure that is not a timeout. Transient.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The hard request deadline elapsed and the connection was aborted.
    #[error("Advisory request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Credential rejected by the remote service (HTTP 401).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote service rate limit (HTTP 429). Retryable after the given delay.
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Requested model unavailable (HTTP 404).
    #[error("Model not available: {model}")]
    Model { model: String },

    /// Response truncated by the token limit (finish_reason "length").
    #[error("Response truncated by token limit")]
    TokenLimit,

    /// Remote response did not match the declared shape. `raw` carries the
    /// offending content for diagnostics.
    #[error("Failed to parse advisory response: {message}")]
    Parse { message: String, raw: String },

    /// Account-level billing problem (HTTP 402).
    #[error("Payment required: {0}")]
    Payment(String),

    /// Any other HTTP error status.
    #[error("Advisory API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// The single collapsed failure the orchestrator exposes at its boundary.
    #[error("Advisory service temporarily unavailable")]
    Unavailable,
}

impl AdvisoryError {
    /// Stable machine-readable code for the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AdvisoryError::Config(_) => "config_error",
            AdvisoryError::Validation(_) => "validation_error",
            AdvisoryError::Network(_) => "network_error",
            AdvisoryError::Timeout { .. } => "timeout",
            AdvisoryError::Auth(_) => "auth_error",
            AdvisoryError::RateLimited { .. } => "rate_limited",
            AdvisoryError::Model { .. } => "model_not_found",
            AdvisoryError::TokenLimit => "token_limit",
            AdvisoryError::Parse { .. } => "parse_error",
            AdvisoryError::Payment(_) => "payment_required",
            AdvisoryError::Api { .. } => "api_error",
            AdvisoryError::Unavailable => "advisory_unavailable",
        }
    }

    /// Structured detail for the error envelope, where a variant carries one.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AdvisoryError::RateLimited { retry_after_secs } => {
                Some(serde_json::json!({ "retry_after_secs": retry_after_secs }))
            }
            AdvisoryError::Model { model } => Some(serde_json::json!({ "model": model })),
            AdvisoryError::Timeout { secs } => Some(serde_json::json!({ "timeout_secs": secs })),
            AdvisoryError::Parse { raw, .. } => Some(serde_json::json!({ "raw": raw })),
            AdvisoryError::Api { status, .. } => Some(serde_json::json!({ "status": status })),
            _ => None,
        }
    }

    /// HTTP status for the JSON error envelope.
    ///
    /// Statuses the remote service reported (401/429/400/404/402 and the
    /// generic passthrough) are preserved verbatim so callers branching on
    /// status keep working; purely local or transport failures map to the
    /// conventional 5xx codes.
    pub fn http_status(&self) -> u16 {
        match self {
            AdvisoryError::Config(_) => 500,
            AdvisoryError::Validation(_) => 400,
            AdvisoryError::Network(_) => 502,
            AdvisoryError::Timeout { .. } => 504,
            AdvisoryError::Auth(_) => 401,
            AdvisoryError::RateLimited { .. } => 429,
            AdvisoryError::Model { .. } => 404,
            AdvisoryError::TokenLimit => 502,
            AdvisoryError::Parse { .. } => 502,
            AdvisoryError::Payment(_) => 402,
            AdvisoryError::Api { status, .. } => *status,
            AdvisoryError::Unavailable => 503,
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdvisoryError::Network(_)
                | AdvisoryError::Timeout { .. }
                | AdvisoryError::RateLimited { .. }
                | AdvisoryError::Unavailable
        )
    }
}

/// Result type alias for advisory operations
pub type Result<T> = std::result::Result<T, AdvisoryError>;
