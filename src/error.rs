//! Error taxonomy for the Kling tool suite.
//!
//! Every error here is converted to user-visible messages at the tool
//! boundary; nothing propagates to the host as an unhandled fault.

use thiserror::Error;

/// Signing the short-lived API token failed.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Failed to sign API token: {0}")]
    Signing(String),

    #[error("Failed to read system clock: {0}")]
    Clock(String),
}

/// Credential validation failures, including the live probe call.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Access Key is required")]
    MissingAccessKey,

    #[error("Secret Key is required")]
    MissingSecretKey,

    #[error("Failed to generate API token: {0}")]
    Token(#[from] TokenError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Unable to reach Kling AI service: {0}")]
    Unreachable(String),

    // 429 from this vendor means quota exhaustion, not rate limiting.
    #[error("Kling AI API error 429: Account balance not enough")]
    InsufficientBalance,

    #[error("Kling AI API error {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Kling AI authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Kling AI API returned non-JSON response")]
    NonJsonResponse,
}

/// Invalid or missing tool parameters.
#[derive(Debug, Clone, Error)]
pub enum ParameterError {
    #[error("{field} must be a valid JSON string")]
    InvalidJson { field: String },

    #[error("{field} has an unsupported parameter type")]
    UnsupportedType { field: String },

    #[error("{field} must be a number")]
    InvalidNumber { field: String },

    #[error("Provide task_id or external_task_id")]
    MissingTaskId,

    #[error("Failed to read media input: {0}")]
    MediaRead(String),
}

/// Outbound HTTP failures before any response body is available.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.to_string())
        }
    }
}
