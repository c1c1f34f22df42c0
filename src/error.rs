//! Error types for the CloudKarafka provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while reconciling CloudKarafka resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The API rejected the request body (HTTP 400).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication failed (HTTP 401).
    #[error("Authentication error: {0}")]
    PermissionDenied(String),

    /// The API answered with a status the operation did not expect.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// A resource never reached its ready state within the attempt budget.
    #[error("Readiness timeout: {0}")]
    ReadinessTimeout(String),

    /// Some operations in a batch failed after others had already been applied.
    #[error("{failed} of {total} operations failed: {}", .messages.join("; "))]
    PartialFailure {
        /// Number of failed operations.
        failed: usize,
        /// Number of attempted operations.
        total: usize,
        /// One message per failure, in attempt order.
        messages: Vec<String>,
    },

    /// A provider configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Invalid request from the host (malformed state, bad import id).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An HTTP transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::PermissionDenied(msg) => msg,
            Self::Api { message, .. } => message,
            Self::ReadinessTimeout(msg) => msg,
            Self::PartialFailure { .. } => "one or more operations failed (see Display output)",
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::InvalidRequest(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Transport(_err) => "transport error (see Debug output)",
        }
    }

    /// Whether this error means the remote entity no longer exists.
    ///
    /// Hosts use this to drop the resource from state instead of failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Summary line used when rendering the error as a diagnostic.
    fn summary(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource not found",
            Self::Validation(_) => "Validation error",
            Self::PermissionDenied(_) => "Authentication error",
            Self::Api { .. } => "API error",
            Self::ReadinessTimeout(_) => "Timed out waiting for resource",
            Self::PartialFailure { .. } => "Partial failure",
            Self::Configuration(_) => "Configuration error",
            Self::UnknownResource(_) => "Unknown resource type",
            Self::InvalidRequest(_) => "Invalid request",
            Self::Serialization(_) => "Serialization error",
            Self::Transport(_) => "Transport error",
        }
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        Diagnostic::error(err.summary()).with_detail(err.to_string())
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Diagnostic::from(&err)
    }
}
