//! Error types for the repochat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

/// Failures of the Completion Service.
///
/// `Network` and `Timeout` are transport failures, `MalformedResponse` is a
/// protocol failure. Neither is retried by the agent loop.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response from provider: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// The endpoint could not be reached or did not answer in time.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// The endpoint answered, but with something we could not decode.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::MalformedResponse(_))
    }
}

/// Failures inside a tool.
///
/// These never reach the caller of the agent loop: the tool registry renders
/// them as `Error: ...` text that is fed back to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("parameter '{0}' is required")]
    MissingParameter(String),

    #[error("path '{0}' not found")]
    PathNotFound(String),

    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    #[error("'{0}' is a directory, not a file")]
    IsADirectory(String),

    #[error("Sandbox violation: {0}")]
    SandboxViolation(String),

    #[error("{tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("{tool_name} timed out after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 500,
            message: "model crashed".into(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("model crashed"));
    }

    #[test]
    fn provider_error_classification() {
        assert!(ProviderError::Network("refused".into()).is_transport());
        assert!(ProviderError::Timeout("300s".into()).is_transport());
        assert!(!ProviderError::MalformedResponse("eof".into()).is_transport());
        assert!(ProviderError::MalformedResponse("eof".into()).is_protocol());
        assert!(!ProviderError::ApiError { status_code: 404, message: String::new() }.is_protocol());
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = ToolError::IsADirectory("src".into());
        assert_eq!(err.to_string(), "'src' is a directory, not a file");

        let err = ToolError::Timeout {
            tool_name: "history-log".into(),
            timeout_secs: 5,
        };
        assert!(err.to_string().contains("history-log"));
        assert!(err.to_string().contains("5s"));
    }
}
