//! Error types for the relay.
//!
//! Request-path variants carry the exact text returned to the caller, so their
//! `Display` is the bare message. Startup variants (I/O, config parsing) are
//! only ever seen by `main`.

use crate::translate::types::ChatResult;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    /// Malformed or incomplete inbound request. Never reaches a provider.
    #[error("{0}")]
    Validation(String),

    /// `custom` provider selected without an endpoint.
    #[error("{0}")]
    Config(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Provider answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Network failure or an undecodable success body.
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Unexpected(String),

    #[error("Configuration error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RelayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn upstream(status: u16, msg: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: msg.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    /// HTTP classification reported to the caller.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Config(_) | Self::UnsupportedProvider(_) => 400,
            Self::Upstream { status, .. } => *status,
            _ => 500,
        }
    }

    /// Collapse into the caller-facing failure shape.
    #[must_use]
    pub fn into_result(self) -> ChatResult {
        let message = self.to_string();
        if message.trim().is_empty() {
            ChatResult::failure("Internal server error")
        } else {
            ChatResult::failure(message)
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.into_result())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_400() {
        assert_eq!(RelayError::validation("x").status_code(), 400);
        assert_eq!(RelayError::config("x").status_code(), 400);
        assert_eq!(
            RelayError::UnsupportedProvider("mistral".to_string()).status_code(),
            400
        );
    }

    #[test]
    fn test_upstream_status_is_mirrored() {
        let err = RelayError::upstream(429, "slow down");
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_string(), "slow down");
    }

    #[test]
    fn test_transport_is_server_error() {
        assert_eq!(RelayError::transport("connection refused").status_code(), 500);
    }

    #[test]
    fn test_empty_message_falls_back() {
        let result = RelayError::transport("").into_result();
        assert_eq!(result, ChatResult::failure("Internal server error"));
    }

    #[test]
    fn test_unsupported_provider_message() {
        let err = RelayError::UnsupportedProvider("cohere".to_string());
        assert_eq!(err.to_string(), "Unsupported provider: cohere");
    }
}
