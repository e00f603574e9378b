//! Backend API error

use serde::Serialize;
use thiserror::Error;

/// Error codes surfaced by the API client
pub mod codes {
    /// No token was available; the request was never sent
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    /// The backend answered 401
    pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
    /// Envelope error without a code
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    /// The request never produced a response
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// The response body was not a readable envelope
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
}

/// Message used when the envelope carries none
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Failure of a backend call
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{message} ({code}, status {status})")]
pub struct ApiError {
    pub message: String,
    pub code: String,
    /// HTTP status; 0 when no response was received
    pub status: u16,
}

impl ApiError {
    pub fn new(message: impl Into<String>, code: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            status,
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new("Authentication required", codes::UNAUTHENTICATED, 401)
    }

    pub fn session_expired() -> Self {
        Self::new("Session expired", codes::SESSION_EXPIRED, 401)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(message, codes::NETWORK_ERROR, 0)
    }

    pub fn invalid_response(message: impl Into<String>, status: u16) -> Self {
        Self::new(message, codes::INVALID_RESPONSE, status)
    }

    /// Build from an envelope error, filling in the generic defaults
    pub fn from_envelope(message: Option<&str>, code: Option<&str>, status: u16) -> Self {
        let message = message.filter(|m| !m.is_empty()).unwrap_or(DEFAULT_ERROR_MESSAGE);
        let code = code.filter(|c| !c.is_empty()).unwrap_or(codes::UNKNOWN_ERROR);
        Self::new(message, code, status)
    }

    /// Whether the failure sent the visitor to the login page
    pub fn is_auth_error(&self) -> bool {
        self.code == codes::UNAUTHENTICATED || self.code == codes::SESSION_EXPIRED
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::network(e.to_string())
    }
}
