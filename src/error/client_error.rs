//! Unified error type for request and stream operations.
//!
//! `ClientError` is what every public operation of the request layer returns.
//! It wraps the domain errors and adds the HTTP status failure surface.

use super::auth::AuthError;
use super::category::ErrorCategory;
use super::stream::StreamError;
use crate::traits::HttpError;

/// Message used when a failed response carries no usable `message` field.
pub const FALLBACK_SERVER_MESSAGE: &str = "Server Error";

/// Unified error type for the request layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The transport could not complete the exchange.
    #[error("{0}")]
    Transport(HttpError),

    /// The backend answered with a failing status.
    #[error("{message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request exceeded its deadline.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// The event stream ended with an error.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Credential handling failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A successful response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<HttpError> for ClientError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => ClientError::Cancelled,
            other => ClientError::Transport(other),
        }
    }
}

impl ClientError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Transport(_) | ClientError::Timeout { .. } => ErrorCategory::Network,
            ClientError::Status { status, .. } => {
                if *status == 401 {
                    ErrorCategory::Auth
                } else if *status >= 500 {
                    ErrorCategory::Server
                } else {
                    ErrorCategory::Client
                }
            }
            ClientError::Cancelled => ErrorCategory::Cancelled,
            ClientError::Stream(err) => match err {
                StreamError::Transport(_) => ErrorCategory::Network,
                StreamError::Backend { .. } => ErrorCategory::Server,
                StreamError::InvalidData => ErrorCategory::Client,
                StreamError::Cancelled => ErrorCategory::Cancelled,
            },
            ClientError::Auth(_) => ErrorCategory::Auth,
            ClientError::Decode(_) => ErrorCategory::Client,
        }
    }

    /// True when the failure came from a caller-initiated abort.
    ///
    /// Cancellations are never reported through the error notice.
    pub fn is_cancellation(&self) -> bool {
        self.category() == ErrorCategory::Cancelled
    }

    /// HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend error code, if one was reported.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Status { code, .. } => code.as_deref(),
            ClientError::Stream(err) => err.code(),
            _ => None,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) => {
                "Could not reach the server. Please check your connection.".to_string()
            }
            ClientError::Status { message, .. } => message.clone(),
            ClientError::Timeout { .. } => "The request timed out. Please try again.".to_string(),
            ClientError::Cancelled => "The request was cancelled.".to_string(),
            ClientError::Stream(err) => err.user_message(),
            ClientError::Auth(err) => err.user_message(),
            ClientError::Decode(_) => "Received an unreadable response from the server.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "E_NET_TRANSPORT",
            ClientError::Status { .. } => "E_HTTP_STATUS",
            ClientError::Timeout { .. } => "E_NET_TIMEOUT",
            ClientError::Cancelled => "E_CANCELLED",
            ClientError::Stream(err) => err.error_code(),
            ClientError::Auth(err) => err.error_code(),
            ClientError::Decode(_) => "E_DECODE",
        }
    }
}
