//! Streaming-related error types.
//!
//! This module defines errors that end an event stream before the transport
//! reports end-of-body.

use crate::traits::HttpError;

/// Message reported when a frame decodes to something other than an object.
pub const INVALID_RESPONSE_DATA: &str = "Invalid response data";

/// Error code paired with [`INVALID_RESPONSE_DATA`].
pub const INVALID_DATA_CODE: &str = "invalid_data";

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    /// A frame held valid JSON that was not an object.
    #[error("{}", INVALID_RESPONSE_DATA)]
    InvalidData,

    /// The backend reported an error inside the stream.
    #[error("{message}")]
    Backend {
        message: String,
        code: Option<String>,
    },

    /// The transport failed while the body was being read.
    #[error("Stream connection lost: {0}")]
    Transport(HttpError),

    /// The caller cancelled the stream.
    #[error("Stream cancelled")]
    Cancelled,
}

impl StreamError {
    /// Error code reported to the data callback, when there is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            StreamError::InvalidData => Some(INVALID_DATA_CODE),
            StreamError::Backend { code, .. } => code.as_deref(),
            StreamError::Transport(_) | StreamError::Cancelled => None,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::InvalidData => {
                "Received invalid data from server. Please try again.".to_string()
            }
            StreamError::Backend { message, .. } => format!("Server error: {}", message),
            StreamError::Transport(_) => {
                "Connection to the server was lost. Please try again.".to_string()
            }
            StreamError::Cancelled => "The request was cancelled.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::InvalidData => "E_STREAM_INVALID",
            StreamError::Backend { .. } => "E_STREAM_BACKEND",
            StreamError::Transport(_) => "E_STREAM_CONN",
            StreamError::Cancelled => "E_STREAM_CANCEL",
        }
    }
}
