//! Error category classification for unified error handling.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS, timeout and body read failures.
    Network,

    /// Credential expiry and refresh failures.
    /// May require re-authentication.
    Auth,

    /// Backend rejected the call (non-2xx status, in-band stream error).
    Server,

    /// The client could not make sense of what it received.
    Client,

    /// The caller cancelled the operation. Never surfaced to users.
    Cancelled,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
