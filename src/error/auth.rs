//! Authentication-related error types.
//!
//! This module defines errors raised while resolving credentials and while
//! refreshing an expired access token.

use crate::traits::StoreError;

/// Authentication-specific error variants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// The credential was still rejected after a refresh and replay.
    #[error("Credential expired")]
    CredentialExpired,

    /// No refresh credential is stored for this session.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The refresh endpoint rejected the refresh credential.
    #[error("Refresh token rejected")]
    RefreshRejected,

    /// The refresh call failed for another reason.
    #[error("Token refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The refresh (or the wait for another refresher) exceeded its deadline.
    #[error("Token refresh timed out after {timeout_ms} ms")]
    RefreshTimeout { timeout_ms: u64 },

    /// Persisted credential entries could not be read or written.
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Check if this error can only be resolved by signing in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            AuthError::CredentialExpired | AuthError::NotAuthenticated | AuthError::RefreshRejected
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::CredentialExpired | AuthError::RefreshRejected => {
                "Your session has expired. Please sign in again.".to_string()
            }
            AuthError::NotAuthenticated => "You are not signed in.".to_string(),
            AuthError::RefreshFailed { .. } => {
                "Could not renew your session. Please try again.".to_string()
            }
            AuthError::RefreshTimeout { .. } => {
                "Renewing your session took too long. Please try again.".to_string()
            }
            AuthError::Store(_) => "Could not access stored credentials.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::CredentialExpired => "E_AUTH_EXPIRED",
            AuthError::NotAuthenticated => "E_AUTH_NONE",
            AuthError::RefreshRejected => "E_AUTH_REJECTED",
            AuthError::RefreshFailed { .. } => "E_AUTH_REFRESH",
            AuthError::RefreshTimeout { .. } => "E_AUTH_TIMEOUT",
            AuthError::Store(_) => "E_AUTH_STORE",
        }
    }
}
