//! Token refresh endpoint.
//!
//! POST {api_prefix}/refresh-token with `{"refresh_token": ...}`. A success
//! body carries the rotated pair under `data`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::traits::{Body, HttpClient, Method, Request};

/// Content type sent with the refresh call.
const REFRESH_CONTENT_TYPE: &str = "application/json;utf-8";

/// A rotated credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    data: TokenPair,
}

/// Exchanges a refresh token for a new credential pair.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
}

/// [`TokenRefresher`] calling the backend over an [`HttpClient`].
pub struct HttpTokenRefresher {
    http: Arc<dyn HttpClient>,
    api_prefix: String,
}

impl HttpTokenRefresher {
    pub fn new(http: Arc<dyn HttpClient>, api_prefix: impl Into<String>) -> Self {
        Self {
            http,
            api_prefix: api_prefix.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/refresh-token", self.api_prefix.trim_end_matches('/'))
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let body = serde_json::json!({
            "refresh_token": refresh_token,
        });

        let request = Request::new(Method::Post, self.url())
            .with_header("Content-Type", REFRESH_CONTENT_TYPE)
            .with_body(Body::Text(body.to_string()));

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AuthError::RefreshFailed {
                message: e.to_string(),
            })?;

        if response.status == 401 {
            return Err(AuthError::RefreshRejected);
        }

        if !response.is_success() {
            let status = response.status;
            let message = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuthError::RefreshFailed {
                message: format!("status {}: {}", status, message),
            });
        }

        let parsed: RefreshResponse =
            response.json().map_err(|e| AuthError::RefreshFailed {
                message: format!("unreadable refresh response: {}", e),
            })?;
        Ok(parsed.data)
    }
}
