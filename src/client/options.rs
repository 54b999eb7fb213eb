//! Per-call request options.

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::auth::CredentialScope;
use crate::traits::{FormPart, Headers, Method};

/// Body of an outgoing call, before serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON text
    Json(Value),
    /// Sent verbatim
    Text(String),
    /// File upload; no JSON content type is set
    Multipart(Vec<FormPart>),
}

/// Caller-held handle that aborts a call.
///
/// Create it before the call, pass a clone in [`RequestOptions`], and call
/// [`CancelHandle::cancel`] at any time. A cancelled call settles with
/// [`ClientError::Cancelled`](crate::error::ClientError::Cancelled).
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token observed by the transport and the stream driver.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Options of one call.
///
/// # Example
///
/// ```ignore
/// use flowlink::client::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::post(json!({"query": "hello"}))
///     .public("AbC123")
///     .silent();
/// ```
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    /// Appended to the URL, percent-encoded, in order
    pub query: Vec<(String, String)>,
    /// Extra headers; override the defaults
    pub headers: Headers,
    /// Which credential authenticates the call
    pub scope: CredentialScope,
    /// Suppress user-facing error notices
    pub silent: bool,
    /// Do not set the JSON content type
    pub skip_content_type: bool,
    pub cancel: Option<CancelHandle>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::Get,
            body: RequestBody::Empty,
            query: Vec::new(),
            headers: Headers::new(),
            scope: CredentialScope::Console,
            silent: false,
            skip_content_type: false,
            cancel: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self::with_method(Method::Post).with_body(RequestBody::Json(body))
    }

    pub fn put(body: Value) -> Self {
        Self::with_method(Method::Put).with_body(RequestBody::Json(body))
    }

    pub fn patch(body: Value) -> Self {
        Self::with_method(Method::Patch).with_body(RequestBody::Json(body))
    }

    pub fn delete() -> Self {
        Self::with_method(Method::Delete)
    }

    /// Multipart upload; implies [`RequestOptions::without_content_type`].
    pub fn upload(parts: Vec<FormPart>) -> Self {
        Self::with_method(Method::Post)
            .with_body(RequestBody::Multipart(parts))
            .without_content_type()
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Authenticate with the public credential of a shared app.
    pub fn public(mut self, share_code: impl Into<String>) -> Self {
        self.scope = CredentialScope::public(share_code);
        self
    }

    pub fn with_scope(mut self, scope: CredentialScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn without_content_type(mut self) -> Self {
        self.skip_content_type = true;
        self
    }

    pub fn with_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    /// Cancellation token for this call; a fresh one if no handle was given.
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel
            .as_ref()
            .map(CancelHandle::token)
            .unwrap_or_default()
    }
}
