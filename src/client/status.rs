//! Terminal status classification and success body decoding.

use bytes::Bytes;
use serde_json::{json, Value};

use crate::error::{ClientError, FALLBACK_SERVER_MESSAGE};
use crate::traits::Response;

/// Content types returned as opaque binary instead of JSON.
const BINARY_CONTENT_TYPES: [&str; 3] = ["application/octet-stream", "audio/mpeg", "application/zip"];

/// How a call should proceed given its response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx/3xx with a body
    Success,
    /// 204: success without a body
    NoContent,
    /// 401: refresh the credential and replay
    CredentialExpired,
    /// 403: surface the server message; may force a sign-in
    Forbidden,
    /// Any other failing status
    Failed,
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        204 => StatusClass::NoContent,
        200..=399 => StatusClass::Success,
        401 => StatusClass::CredentialExpired,
        403 => StatusClass::Forbidden,
        _ => StatusClass::Failed,
    }
}

/// Decoded body of a successful non-streaming call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Download or audio payload
    Binary { content_type: String, bytes: Bytes },
}

impl ResponseBody {
    /// Marker returned for 204 responses.
    pub fn success() -> Self {
        ResponseBody::Json(json!({ "result": "success" }))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Binary { .. } => None,
        }
    }

    /// Decode a successful response.
    ///
    /// An empty body decodes to `null`.
    pub fn from_response(response: &Response) -> Result<Self, ClientError> {
        if response.status == 204 {
            return Ok(Self::success());
        }

        if let Some(content_type) = response.header("content-type") {
            let mime = content_type.split(';').next().unwrap_or("").trim();
            if BINARY_CONTENT_TYPES
                .iter()
                .any(|binary| binary.eq_ignore_ascii_case(mime))
            {
                return Ok(ResponseBody::Binary {
                    content_type: content_type.to_string(),
                    bytes: response.body.clone(),
                });
            }
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ResponseBody::Json(Value::Null));
        }

        response
            .json()
            .map(ResponseBody::Json)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// `code` and `message` of a failing response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// `None` when the body is not a JSON object.
    pub fn parse(response: &Response) -> Option<Self> {
        let value: Value = response.json().ok()?;
        let object = value.as_object()?;
        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Some(Self {
            code: field("code"),
            message: field("message"),
        })
    }

    /// Message to show, falling back to the generic server error text.
    pub fn display_message(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => FALLBACK_SERVER_MESSAGE.to_string(),
        }
    }
}
