//! Reqwest-based HTTP client adapter.
//!
//! Production implementation of [`HttpClient`]. Status codes are passed
//! through untouched; classification happens in the request layer.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::traits::{
    Body, FormPart, Headers, HttpClient, HttpError, Method, Request, Response, StreamingResponse,
};

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use flowlink::adapters::ReqwestHttpClient;
/// use flowlink::traits::{HttpClient, Headers};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.get("https://api.example.com/data", &Headers::new()).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else if err.is_body() || err.is_decode() {
            HttpError::Io(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    fn convert_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    fn build_form(parts: Vec<FormPart>) -> Result<reqwest::multipart::Form, HttpError> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    content_type,
                    data,
                } => {
                    let mut file = reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name);
                    if let Some(content_type) = content_type {
                        file = file
                            .mime_str(&content_type)
                            .map_err(|e| HttpError::Other(e.to_string()))?;
                    }
                    form.part(name, file)
                }
            };
        }
        Ok(form)
    }

    /// Build and send a request, returning the unread response.
    async fn send(&self, request: Request) -> Result<reqwest::Response, HttpError> {
        let mut builder = self
            .client
            .request(Self::convert_method(request.method), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        builder = match request.body {
            Body::Empty => builder,
            Body::Text(text) => builder.body(text),
            Body::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        tracing::debug!("{} {}", request.method, request.url);
        builder.send().await.map_err(Self::convert_error)
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let response = self.send(request).await?;

        let status = response.status().as_u16();
        let headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_error)?;

        Ok(Response::with_headers(status, headers, body))
    }

    async fn execute_streaming(&self, request: Request) -> Result<StreamingResponse, HttpError> {
        let response = self.send(request).await?;

        let status = response.status().as_u16();
        let headers = Self::convert_headers(response.headers());
        let body = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout(e.to_string())
                } else {
                    HttpError::Io(e.to_string())
                }
            })
        });

        Ok(StreamingResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
