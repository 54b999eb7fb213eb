//! Mock HTTP client for testing.
//!
//! Responses are configured per URL. Queued responses are served first, in
//! order; once a URL's queue is empty its fixed response (if any) is served
//! on every call.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::traits::{ByteStream, HttpClient, HttpError, Request, Response, StreamingResponse};

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response
    Success(Response),
    /// Fail before any response arrives
    Error(HttpError),
    /// Return a response whose body arrives in the given chunks
    Stream { status: u16, chunks: Vec<Bytes> },
    /// Return a streamed body that fails after the given chunks
    StreamError {
        status: u16,
        chunks: Vec<Bytes>,
        error: HttpError,
    },
    /// Never answer; useful for cancellation and timeout tests
    Pending,
}

impl MockResponse {
    /// Streamed 200 response built from text chunks.
    pub fn stream<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream {
            status: 200,
            chunks: chunks.into_iter().map(|c| Bytes::from(c.into())).collect(),
        }
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use flowlink::adapters::mock::{MockHttpClient, MockResponse};
/// use flowlink::traits::{HttpClient, Headers, Response};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.example.com/data",
///     MockResponse::Success(Response::new(200, "Hello")),
/// );
///
/// let response = client.get("https://api.example.com/data", &Headers::new()).await?;
/// assert_eq!(response.status, 200);
/// assert_eq!(client.requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// One-shot responses by URL, served in order
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Fixed responses by URL (exact or prefix match)
    fixed: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Response when nothing else matches
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response served for `url` whenever its queue is empty.
    ///
    /// Matches exactly first, then as a URL prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.fixed
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Queue a one-shot response for `url`.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests sent to `url`.
    pub fn requests_to(&self, url: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn next_response(&self, request: Request) -> Option<MockResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        if let Some(queue) = self.queued.lock().unwrap().get_mut(&url) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }

        let fixed = self.fixed.lock().unwrap();
        if let Some(response) = fixed.get(&url) {
            return Some(response.clone());
        }
        for (pattern, response) in fixed.iter() {
            if url.starts_with(pattern.as_str()) {
                return Some(response.clone());
            }
        }
        drop(fixed);

        self.default_response.lock().unwrap().clone()
    }
}

fn chunk_stream(chunks: Vec<Bytes>, error: Option<HttpError>) -> ByteStream {
    let items = chunks
        .into_iter()
        .map(Ok)
        .chain(error.into_iter().map(Err))
        .collect::<Vec<_>>();
    Box::pin(futures::stream::iter(items))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let url = request.url.clone();
        match self.next_response(request) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream { status, chunks }) => Ok(Response::new(status, chunks.concat())),
            Some(MockResponse::StreamError { error, .. }) => Err(error),
            Some(MockResponse::Pending) => futures::future::pending().await,
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }

    async fn execute_streaming(&self, request: Request) -> Result<StreamingResponse, HttpError> {
        let url = request.url.clone();
        match self.next_response(request) {
            Some(MockResponse::Stream { status, chunks }) => {
                Ok(StreamingResponse::new(status, chunk_stream(chunks, None)))
            }
            Some(MockResponse::StreamError {
                status,
                chunks,
                error,
            }) => Ok(StreamingResponse::new(status, chunk_stream(chunks, Some(error)))),
            Some(MockResponse::Success(response)) => Ok(StreamingResponse {
                status: response.status,
                headers: response.headers,
                body: chunk_stream(vec![response.body], None),
            }),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Pending) => futures::future::pending().await,
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
