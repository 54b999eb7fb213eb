//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! use common::{frame, RecordingSink};
//!
//! let mut sink = RecordingSink::default();
//! driver.run(body_of(&[&frame(r#"{"event":"message","answer":"hi"}"#)]), &mut sink).await;
//! assert_eq!(sink.text(), "hi");
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use flowlink::adapters::{InMemoryStore, RecordingObserver, ReqwestHttpClient, SystemClock};
use flowlink::client::ApiClient;
use flowlink::config::ClientConfig;
use flowlink::error::ClientError;
use flowlink::sse::payloads::{MessageEndPayload, TextChunkPayload, ThoughtPayload, WorkflowPayload};
use flowlink::sse::{DataInfo, EventSink};
use flowlink::traits::ByteStream;

/// One callback observed by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Data {
        content: String,
        is_first: bool,
        info: DataInfo,
    },
    Completed {
        has_error: bool,
        message: Option<String>,
    },
    Error(ClientError),
    Thought(String),
    MessageEnd,
    WorkflowStarted,
    NodeStarted(String),
    NodeFinished(String),
    WorkflowFinished,
    TextChunk(String),
}

/// Sink that records every callback in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Recorded>,
}

impl RecordingSink {
    /// Concatenated content of every data callback.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Data { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn data(&self) -> Vec<(String, bool, DataInfo)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Data {
                    content,
                    is_first,
                    info,
                } => Some((content.clone(), *is_first, info.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<(bool, Option<String>)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Completed { has_error, message } => Some((*has_error, message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ClientError> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Error(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }
}

fn node_title(payload: &WorkflowPayload) -> String {
    payload
        .data
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string()
}

impl EventSink for RecordingSink {
    fn on_data(&mut self, content: &str, is_first_message: bool, info: &DataInfo) {
        self.events.push(Recorded::Data {
            content: content.to_string(),
            is_first: is_first_message,
            info: info.clone(),
        });
    }

    fn on_completed(&mut self, has_error: bool, message: Option<&str>) {
        self.events.push(Recorded::Completed {
            has_error,
            message: message.map(str::to_string),
        });
    }

    fn on_error(&mut self, error: &ClientError) {
        self.events.push(Recorded::Error(error.clone()));
    }

    fn on_thought(&mut self, thought: &ThoughtPayload) {
        self.events.push(Recorded::Thought(thought.thought.clone()));
    }

    fn on_message_end(&mut self, _end: &MessageEndPayload) {
        self.events.push(Recorded::MessageEnd);
    }

    fn on_workflow_started(&mut self, _payload: &WorkflowPayload) {
        self.events.push(Recorded::WorkflowStarted);
    }

    fn on_workflow_finished(&mut self, _payload: &WorkflowPayload) {
        self.events.push(Recorded::WorkflowFinished);
    }

    fn on_node_started(&mut self, payload: &WorkflowPayload) {
        self.events.push(Recorded::NodeStarted(node_title(payload)));
    }

    fn on_node_finished(&mut self, payload: &WorkflowPayload) {
        self.events.push(Recorded::NodeFinished(node_title(payload)));
    }

    fn on_text_chunk(&mut self, chunk: &TextChunkPayload) {
        self.events.push(Recorded::TextChunk(chunk.data.text.clone()));
    }
}

/// One `data: ` frame followed by the blank separator line.
pub fn frame(json: &str) -> String {
    format!("data: {}\n\n", json)
}

/// Body yielding each chunk as-is.
pub fn body_of(chunks: Vec<Vec<u8>>) -> ByteStream {
    Box::pin(futures::stream::iter(
        chunks.into_iter().map(|c| Ok(Bytes::from(c))),
    ))
}

/// A session store holding a console access and refresh token.
pub fn signed_in_store() -> InMemoryStore {
    InMemoryStore::with_entries([
        ("console_token", "access-1"),
        ("refresh_token", "refresh-1"),
    ])
}

/// Configuration pointing both prefixes at `server_uri`, with short polls.
pub fn config_for(server_uri: &str) -> ClientConfig {
    ClientConfig::default()
        .with_api_prefix(format!("{}/console/api", server_uri))
        .with_public_api_prefix(format!("{}/api", server_uri))
        .with_refresh_poll_interval(Duration::from_millis(20))
        .with_refresh_timeout(Duration::from_secs(10))
        .with_request_timeout(Duration::from_secs(10))
}

/// Client over real HTTP with the given configuration.
pub fn client_with(config: ClientConfig, store: &InMemoryStore) -> (ApiClient, RecordingObserver) {
    let observer = RecordingObserver::new();
    let client = ApiClient::new(
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(store.clone()),
        Arc::new(SystemClock),
        Arc::new(observer.clone()),
        config,
    );
    (client, observer)
}

/// Client talking to `server_uri` over real HTTP.
pub fn client_for(server_uri: &str, store: &InMemoryStore) -> (ApiClient, RecordingObserver) {
    client_with(config_for(server_uri), store)
}

/// Refresh endpoint body rotating to `access`/`refresh`.
pub fn refresh_body(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "result": "success",
        "data": { "access_token": access, "refresh_token": refresh }
    })
}
