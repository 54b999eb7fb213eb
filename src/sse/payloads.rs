//! Stream event payload structs
//!
//! Every field is optional on the wire and text fields may be `null`;
//! deserialization only fails when a field is present with the wrong JSON
//! type.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Read `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `message` / `agent_message` payload: one fragment of the answer text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePayload {
    /// Message id
    pub id: Option<String>,
    pub task_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    /// Answer fragment, still in its on-wire escape form
    #[serde(deserialize_with = "null_as_default")]
    pub answer: String,
    pub created_at: Option<i64>,
}

/// `agent_thought` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThoughtPayload {
    pub id: Option<String>,
    pub task_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    pub position: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub thought: String,
    #[serde(deserialize_with = "null_as_default")]
    pub observation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tool: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tool_input: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message_files: Vec<String>,
}

/// `message_file` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFilePayload {
    pub id: Option<String>,
    pub conversation_id: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub belongs_to: Option<String>,
    pub url: Option<String>,
}

/// `message_end` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageEndPayload {
    pub id: Option<String>,
    pub task_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    /// Usage and retriever resources; shape is backend-defined
    pub metadata: Value,
}

/// `message_replace` payload: replaces the whole answer so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageReplacePayload {
    pub id: Option<String>,
    pub task_id: Option<String>,
    pub conversation_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub answer: String,
}

/// Payload shared by workflow, node, iteration, loop, parallel branch,
/// agent log and human input events.
///
/// Routing only needs the envelope; `data` is handed to the sink as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowPayload {
    pub task_id: Option<String>,
    pub workflow_run_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    pub data: Value,
}

/// Inner data of `text_chunk` / `text_replace`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextChunkData {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub from_variable_selector: Vec<String>,
}

/// `text_chunk` / `text_replace` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextChunkPayload {
    pub task_id: Option<String>,
    pub workflow_run_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub data: TextChunkData,
}

/// `tts_message` / `tts_message_end` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsPayload {
    pub task_id: Option<String>,
    pub message_id: Option<String>,
    /// Base64 audio fragment
    #[serde(deserialize_with = "null_as_default")]
    pub audio: String,
    pub audio_type: Option<String>,
}

/// `datasource_processing` / `datasource_completed` / `datasource_error`
/// payload emitted by data source nodes of pipeline runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourcePayload {
    /// Items to fetch, while processing
    pub total: Option<u64>,
    /// Items fetched so far, while processing
    pub completed: Option<u64>,
    /// Fetched items once completed; shape depends on the data source
    pub data: Value,
    /// Seconds spent, once completed
    pub time_consuming: Option<f64>,
    pub error: Option<String>,
}
