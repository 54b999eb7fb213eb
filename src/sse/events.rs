//! Stream event types
//!
//! Contains the closed `StreamEvent` enum over every event name the backend
//! emits, plus an `Unknown` variant for names this client does not know yet.

use serde_json::{Map, Value};

use crate::sse::payloads::{
    DataSourcePayload, MessageEndPayload, MessageFilePayload, MessagePayload,
    MessageReplacePayload, TextChunkPayload, ThoughtPayload, TtsPayload, WorkflowPayload,
};

/// Typed events carried by `data:` frames, keyed by the `event` field.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Answer fragment (chat apps)
    Message(MessagePayload),
    /// Answer fragment (agent apps)
    AgentMessage(MessagePayload),
    AgentThought(ThoughtPayload),
    MessageFile(MessageFilePayload),
    MessageEnd(MessageEndPayload),
    MessageReplace(MessageReplacePayload),
    WorkflowStarted(WorkflowPayload),
    WorkflowFinished(WorkflowPayload),
    NodeStarted(WorkflowPayload),
    NodeFinished(WorkflowPayload),
    IterationStarted(WorkflowPayload),
    IterationNext(WorkflowPayload),
    IterationCompleted(WorkflowPayload),
    ParallelBranchStarted(WorkflowPayload),
    ParallelBranchFinished(WorkflowPayload),
    TextChunk(TextChunkPayload),
    TextReplace(TextChunkPayload),
    TtsMessage(TtsPayload),
    TtsMessageEnd(TtsPayload),
    LoopStarted(WorkflowPayload),
    LoopNext(WorkflowPayload),
    LoopCompleted(WorkflowPayload),
    NodeRetry(WorkflowPayload),
    AgentLog(WorkflowPayload),
    WorkflowPaused(WorkflowPayload),
    HumanInputRequired(WorkflowPayload),
    HumanInputFormFilled(WorkflowPayload),
    HumanInputFormTimeout(WorkflowPayload),
    DataSourceProcessing(DataSourcePayload),
    DataSourceCompleted(DataSourcePayload),
    DataSourceError(DataSourcePayload),
    /// Event name not known to this client; ignored by the dispatcher
    Unknown { event: String, payload: Value },
}

impl StreamEvent {
    /// Build a typed event from its wire name and the frame object.
    ///
    /// Names match case-sensitively. Unrecognized names produce
    /// [`StreamEvent::Unknown`]; an error means a known event carried a
    /// field of the wrong JSON type.
    pub fn from_object(event: &str, object: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let value = Value::Object(object);
        let parsed = match event {
            "message" => StreamEvent::Message(serde_json::from_value(value)?),
            "agent_message" => StreamEvent::AgentMessage(serde_json::from_value(value)?),
            "agent_thought" => StreamEvent::AgentThought(serde_json::from_value(value)?),
            "message_file" => StreamEvent::MessageFile(serde_json::from_value(value)?),
            "message_end" => StreamEvent::MessageEnd(serde_json::from_value(value)?),
            "message_replace" => StreamEvent::MessageReplace(serde_json::from_value(value)?),
            "workflow_started" => StreamEvent::WorkflowStarted(serde_json::from_value(value)?),
            "workflow_finished" => StreamEvent::WorkflowFinished(serde_json::from_value(value)?),
            "node_started" => StreamEvent::NodeStarted(serde_json::from_value(value)?),
            "node_finished" => StreamEvent::NodeFinished(serde_json::from_value(value)?),
            "iteration_started" => StreamEvent::IterationStarted(serde_json::from_value(value)?),
            "iteration_next" => StreamEvent::IterationNext(serde_json::from_value(value)?),
            "iteration_completed" => {
                StreamEvent::IterationCompleted(serde_json::from_value(value)?)
            }
            "parallel_branch_started" => {
                StreamEvent::ParallelBranchStarted(serde_json::from_value(value)?)
            }
            "parallel_branch_finished" => {
                StreamEvent::ParallelBranchFinished(serde_json::from_value(value)?)
            }
            "text_chunk" => StreamEvent::TextChunk(serde_json::from_value(value)?),
            "text_replace" => StreamEvent::TextReplace(serde_json::from_value(value)?),
            "tts_message" => StreamEvent::TtsMessage(serde_json::from_value(value)?),
            "tts_message_end" => StreamEvent::TtsMessageEnd(serde_json::from_value(value)?),
            "loop_started" => StreamEvent::LoopStarted(serde_json::from_value(value)?),
            "loop_next" => StreamEvent::LoopNext(serde_json::from_value(value)?),
            "loop_completed" => StreamEvent::LoopCompleted(serde_json::from_value(value)?),
            "node_retry" => StreamEvent::NodeRetry(serde_json::from_value(value)?),
            "agent_log" => StreamEvent::AgentLog(serde_json::from_value(value)?),
            "workflow_paused" => StreamEvent::WorkflowPaused(serde_json::from_value(value)?),
            "human_input_required" => {
                StreamEvent::HumanInputRequired(serde_json::from_value(value)?)
            }
            "human_input_form_filled" => {
                StreamEvent::HumanInputFormFilled(serde_json::from_value(value)?)
            }
            "human_input_form_timeout" => {
                StreamEvent::HumanInputFormTimeout(serde_json::from_value(value)?)
            }
            "datasource_processing" => {
                StreamEvent::DataSourceProcessing(serde_json::from_value(value)?)
            }
            "datasource_completed" => {
                StreamEvent::DataSourceCompleted(serde_json::from_value(value)?)
            }
            "datasource_error" => StreamEvent::DataSourceError(serde_json::from_value(value)?),
            other => StreamEvent::Unknown {
                event: other.to_string(),
                payload: value,
            },
        };
        Ok(parsed)
    }

    /// Wire name of this event.
    pub fn event_type_name(&self) -> &str {
        match self {
            StreamEvent::Message(_) => "message",
            StreamEvent::AgentMessage(_) => "agent_message",
            StreamEvent::AgentThought(_) => "agent_thought",
            StreamEvent::MessageFile(_) => "message_file",
            StreamEvent::MessageEnd(_) => "message_end",
            StreamEvent::MessageReplace(_) => "message_replace",
            StreamEvent::WorkflowStarted(_) => "workflow_started",
            StreamEvent::WorkflowFinished(_) => "workflow_finished",
            StreamEvent::NodeStarted(_) => "node_started",
            StreamEvent::NodeFinished(_) => "node_finished",
            StreamEvent::IterationStarted(_) => "iteration_started",
            StreamEvent::IterationNext(_) => "iteration_next",
            StreamEvent::IterationCompleted(_) => "iteration_completed",
            StreamEvent::ParallelBranchStarted(_) => "parallel_branch_started",
            StreamEvent::ParallelBranchFinished(_) => "parallel_branch_finished",
            StreamEvent::TextChunk(_) => "text_chunk",
            StreamEvent::TextReplace(_) => "text_replace",
            StreamEvent::TtsMessage(_) => "tts_message",
            StreamEvent::TtsMessageEnd(_) => "tts_message_end",
            StreamEvent::LoopStarted(_) => "loop_started",
            StreamEvent::LoopNext(_) => "loop_next",
            StreamEvent::LoopCompleted(_) => "loop_completed",
            StreamEvent::NodeRetry(_) => "node_retry",
            StreamEvent::AgentLog(_) => "agent_log",
            StreamEvent::WorkflowPaused(_) => "workflow_paused",
            StreamEvent::HumanInputRequired(_) => "human_input_required",
            StreamEvent::HumanInputFormFilled(_) => "human_input_form_filled",
            StreamEvent::HumanInputFormTimeout(_) => "human_input_form_timeout",
            StreamEvent::DataSourceProcessing(_) => "datasource_processing",
            StreamEvent::DataSourceCompleted(_) => "datasource_completed",
            StreamEvent::DataSourceError(_) => "datasource_error",
            StreamEvent::Unknown { event, .. } => event,
        }
    }
}

/// Identifiers threaded to the data callback alongside each fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataInfo {
    pub conversation_id: Option<String>,
    pub task_id: Option<String>,
    pub message_id: Option<String>,
    /// Set only for in-band errors and invalid data
    pub error_message: Option<String>,
    pub error_code: Option<String>,
}
