//! Caller-facing event sink
//!
//! One method per stream event. Every method has an empty default body, so
//! a sink only implements the events it cares about; the rest are dropped.

use crate::error::ClientError;
use crate::sse::events::DataInfo;
use crate::sse::payloads::{
    DataSourcePayload, MessageEndPayload, MessageFilePayload, MessageReplacePayload,
    TextChunkPayload, ThoughtPayload, TtsPayload, WorkflowPayload,
};

/// Receives decoded stream events in wire order.
///
/// Methods are called from the task driving the stream, one at a time.
#[allow(unused_variables)]
pub trait EventSink: Send {
    /// Answer fragment, or an empty fragment carrying recovery/error info.
    fn on_data(&mut self, content: &str, is_first_message: bool, info: &DataInfo) {}

    /// Stream ended. Called at most once, never after cancellation.
    fn on_completed(&mut self, has_error: bool, message: Option<&str>) {}

    /// Transport failure, failing status, or cancellation.
    fn on_error(&mut self, error: &ClientError) {}

    fn on_thought(&mut self, thought: &ThoughtPayload) {}
    fn on_file(&mut self, file: &MessageFilePayload) {}
    fn on_message_end(&mut self, end: &MessageEndPayload) {}
    fn on_message_replace(&mut self, replace: &MessageReplacePayload) {}

    fn on_workflow_started(&mut self, payload: &WorkflowPayload) {}
    fn on_workflow_finished(&mut self, payload: &WorkflowPayload) {}
    fn on_node_started(&mut self, payload: &WorkflowPayload) {}
    fn on_node_finished(&mut self, payload: &WorkflowPayload) {}
    fn on_node_retry(&mut self, payload: &WorkflowPayload) {}
    fn on_iteration_started(&mut self, payload: &WorkflowPayload) {}
    fn on_iteration_next(&mut self, payload: &WorkflowPayload) {}
    fn on_iteration_finished(&mut self, payload: &WorkflowPayload) {}
    fn on_loop_started(&mut self, payload: &WorkflowPayload) {}
    fn on_loop_next(&mut self, payload: &WorkflowPayload) {}
    fn on_loop_finished(&mut self, payload: &WorkflowPayload) {}
    fn on_parallel_branch_started(&mut self, payload: &WorkflowPayload) {}
    fn on_parallel_branch_finished(&mut self, payload: &WorkflowPayload) {}
    fn on_agent_log(&mut self, payload: &WorkflowPayload) {}
    fn on_workflow_paused(&mut self, payload: &WorkflowPayload) {}
    fn on_human_input_required(&mut self, payload: &WorkflowPayload) {}
    fn on_human_input_form_filled(&mut self, payload: &WorkflowPayload) {}
    fn on_human_input_form_timeout(&mut self, payload: &WorkflowPayload) {}

    /// Data source node progress in a pipeline run
    fn on_data_source_processing(&mut self, payload: &DataSourcePayload) {}
    fn on_data_source_completed(&mut self, payload: &DataSourcePayload) {}
    fn on_data_source_error(&mut self, payload: &DataSourcePayload) {}

    fn on_text_chunk(&mut self, chunk: &TextChunkPayload) {}
    fn on_text_replace(&mut self, replace: &TextChunkPayload) {}

    /// Audio fragment for text-to-speech playback
    fn on_tts_chunk(&mut self, chunk: &TtsPayload) {}
    fn on_tts_end(&mut self, end: &TtsPayload) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}
