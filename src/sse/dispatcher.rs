//! Routing of parsed frames to an [`EventSink`]
//!
//! The dispatcher is per-stream state: it remembers whether the first data
//! fragment has been delivered and the identifiers of the last parsed frame,
//! which the malformed-frame recovery path reuses.

use serde_json::{Map, Value};

use crate::error::{StreamError, INVALID_DATA_CODE, INVALID_RESPONSE_DATA};
use crate::sse::events::{DataInfo, StreamEvent};
use crate::sse::parser::{parse_frame, unescape_unicode, Frame};
use crate::sse::sink::EventSink;

/// What the driver should do after a line has been dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Keep reading
    Continue,
    /// Stop the stream; completion fires with `has_error = true`
    Terminate(StreamError),
}

/// Per-stream dispatch state.
#[derive(Debug)]
pub struct Dispatcher {
    is_first_message: bool,
    /// `conversation_id` of the last frame that parsed to an object
    last_conversation_id: Option<String>,
    /// `message_id` of the last frame that parsed to an object
    last_message_id: Option<String>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            is_first_message: true,
            last_conversation_id: None,
            last_message_id: None,
        }
    }

    /// True until the first data fragment has been delivered.
    pub fn is_first_message(&self) -> bool {
        self.is_first_message
    }

    /// Parse and dispatch one decoded line.
    pub fn dispatch_line<S: EventSink + ?Sized>(&mut self, line: &str, sink: &mut S) -> Dispatch {
        match parse_frame(line) {
            Frame::NotAFrame => Dispatch::Continue,
            Frame::Malformed { error } => {
                tracing::warn!("Malformed stream frame, continuing: {}", error);
                self.recover(sink)
            }
            Frame::NotAnObject(value) => {
                tracing::warn!("Stream frame is not an object: {}", value);
                self.invalid_data(sink)
            }
            Frame::Object(object) => self.dispatch_object(object, sink),
        }
    }

    /// Dispatch a frame that parsed to a JSON object.
    pub fn dispatch_object<S: EventSink + ?Sized>(
        &mut self,
        object: Map<String, Value>,
        sink: &mut S,
    ) -> Dispatch {
        self.last_conversation_id = string_field(&object, "conversation_id");
        self.last_message_id = string_field(&object, "message_id");

        let event_name = match in_band_error(&object) {
            Some((message, code)) => return self.backend_error(message, code, sink),
            None => match object.get("event") {
                Some(Value::String(name)) => name.clone(),
                other => {
                    tracing::debug!("Ignoring frame with non-string event: {:?}", other);
                    return Dispatch::Continue;
                }
            },
        };

        // A known event with an unreadable payload is skipped; it is not a cut-off frame
        let event = match StreamEvent::from_object(&event_name, object) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Unreadable '{}' payload, skipping: {}", event_name, e);
                return Dispatch::Continue;
            }
        };

        tracing::debug!("Dispatching stream event: {}", event.event_type_name());
        self.route(event, sink);
        Dispatch::Continue
    }

    fn route<S: EventSink + ?Sized>(&mut self, event: StreamEvent, sink: &mut S) {
        match event {
            StreamEvent::Message(payload) | StreamEvent::AgentMessage(payload) => {
                let info = DataInfo {
                    conversation_id: payload.conversation_id,
                    task_id: payload.task_id,
                    message_id: payload.id,
                    ..DataInfo::default()
                };
                let content = unescape_unicode(&payload.answer);
                self.emit_data(&content, &info, sink);
            }
            StreamEvent::AgentThought(p) => sink.on_thought(&p),
            StreamEvent::MessageFile(p) => sink.on_file(&p),
            StreamEvent::MessageEnd(p) => sink.on_message_end(&p),
            StreamEvent::MessageReplace(p) => sink.on_message_replace(&p),
            StreamEvent::WorkflowStarted(p) => sink.on_workflow_started(&p),
            StreamEvent::WorkflowFinished(p) => sink.on_workflow_finished(&p),
            StreamEvent::NodeStarted(p) => sink.on_node_started(&p),
            StreamEvent::NodeFinished(p) => sink.on_node_finished(&p),
            StreamEvent::IterationStarted(p) => sink.on_iteration_started(&p),
            StreamEvent::IterationNext(p) => sink.on_iteration_next(&p),
            StreamEvent::IterationCompleted(p) => sink.on_iteration_finished(&p),
            StreamEvent::ParallelBranchStarted(p) => sink.on_parallel_branch_started(&p),
            StreamEvent::ParallelBranchFinished(p) => sink.on_parallel_branch_finished(&p),
            StreamEvent::TextChunk(p) => sink.on_text_chunk(&p),
            StreamEvent::TextReplace(p) => sink.on_text_replace(&p),
            StreamEvent::TtsMessage(p) => sink.on_tts_chunk(&p),
            StreamEvent::TtsMessageEnd(p) => sink.on_tts_end(&p),
            StreamEvent::LoopStarted(p) => sink.on_loop_started(&p),
            StreamEvent::LoopNext(p) => sink.on_loop_next(&p),
            StreamEvent::LoopCompleted(p) => sink.on_loop_finished(&p),
            StreamEvent::NodeRetry(p) => sink.on_node_retry(&p),
            StreamEvent::AgentLog(p) => sink.on_agent_log(&p),
            StreamEvent::WorkflowPaused(p) => sink.on_workflow_paused(&p),
            StreamEvent::HumanInputRequired(p) => sink.on_human_input_required(&p),
            StreamEvent::HumanInputFormFilled(p) => sink.on_human_input_form_filled(&p),
            StreamEvent::HumanInputFormTimeout(p) => sink.on_human_input_form_timeout(&p),
            StreamEvent::DataSourceProcessing(p) => sink.on_data_source_processing(&p),
            StreamEvent::DataSourceCompleted(p) => sink.on_data_source_completed(&p),
            StreamEvent::DataSourceError(p) => sink.on_data_source_error(&p),
            StreamEvent::Unknown { event, .. } => {
                tracing::debug!("Ignoring unknown stream event: {}", event);
            }
        }
    }

    /// Cut-off frame: emit an empty fragment with the last known identifiers.
    fn recover<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Dispatch {
        let info = DataInfo {
            conversation_id: self.last_conversation_id.clone(),
            message_id: self.last_message_id.clone(),
            ..DataInfo::default()
        };
        self.emit_data("", &info, sink);
        Dispatch::Continue
    }

    fn invalid_data<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Dispatch {
        let info = DataInfo {
            error_message: Some(INVALID_RESPONSE_DATA.to_string()),
            error_code: Some(INVALID_DATA_CODE.to_string()),
            ..DataInfo::default()
        };
        self.emit_data("", &info, sink);
        Dispatch::Terminate(StreamError::InvalidData)
    }

    fn backend_error<S: EventSink + ?Sized>(
        &mut self,
        message: Option<String>,
        code: Option<String>,
        sink: &mut S,
    ) -> Dispatch {
        tracing::warn!(
            "In-band stream error: {} ({})",
            message.as_deref().unwrap_or(""),
            code.as_deref().unwrap_or("no code")
        );
        let info = DataInfo {
            error_message: message.clone(),
            error_code: code.clone(),
            ..DataInfo::default()
        };
        sink.on_data("", false, &info);
        self.is_first_message = false;
        Dispatch::Terminate(StreamError::Backend {
            message: message.unwrap_or_default(),
            code,
        })
    }

    fn emit_data<S: EventSink + ?Sized>(&mut self, content: &str, info: &DataInfo, sink: &mut S) {
        sink.on_data(content, self.is_first_message, info);
        self.is_first_message = false;
    }
}

/// Detect an in-band error object.
///
/// `status == 400` wins over a present `event`; a missing, `null`, `false`,
/// zero or empty `event` is an error as well. Returns `(message, code)`.
fn in_band_error(object: &Map<String, Value>) -> Option<(Option<String>, Option<String>)> {
    let status_400 = object.get("status").and_then(Value::as_f64) == Some(400.0);

    if status_400 || is_falsy(object.get("event")) {
        Some((
            string_field(object, "message"),
            string_field(object, "code"),
        ))
    } else {
        None
    }
}

fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::payloads::{DataSourcePayload, ThoughtPayload, TtsPayload, WorkflowPayload};

    #[derive(Default)]
    struct Recorder {
        data: Vec<(String, bool, DataInfo)>,
        events: Vec<String>,
    }

    impl EventSink for Recorder {
        fn on_data(&mut self, content: &str, is_first_message: bool, info: &DataInfo) {
            self.data
                .push((content.to_string(), is_first_message, info.clone()));
        }

        fn on_node_started(&mut self, payload: &WorkflowPayload) {
            self.events
                .push(format!("node_started:{}", payload.data["node_id"]));
        }

        fn on_tts_chunk(&mut self, chunk: &TtsPayload) {
            self.events.push(format!("tts:{}", chunk.audio));
        }

        fn on_thought(&mut self, thought: &ThoughtPayload) {
            self.events
                .push(format!("thought:{}|{}", thought.thought, thought.observation));
        }

        fn on_data_source_processing(&mut self, payload: &DataSourcePayload) {
            self.events.push(format!(
                "datasource_processing:{}/{}",
                payload.completed.unwrap_or_default(),
                payload.total.unwrap_or_default()
            ));
        }

        fn on_data_source_completed(&mut self, payload: &DataSourcePayload) {
            self.events
                .push(format!("datasource_completed:{}", payload.data));
        }

        fn on_data_source_error(&mut self, payload: &DataSourcePayload) {
            self.events.push(format!(
                "datasource_error:{}",
                payload.error.as_deref().unwrap_or("")
            ));
        }
    }

    #[test]
    fn test_message_reaches_data_callback_unescaped() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        let line = r#"data: {"event":"message","id":"m1","task_id":"t1","conversation_id":"c1","answer":"caf\\u00e9"}"#;

        assert_eq!(dispatcher.dispatch_line(line, &mut sink), Dispatch::Continue);

        let (content, first, info) = &sink.data[0];
        assert_eq!(content, "café");
        assert!(*first);
        assert_eq!(info.conversation_id.as_deref(), Some("c1"));
        assert_eq!(info.task_id.as_deref(), Some("t1"));
        assert_eq!(info.message_id.as_deref(), Some("m1"));
        assert_eq!(info.error_message, None);
    }

    #[test]
    fn test_first_message_flag_only_once() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        for _ in 0..3 {
            dispatcher.dispatch_line(r#"data: {"event":"agent_message","answer":"x"}"#, &mut sink);
        }
        let flags: Vec<bool> = sink.data.iter().map(|(_, first, _)| *first).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_status_400_wins_over_event() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        let line = r#"data: {"event":"message","status":400,"message":"Bad request","code":"bad_request","answer":"no"}"#;

        let result = dispatcher.dispatch_line(line, &mut sink);

        assert_eq!(
            result,
            Dispatch::Terminate(StreamError::Backend {
                message: "Bad request".to_string(),
                code: Some("bad_request".to_string()),
            })
        );
        let (content, first, info) = &sink.data[0];
        assert_eq!(content, "");
        assert!(!*first);
        assert_eq!(info.error_message.as_deref(), Some("Bad request"));
        assert_eq!(info.error_code.as_deref(), Some("bad_request"));
    }

    #[test]
    fn test_missing_event_is_in_band_error() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        let result = dispatcher.dispatch_line(r#"data: {"message":"quota exceeded"}"#, &mut sink);
        assert!(matches!(result, Dispatch::Terminate(StreamError::Backend { ref message, .. }) if message == "quota exceeded"));
    }

    #[test]
    fn test_status_other_than_400_with_event_is_dispatched() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        let result = dispatcher.dispatch_line(
            r#"data: {"event":"message","status":200,"answer":"ok"}"#,
            &mut sink,
        );
        assert_eq!(result, Dispatch::Continue);
        assert_eq!(sink.data[0].0, "ok");
    }

    #[test]
    fn test_invalid_data_terminates() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        let result = dispatcher.dispatch_line("data: null", &mut sink);
        assert_eq!(result, Dispatch::Terminate(StreamError::InvalidData));
        let info = &sink.data[0].2;
        assert_eq!(info.error_message.as_deref(), Some("Invalid response data"));
        assert_eq!(info.error_code.as_deref(), Some("invalid_data"));
    }

    #[test]
    fn test_malformed_frame_reuses_last_identifiers() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        dispatcher.dispatch_line(
            r#"data: {"event":"message","conversation_id":"c9","message_id":"m9","answer":"a"}"#,
            &mut sink,
        );
        let result = dispatcher.dispatch_line("data: {invalid json}", &mut sink);

        assert_eq!(result, Dispatch::Continue);
        let (content, first, info) = &sink.data[1];
        assert_eq!(content, "");
        assert!(!*first);
        assert_eq!(info.conversation_id.as_deref(), Some("c9"));
        assert_eq!(info.message_id.as_deref(), Some("m9"));
    }

    #[test]
    fn test_malformed_first_frame_has_no_identifiers() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        dispatcher.dispatch_line(r#"data: {"event":"mess"#, &mut sink);
        let (_, first, info) = &sink.data[0];
        assert!(*first);
        assert_eq!(info, &DataInfo::default());
    }

    #[test]
    fn test_typed_events_routed() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        dispatcher.dispatch_line(
            r#"data: {"event":"node_started","data":{"node_id":"n1"}}"#,
            &mut sink,
        );
        dispatcher.dispatch_line(r#"data: {"event":"tts_message","audio":"QUJD"}"#, &mut sink);
        dispatcher.dispatch_line(r#"data: {"event":"brand_new_event"}"#, &mut sink);
        dispatcher.dispatch_line("event: ping", &mut sink);

        assert_eq!(sink.events, vec!["node_started:\"n1\"", "tts:QUJD"]);
        assert!(sink.data.is_empty());
    }

    #[test]
    fn test_null_fields_still_route() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        let thought = r#"data: {"event":"agent_thought","thought":"x","observation":null,"tool":null,"tool_input":null}"#;

        assert_eq!(dispatcher.dispatch_line(thought, &mut sink), Dispatch::Continue);
        assert_eq!(sink.events, vec!["thought:x|"]);
        assert!(sink.data.is_empty());
        assert!(dispatcher.is_first_message());

        dispatcher.dispatch_line(
            r#"data: {"event":"message","answer":null,"conversation_id":"c1"}"#,
            &mut sink,
        );
        let (content, first, info) = &sink.data[0];
        assert_eq!(content, "");
        assert!(*first);
        assert_eq!(info.conversation_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_unreadable_payload_is_skipped() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        let result = dispatcher.dispatch_line(r#"data: {"event":"tts_message","audio":[1,2]}"#, &mut sink);

        assert_eq!(result, Dispatch::Continue);
        assert!(sink.events.is_empty());
        assert!(sink.data.is_empty());
        assert!(dispatcher.is_first_message());
    }

    #[test]
    fn test_falsy_event_is_in_band_error() {
        for event in ["null", "false", "0", r#""""#] {
            let mut dispatcher = Dispatcher::new();
            let mut sink = Recorder::default();
            let line = format!(r#"data: {{"event":{},"message":"boom"}}"#, event);
            let result = dispatcher.dispatch_line(&line, &mut sink);
            assert!(
                matches!(result, Dispatch::Terminate(StreamError::Backend { .. })),
                "event {}",
                event
            );
        }
    }

    #[test]
    fn test_non_string_event_is_ignored() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        for line in [
            r#"data: {"event":5,"answer":"x"}"#,
            r#"data: {"event":true}"#,
            r#"data: {"event":["message"]}"#,
        ] {
            assert_eq!(dispatcher.dispatch_line(line, &mut sink), Dispatch::Continue);
        }
        assert!(sink.data.is_empty());
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_data_source_events_routed() {
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();
        dispatcher.dispatch_line(
            r#"data: {"event":"datasource_processing","total":10,"completed":5}"#,
            &mut sink,
        );
        dispatcher.dispatch_line(
            r#"data: {"event":"datasource_completed","data":["page"],"time_consuming":2.5}"#,
            &mut sink,
        );
        dispatcher.dispatch_line(
            r#"data: {"event":"datasource_error","error":"Something went wrong"}"#,
            &mut sink,
        );

        assert_eq!(
            sink.events,
            vec![
                "datasource_processing:5/10",
                "datasource_completed:[\"page\"]",
                "datasource_error:Something went wrong",
            ]
        );
    }
}
