//! Frame parsing logic
//!
//! A frame is one line starting with `data: `. Everything else on the wire
//! is ignored. Parsing never fails outright: every line maps to exactly one
//! [`Frame`] variant and the dispatcher decides what each one means.

mod unescape;

use serde_json::{Map, Value};

pub use unescape::unescape_unicode;

/// Literal prefix marking a frame line
pub const DATA_PREFIX: &str = "data: ";

/// Classification of one decoded line.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// The line does not start with the `data: ` prefix
    NotAFrame,
    /// The payload is not valid JSON (typically cut off by the sender)
    Malformed { error: String },
    /// Valid JSON that is not an object (`null`, a string, a number, an array)
    NotAnObject(Value),
    /// A JSON object ready for dispatch
    Object(Map<String, Value>),
}

/// Parse a single line into a [`Frame`].
pub fn parse_frame(line: &str) -> Frame {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::NotAFrame;
    };

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Frame::Object(map),
        Ok(other) => Frame::NotAnObject(other),
        Err(e) => Frame::Malformed {
            error: e.to_string(),
        },
    }
}
