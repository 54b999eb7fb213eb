//! Event stream decoding
//!
//! The backend streams newline-delimited text. Lines of the form
//! `data: <json>` are frames; everything else is ignored.
//!
//! # Module structure
//! - `decoder` - Incremental UTF-8 byte-to-line decoding (LineDecoder)
//! - `parser` - Frame recognition and JSON parsing (parse_frame, Frame)
//! - `events` - Typed event enum (StreamEvent, DataInfo)
//! - `payloads` - Event payload structs
//! - `dispatcher` - Routing of frames to an EventSink (Dispatcher, Dispatch)
//! - `sink` - Caller-facing callback trait (EventSink)

mod decoder;
mod dispatcher;
mod events;
mod parser;
pub mod payloads;
mod sink;

pub use decoder::LineDecoder;
pub use dispatcher::{Dispatch, Dispatcher};
pub use events::{DataInfo, StreamEvent};
pub use parser::{parse_frame, unescape_unicode, Frame, DATA_PREFIX};
pub use sink::{EventSink, NullSink};
