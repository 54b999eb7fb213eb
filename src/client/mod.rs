//! Request lifecycle manager.
//!
//! [`ApiClient`] attaches credentials, classifies responses, refreshes an
//! expired credential once and replays the call, and runs streaming calls
//! through the stream driver.

mod api;
mod options;
mod status;

pub use api::ApiClient;
pub use options::{CancelHandle, RequestBody, RequestOptions};
pub use status::{classify_status, ResponseBody, StatusClass};
