//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use flowlink::prelude::*;
//! ```
//!
//! This will import:
//! - The client and its call options (ApiClient, RequestOptions, CancelHandle)
//! - Stream callbacks (EventSink, DataInfo, StreamEvent)
//! - Errors (ClientError, ClientResult)
//! - Configuration (ClientConfig)

// Client
pub use crate::client::{ApiClient, CancelHandle, RequestBody, RequestOptions, ResponseBody};

// Configuration
pub use crate::config::ClientConfig;

// Stream types
pub use crate::sse::{DataInfo, EventSink, StreamEvent};
pub use crate::stream::{StreamDriver, StreamOutcome};

// Credentials
pub use crate::auth::CredentialScope;

// Errors
pub use crate::error::{ClientError, ClientResult};
