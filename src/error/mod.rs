//! Error handling for the request layer.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Domain-specific Errors**: Auth and Stream errors
//! - **Unified Error Type**: `ClientError` is returned by every public operation
//! - **Result Type Alias**: `ClientResult<T>`
//!
//! # Error Categories
//!
//! | Category | Description | Shown to user |
//! |----------|-------------|---------------|
//! | Network | Connection, timeout, body read | Yes |
//! | Auth | Expired or unrefreshable credential | Redirect |
//! | Server | Failing status, in-band stream error | Yes |
//! | Client | Undecodable payloads | Yes |
//! | Cancelled | Caller abort | No |

mod auth;
mod category;
mod client_error;
mod result;
mod stream;

pub use auth::AuthError;
pub use category::ErrorCategory;
pub use client_error::{ClientError, FALLBACK_SERVER_MESSAGE};
pub use result::ClientResult;
pub use stream::{StreamError, INVALID_DATA_CODE, INVALID_RESPONSE_DATA};
