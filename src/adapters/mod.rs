//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileStore`] - Key-value store with one file per key
//! - [`SystemClock`] - Wall clock via chrono
//! - [`LogObserver`] - Session observer that logs through tracing
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::InMemoryStore`] - In-memory key-value store
//! - [`mock::ManualClock`] - Manually advanced clock
//! - [`mock::RecordingObserver`] - Records notices and redirects

pub mod file_store;
pub mod log_observer;
pub mod mock;
pub mod reqwest_http;
pub mod system_clock;

pub use file_store::FileStore;
pub use log_observer::LogObserver;
pub use mock::{InMemoryStore, ManualClock, MockHttpClient, RecordingObserver};
pub use reqwest_http::ReqwestHttpClient;
pub use system_clock::SystemClock;
