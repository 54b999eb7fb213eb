//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses
//! - [`InMemoryStore`] - Key-value store with switchable failures
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`RecordingObserver`] - Records error notices and sign-in redirects

pub mod clock;
pub mod http;
pub mod observer;
pub mod store;

pub use clock::ManualClock;
pub use http::{MockHttpClient, MockResponse};
pub use observer::RecordingObserver;
pub use store::InMemoryStore;
