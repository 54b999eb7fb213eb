//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP transport (buffered and streaming)
//! - [`KeyValueStore`] - Persisted string entries shared across processes
//! - [`Clock`] - Wall clock used for lock staleness
//! - [`SessionObserver`] - Error notices and sign-in redirects

pub mod clock;
pub mod http;
pub mod observer;
pub mod store;

pub use clock::Clock;
pub use http::{
    Body, ByteStream, FormPart, Headers, HttpClient, HttpError, Method, Request, Response,
    StreamingResponse,
};
pub use observer::{SessionObserver, SignInTarget};
pub use store::{KeyValueStore, StoreError};
