//! Flowlink - streaming protocol client for workflow and chat backends
//!
//! Decodes `data: `-framed event streams into typed callbacks, manages the
//! request lifecycle around them, and keeps credential refreshes single-flight
//! across every process sharing one session store.

pub mod adapters;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod sse;
pub mod stream;
pub mod traits;
