//! Stream driver: the read loop behind every streaming call.

mod driver;

pub use driver::{DriverState, StreamDriver, StreamOutcome};
