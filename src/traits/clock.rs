//! Wall clock abstraction so lock staleness can be tested without waiting.

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}
