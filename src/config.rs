//! Client configuration.
//!
//! Use the builder pattern to customize behavior, or [`ClientConfig::from_env`]
//! to read overrides from `FLOWLINK_*` environment variables.
//!
//! # Example
//!
//! ```ignore
//! use flowlink::config::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::default()
//!     .with_api_prefix("https://cloud.example.com/console/api")
//!     .with_request_timeout(Duration::from_secs(30));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::FileStore;

/// Default console API prefix.
pub const DEFAULT_API_PREFIX: &str = "http://localhost:5001/console/api";

/// Default public (shared app) API prefix.
pub const DEFAULT_PUBLIC_API_PREFIX: &str = "http://localhost:5001/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration shared by every call made through one client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Prefix for console (signed-in) endpoints
    pub api_prefix: String,
    /// Prefix for public (shared app) endpoints
    pub public_api_prefix: String,
    /// Overall deadline of a non-streaming call (default: 100s)
    pub request_timeout: Duration,
    /// Overall deadline of a credential refresh, waiting included (default: 100s)
    pub refresh_timeout: Duration,
    /// How often waiters re-check the refresh lock (default: 1s)
    pub refresh_poll_interval: Duration,
    /// Age after which a persisted refresh lock is abandoned (default: 100s)
    pub lock_staleness: Duration,
    /// Enables init/install redirects on special 401 codes
    pub community_edition: bool,
    /// Directory of the file-backed session store
    pub store_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            public_api_prefix: DEFAULT_PUBLIC_API_PREFIX.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            refresh_timeout: DEFAULT_TIMEOUT,
            refresh_poll_interval: DEFAULT_POLL_INTERVAL,
            lock_staleness: DEFAULT_TIMEOUT,
            community_edition: false,
            store_dir: FileStore::default_dir(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_public_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_api_prefix = prefix.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_refresh_poll_interval(mut self, interval: Duration) -> Self {
        self.refresh_poll_interval = interval;
        self
    }

    pub fn with_lock_staleness(mut self, staleness: Duration) -> Self {
        self.lock_staleness = staleness;
        self
    }

    pub fn with_community_edition(mut self, enabled: bool) -> Self {
        self.community_edition = enabled;
        self
    }

    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }

    /// Defaults overridden by `FLOWLINK_*` environment variables.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(prefix) = std::env::var("FLOWLINK_API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Ok(prefix) = std::env::var("FLOWLINK_PUBLIC_API_PREFIX") {
            config.public_api_prefix = prefix;
        }
        if let Some(timeout) = env_millis("FLOWLINK_TIMEOUT_MS") {
            config.request_timeout = timeout;
        }
        if let Some(timeout) = env_millis("FLOWLINK_REFRESH_TIMEOUT_MS") {
            config.refresh_timeout = timeout;
        }
        if let Some(interval) = env_millis("FLOWLINK_REFRESH_POLL_MS") {
            config.refresh_poll_interval = interval;
        }
        if let Some(staleness) = env_millis("FLOWLINK_LOCK_STALENESS_MS") {
            config.lock_staleness = staleness;
        }
        if let Ok(raw) = std::env::var("FLOWLINK_COMMUNITY_EDITION") {
            match parse_bool(&raw) {
                Some(enabled) => config.community_edition = enabled,
                None => tracing::warn!("Ignoring FLOWLINK_COMMUNITY_EDITION={:?}", raw),
            }
        }
        if let Ok(dir) = std::env::var("FLOWLINK_STORE_DIR") {
            config.store_dir = Some(PathBuf::from(dir));
        }

        config
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: expected milliseconds", name, raw);
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
