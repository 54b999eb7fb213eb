//! Credential storage and refresh coordination.
//!
//! - `credentials` - Persisted console and public credentials
//! - `lock` - Refresh lock shared across processes
//! - `refresh_api` - Refresh endpoint client
//! - `coordinator` - Single-flight refresh for concurrent callers

pub mod coordinator;
pub mod credentials;
pub mod lock;
pub mod refresh_api;

pub use coordinator::RefreshCoordinator;
pub use credentials::{CredentialScope, CredentialStore};
pub use lock::{LockState, RefreshLock, RefreshLockGuard};
pub use refresh_api::{HttpTokenRefresher, TokenPair, TokenRefresher};
