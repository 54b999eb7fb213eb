//! Single-flight credential refresh.
//!
//! Many callers may hit an expired credential at once, in this process and
//! in other processes sharing the same store. [`RefreshCoordinator`] makes
//! sure only one of them talks to the refresh endpoint while the others wait
//! for it to finish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::auth::credentials::CredentialStore;
use crate::auth::lock::{LockState, RefreshLock, RefreshLockGuard};
use crate::auth::refresh_api::TokenRefresher;
use crate::error::AuthError;

/// Coordinates refreshes for every caller of one process.
pub struct RefreshCoordinator {
    lock: Arc<RefreshLock>,
    credentials: CredentialStore,
    refresher: Arc<dyn TokenRefresher>,
    poll_interval: Duration,
    timeout: Duration,
    /// Outcome of the last refresh performed by this process
    last_outcome: Mutex<Option<Result<(), AuthError>>>,
    /// Number of refreshes performed by this process that ran to completion
    finished: AtomicU64,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("lock", &self.lock)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub fn new(
        lock: Arc<RefreshLock>,
        credentials: CredentialStore,
        refresher: Arc<dyn TokenRefresher>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            lock,
            credentials,
            refresher,
            poll_interval,
            timeout,
            last_outcome: Mutex::new(None),
            finished: AtomicU64::new(0),
        }
    }

    pub fn lock(&self) -> &Arc<RefreshLock> {
        &self.lock
    }

    /// Make sure the stored console credential is fresh.
    ///
    /// `rejected_token` is the credential the failing request carried. When
    /// the store already holds a different one, another caller refreshed in
    /// the meantime and this call returns immediately.
    ///
    /// Waiters on a refresh in this process get that refresh's outcome.
    /// Waiters on another process get `Ok(())` once its lock clears. The
    /// whole call is bounded by the refresh timeout; a lock owned by a
    /// timed-out call is released.
    pub async fn ensure_fresh_credential(&self, rejected_token: Option<&str>) -> Result<(), AuthError> {
        match tokio::time::timeout(self.timeout, self.refresh_or_wait(rejected_token)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Token refresh timed out after {:?}", self.timeout);
                Err(AuthError::RefreshTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }

    async fn refresh_or_wait(&self, rejected_token: Option<&str>) -> Result<(), AuthError> {
        loop {
            if self.already_rotated(rejected_token)? {
                tracing::debug!("Credential already rotated, skipping refresh");
                return Ok(());
            }

            match self.lock.state() {
                LockState::HeldHere => {
                    let seen = self.finished.load(Ordering::SeqCst);
                    self.wait_while(|| self.lock.is_held_here()).await;
                    if self.finished.load(Ordering::SeqCst) == seen {
                        // The refresh we waited on was abandoned; try again
                        continue;
                    }
                    return self.last_outcome.lock().await.clone().unwrap_or(Ok(()));
                }
                LockState::HeldElsewhere => {
                    tracing::debug!("Another session is refreshing, waiting");
                    self.wait_while(|| self.lock.state() == LockState::HeldElsewhere)
                        .await;
                    if self.lock.state() == LockState::Free {
                        return Ok(());
                    }
                    // Went stale while we waited, or this process took over
                    continue;
                }
                LockState::Stale => {
                    self.lock.evict_stale();
                }
                LockState::Free => {}
            }

            if let Some(guard) = self.lock.acquire()? {
                return self.refresh_holding(guard).await;
            }
        }
    }

    async fn refresh_holding(&self, guard: RefreshLockGuard) -> Result<(), AuthError> {
        tracing::info!("Refreshing access token");
        let outcome = self.refresh_once().await;
        match &outcome {
            Ok(()) => tracing::info!("Access token refreshed"),
            Err(e) => tracing::warn!("Access token refresh failed: {}", e),
        }

        *self.last_outcome.lock().await = Some(outcome.clone());
        self.finished.fetch_add(1, Ordering::SeqCst);
        guard.release();
        outcome
    }

    async fn refresh_once(&self) -> Result<(), AuthError> {
        let refresh_token = self
            .credentials
            .refresh_token()?
            .ok_or(AuthError::NotAuthenticated)?;
        let pair = self.refresher.refresh(&refresh_token).await?;
        self.credentials
            .set_tokens(&pair.access_token, &pair.refresh_token)?;
        Ok(())
    }

    fn already_rotated(&self, rejected_token: Option<&str>) -> Result<bool, AuthError> {
        let Some(rejected) = rejected_token else {
            return Ok(false);
        };
        let current = self.credentials.console_token()?;
        Ok(matches!(current.as_deref(), Some(current) if current != rejected))
    }

    async fn wait_while<F: Fn() -> bool>(&self, condition: F) {
        while condition() {
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
