//! Refresh lock with a process-local view and a shared persisted view.
//!
//! The in-memory flag says "this process is refreshing". The persisted flag
//! (`is_other_tab_refreshing` plus `last_refresh_time`) is visible to every
//! process sharing the store. A persisted flag older than the staleness
//! threshold belongs to a dead owner and may be evicted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::traits::{Clock, KeyValueStore, StoreError};

/// Key of the persisted "someone is refreshing" flag.
pub const LOCK_FLAG_KEY: &str = "is_other_tab_refreshing";

/// Key of the persisted lock timestamp, in milliseconds since the epoch.
pub const LOCK_TIME_KEY: &str = "last_refresh_time";

const HELD: &str = "1";

/// Observed state of the refresh lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Nobody is refreshing
    Free,
    /// A refresh started by this process is in flight
    HeldHere,
    /// Another process holds a fresh lock
    HeldElsewhere,
    /// A persisted lock exists but its owner is presumed dead
    Stale,
}

/// Refresh lock shared by every caller of one process.
pub struct RefreshLock {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    in_memory: AtomicBool,
    staleness: Duration,
}

impl std::fmt::Debug for RefreshLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshLock")
            .field("in_memory", &self.in_memory.load(Ordering::SeqCst))
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

impl RefreshLock {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, staleness: Duration) -> Self {
        Self {
            store,
            clock,
            in_memory: AtomicBool::new(false),
            staleness,
        }
    }

    /// Current state, in-memory view first.
    ///
    /// A persisted flag without a readable timestamp counts as stale. Store
    /// read failures are logged and treated as no persisted lock.
    pub fn state(&self) -> LockState {
        if self.in_memory.load(Ordering::SeqCst) {
            return LockState::HeldHere;
        }

        match self.persisted_age() {
            Ok(None) => LockState::Free,
            Ok(Some(age)) if age <= self.staleness.as_millis() as i64 => LockState::HeldElsewhere,
            Ok(Some(_)) => LockState::Stale,
            Err(e) => {
                tracing::warn!("Could not read refresh lock: {}", e);
                LockState::Free
            }
        }
    }

    /// True while this process or a live peer is refreshing.
    pub fn is_held(&self) -> bool {
        matches!(self.state(), LockState::HeldHere | LockState::HeldElsewhere)
    }

    /// True while a refresh started by this process is in flight.
    pub fn is_held_here(&self) -> bool {
        self.in_memory.load(Ordering::SeqCst)
    }

    /// Try to become the refresher.
    ///
    /// Returns `Ok(None)` when this process or a live peer already holds the
    /// lock. A stale persisted lock is evicted and taken over.
    pub fn acquire(self: &Arc<Self>) -> Result<Option<RefreshLockGuard>, StoreError> {
        if self
            .in_memory
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }

        match self.persisted_age() {
            Ok(Some(age)) if age <= self.staleness.as_millis() as i64 => {
                self.in_memory.store(false, Ordering::SeqCst);
                return Ok(None);
            }
            Ok(Some(age)) => {
                tracing::warn!("Evicting stale refresh lock ({} ms old)", age);
            }
            Ok(None) => {}
            Err(e) => {
                self.in_memory.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }

        if let Err(e) = self.write_persisted() {
            self.in_memory.store(false, Ordering::SeqCst);
            return Err(e);
        }

        Ok(Some(RefreshLockGuard {
            lock: Arc::clone(self),
        }))
    }

    /// Clear both views of the lock.
    ///
    /// Persisted entries that cannot be removed are logged; they expire
    /// through the staleness threshold.
    pub fn release(&self) {
        self.in_memory.store(false, Ordering::SeqCst);
        self.clear_persisted();
    }

    /// Remove a stale persisted lock. No-op unless the state is `Stale`.
    pub fn evict_stale(&self) -> bool {
        if self.state() != LockState::Stale {
            return false;
        }
        tracing::warn!("Clearing abandoned refresh lock");
        self.clear_persisted();
        true
    }

    /// Age of the persisted lock, `None` when no persisted lock exists.
    fn persisted_age(&self) -> Result<Option<i64>, StoreError> {
        match self.store.get(LOCK_FLAG_KEY)? {
            Some(flag) if flag == HELD => {}
            _ => return Ok(None),
        }

        let since = self
            .store
            .get(LOCK_TIME_KEY)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);
        Ok(Some(self.clock.now_millis() - since))
    }

    fn write_persisted(&self) -> Result<(), StoreError> {
        self.store.set(LOCK_FLAG_KEY, HELD)?;
        self.store
            .set(LOCK_TIME_KEY, &self.clock.now_millis().to_string())
    }

    fn clear_persisted(&self) {
        for key in [LOCK_FLAG_KEY, LOCK_TIME_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!("Could not clear refresh lock entry: {}", e);
            }
        }
    }
}

/// Ownership of the refresh lock. Dropping it releases both views.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RefreshLockGuard {
    lock: Arc<RefreshLock>,
}

impl RefreshLockGuard {
    /// Release explicitly; same as dropping the guard.
    pub fn release(self) {}
}

impl Drop for RefreshLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}
