use std::time::Duration;

use super::LockError;

/// Trait for a single lock handle.
///
/// Implementations provide a single non-blocking attempt, a bounded polling
/// wait, a blocking acquire that fails on its default timeout, and a
/// best-effort release.
pub trait Lock: Send + Sync {
    /// Acquire the lock, waiting up to the configured wait timeout.
    /// Returns `LockError::Timeout` if the lock could not be entered.
    fn lock(&self) -> Result<(), LockError>;

    /// Try to acquire the lock once without waiting.
    /// Returns `Ok(true)` if acquired (fresh or re-entered), `Ok(false)` if held elsewhere.
    fn try_lock(&self) -> Result<bool, LockError>;

    /// Poll `try_lock` until it succeeds or `wait` elapses.
    fn try_lock_for(&self, wait: Duration) -> Result<bool, LockError>;

    /// Release the lock. Never fails; returns whether this handle's hold was
    /// given up cleanly.
    fn unlock(&self) -> bool;
}
