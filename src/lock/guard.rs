use std::ops::Deref;

use super::{DistributedLock, Lock};
use crate::script::ScriptExecutor;

/// Releases its [`DistributedLock`] when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, E: ScriptExecutor> {
    lock: &'a DistributedLock<E>,
    released: bool,
}

impl<'a, E: ScriptExecutor> LockGuard<'a, E> {
    pub(crate) fn new(lock: &'a DistributedLock<E>) -> Self {
        LockGuard {
            lock,
            released: false,
        }
    }

    /// Release now and report the outcome instead of waiting for drop.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.lock.unlock()
    }
}

impl<E: ScriptExecutor> Deref for LockGuard<'_, E> {
    type Target = DistributedLock<E>;

    fn deref(&self) -> &Self::Target {
        self.lock
    }
}

impl<E: ScriptExecutor> Drop for LockGuard<'_, E> {
    fn drop(&mut self) {
        if !self.released {
            self.lock.unlock();
        }
    }
}
