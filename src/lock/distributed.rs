use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::scripts;
use super::{CancelFlag, Lock, LockConfig, LockError, LockGuard};
use crate::identity::{IdentityProvider, IdentityToken};
use crate::script::ScriptExecutor;

/// One acquisition handle for a named lock in the shared store.
///
/// The handle mints its identity token on construction, so it should be
/// created on the thread that will hold the lock. Re-entry is detected by the
/// token's `host:thread:` prefix: another handle built on the same thread for
/// the same name acquires as *reentrant* and refreshes the lease, and its
/// `unlock` leaves the key in place for the outer holder to delete.
///
/// There is no background renewal. A holder whose critical section may
/// outlive the lease must call [`renew`](Self::renew) itself.
pub struct DistributedLock<E> {
    executor: Arc<E>,
    name: String,
    key: String,
    token: IdentityToken,
    token_value: String,
    lease: Duration,
    poll_interval: Duration,
    wait_timeout: Duration,
    held: AtomicBool,
    reentrant: AtomicBool,
}

impl<E: ScriptExecutor> DistributedLock<E> {
    /// Build a handle for `name`. Fails fast on a blank name or a config
    /// that could never acquire.
    pub fn new(
        executor: Arc<E>,
        name: &str,
        config: &LockConfig,
        identity: &IdentityProvider,
    ) -> Result<Self, LockError> {
        if name.trim().is_empty() {
            return Err(LockError::InvalidName(name.to_string()));
        }
        config.validate()?;

        let token = identity.next_token();
        Ok(DistributedLock {
            executor,
            name: name.to_string(),
            key: format!("{}:{}", config.namespace, name),
            token_value: token.to_string(),
            token,
            lease: config.lease,
            poll_interval: config.poll_interval,
            wait_timeout: config.wait_timeout,
            held: AtomicBool::new(false),
            reentrant: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store key, `<namespace>:<name>`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &IdentityToken {
        &self.token
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Whether this handle currently owes a release.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Whether the current hold was a re-entry of this thread's earlier hold.
    pub fn is_reentrant(&self) -> bool {
        self.is_held() && self.reentrant.load(Ordering::Acquire)
    }

    fn lease_arg(&self) -> String {
        self.lease.as_millis().max(1).to_string()
    }

    fn mark_held(&self, reentrant: bool) {
        self.reentrant.store(reentrant, Ordering::Release);
        self.held.store(true, Ordering::Release);
    }

    /// Extend the lease of a lock this handle holds.
    ///
    /// A fresh hold is renewed only while the exact token still owns the key;
    /// a reentrant hold is renewed while any token of this thread does.
    /// Returns `Ok(false)` and drops the local hold if the lease was lost.
    pub fn renew(&self) -> Result<bool, LockError> {
        if !self.is_held() {
            return Ok(false);
        }
        let lease = self.lease_arg();
        let renewed = if self.reentrant.load(Ordering::Acquire) {
            let prefix = self.token.owner_prefix();
            self.executor.eval(
                &scripts::REENTER,
                &[self.key.as_str()],
                &[prefix.as_str(), lease.as_str()],
            )?
        } else {
            self.executor.eval(
                &scripts::RENEW,
                &[self.key.as_str()],
                &[self.token_value.as_str(), lease.as_str()],
            )?
        }
        .is_truthy();

        if renewed {
            debug!(key = %self.key, token = %self.token_value, "lock lease renewed");
        } else {
            self.held.store(false, Ordering::Release);
            warn!(key = %self.key, token = %self.token_value, "lock lease lost before renewal");
        }
        Ok(renewed)
    }

    /// Like [`Lock::try_lock_for`], but gives up with
    /// [`LockError::Interrupted`] as soon as `cancel` is observed.
    pub fn try_lock_interruptibly(
        &self,
        wait: Duration,
        cancel: &CancelFlag,
    ) -> Result<bool, LockError> {
        self.poll(wait, Some(cancel))
    }

    /// Acquire with [`Lock::lock`] and release when the guard drops.
    pub fn acquire(&self) -> Result<LockGuard<'_, E>, LockError> {
        self.lock()?;
        Ok(LockGuard::new(self))
    }

    /// A single attempt; `None` when the lock is held elsewhere.
    pub fn try_acquire(&self) -> Result<Option<LockGuard<'_, E>>, LockError> {
        Ok(self.try_lock()?.then(|| LockGuard::new(self)))
    }

    fn poll(&self, wait: Duration, cancel: Option<&CancelFlag>) -> Result<bool, LockError> {
        let started = Instant::now();
        loop {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                return Err(LockError::Interrupted {
                    key: self.key.clone(),
                });
            }
            if self.try_lock()? {
                return Ok(true);
            }
            let elapsed = started.elapsed();
            if elapsed >= wait {
                return Ok(false);
            }
            thread::sleep(self.poll_interval.min(wait - elapsed));
        }
    }
}

impl<E: ScriptExecutor> Lock for DistributedLock<E> {
    fn lock(&self) -> Result<(), LockError> {
        if self.poll(self.wait_timeout, None)? {
            Ok(())
        } else {
            Err(LockError::Timeout {
                key: self.key.clone(),
                waited: self.wait_timeout,
            })
        }
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        // Already the fresh holder: extend the lease rather than re-entering,
        // which would turn this handle's release into a no-op. A lapsed lease
        // falls through to a normal attempt.
        if self.is_held() && !self.reentrant.load(Ordering::Acquire) && self.renew()? {
            return Ok(true);
        }

        let lease = self.lease_arg();
        let acquired = self
            .executor
            .eval(
                &scripts::ACQUIRE,
                &[self.key.as_str()],
                &[self.token_value.as_str(), lease.as_str()],
            )?
            .is_truthy();
        if acquired {
            self.mark_held(false);
            debug!(key = %self.key, token = %self.token_value, "lock acquired");
            return Ok(true);
        }

        let prefix = self.token.owner_prefix();
        let reentered = self
            .executor
            .eval(
                &scripts::REENTER,
                &[self.key.as_str()],
                &[prefix.as_str(), lease.as_str()],
            )?
            .is_truthy();
        if reentered {
            self.mark_held(true);
            debug!(key = %self.key, token = %self.token_value, "lock re-entered");
        }
        Ok(reentered)
    }

    fn try_lock_for(&self, wait: Duration) -> Result<bool, LockError> {
        self.poll(wait, None)
    }

    fn unlock(&self) -> bool {
        if !self.held.swap(false, Ordering::AcqRel) {
            return false;
        }
        if self.reentrant.swap(false, Ordering::AcqRel) {
            debug!(
                key = %self.key,
                token = %self.token_value,
                "reentrant hold released, lock left to outer holder"
            );
            return true;
        }

        let released = self.executor.eval(
            &scripts::RELEASE,
            &[self.key.as_str()],
            &[self.token_value.as_str()],
        );
        match released {
            Ok(reply) if reply.is_truthy() => {
                debug!(key = %self.key, token = %self.token_value, "lock released");
                true
            }
            Ok(_) => {
                warn!(
                    key = %self.key,
                    token = %self.token_value,
                    "lock not released: lease expired or owned by another holder"
                );
                false
            }
            Err(err) => {
                warn!(
                    key = %self.key,
                    token = %self.token_value,
                    error = %err,
                    "lock release failed"
                );
                false
            }
        }
    }
}
