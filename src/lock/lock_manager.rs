use std::sync::Arc;

use super::{scripts, DistributedLock, LockConfig, LockError};
use crate::identity::IdentityProvider;
use crate::script::ScriptExecutor;

/// Factory for lock handles sharing one store, config and identity source.
///
/// Every call to [`get_lock`](Self::get_lock) returns a *new* handle with a
/// fresh token; handles for the same name on the same thread re-enter each
/// other, handles on different threads exclude each other.
pub struct LockManager<E> {
    executor: Arc<E>,
    config: LockConfig,
    identity: IdentityProvider,
}

impl<E> Clone for LockManager<E> {
    fn clone(&self) -> Self {
        LockManager {
            executor: Arc::clone(&self.executor),
            config: self.config.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<E: ScriptExecutor> LockManager<E> {
    pub fn new(executor: E, config: LockConfig) -> Self {
        Self::from_arc(Arc::new(executor), config)
    }

    pub fn from_arc(executor: Arc<E>, config: LockConfig) -> Self {
        LockManager {
            executor,
            config,
            identity: IdentityProvider::new(),
        }
    }

    /// Replace the identity source (e.g. to pin the host segment).
    pub fn with_identity(mut self, identity: IdentityProvider) -> Self {
        self.identity = identity;
        self
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Store key used for `name`.
    pub fn lock_key(&self, name: &str) -> String {
        format!("{}:{}", self.config.namespace, name)
    }

    /// A new handle for `name`, bound to the calling thread's identity.
    pub fn get_lock(&self, name: &str) -> Result<DistributedLock<E>, LockError> {
        self.get_lock_with(name, &self.config)
    }

    /// A new handle for `name` with per-lock settings.
    pub fn get_lock_with(
        &self,
        name: &str,
        config: &LockConfig,
    ) -> Result<DistributedLock<E>, LockError> {
        DistributedLock::new(Arc::clone(&self.executor), name, config, &self.identity)
    }

    /// Token of the current holder of `name`, if any.
    pub fn owner(&self, name: &str) -> Result<Option<String>, LockError> {
        let key = self.lock_key(name);
        Ok(self
            .executor
            .eval(&scripts::OWNER, &[key.as_str()], &[])?
            .expect_optional_text(scripts::OWNER.name)?)
    }

    pub fn is_locked(&self, name: &str) -> Result<bool, LockError> {
        Ok(self.owner(name)?.is_some())
    }
}
