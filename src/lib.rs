//! Coordination primitives over a shared Redis-compatible store.
//!
//! - [`DistributedLock`]: reentrant mutual exclusion with a TTL lease,
//!   ownership proven by an [`IdentityToken`] (`host:thread:serial`).
//! - [`DelayedQueue`]: FIFO and time-ordered queues with an atomic
//!   "pop if due" operation.
//!
//! Both issue every store operation as an atomic [`Script`] through a
//! [`ScriptExecutor`]. [`RedisScriptExecutor`] runs them on a Redis server;
//! [`InMemoryStore`] runs them in-process for tests.
//!
//! ```
//! use redis_coordination::{InMemoryStore, Lock, LockConfig, LockManager};
//! use std::time::Duration;
//!
//! let manager = LockManager::new(
//!     InMemoryStore::new(),
//!     LockConfig::default().with_lease(Duration::from_secs(2)),
//! );
//!
//! let lock = manager.get_lock("report-gen").unwrap();
//! if lock.try_lock_for(Duration::from_millis(500)).unwrap() {
//!     // critical section
//!     lock.unlock();
//! }
//! ```

mod config;
mod identity;
mod lock;
mod queue;
mod script;
mod store;

pub use config::{ConfigError, CoordinationConfig, DEFAULT_REDIS_URL};
pub use identity::{
    local_host_address, IdentityProvider, IdentityToken, SerialCounter, SERIAL_MAX,
};
pub use lock::{
    CancelFlag, DistributedLock, Lock, LockConfig, LockError, LockGuard, LockManager,
    DEFAULT_LEASE, DEFAULT_NAMESPACE, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
pub use queue::{
    Clock, DelayedQueue, ManualClock, QueueConfig, QueueError, SystemClock,
    DEFAULT_DELAYED_NAMESPACE, DEFAULT_QUEUE_NAMESPACE,
};
pub use script::{Script, ScriptExecutor, ScriptValue, StoreError};
#[cfg(feature = "redis")]
pub use store::RedisScriptExecutor;
pub use store::InMemoryStore;

/// Lua sources of every script the lock and queue run, for deployments that
/// preload them (`SCRIPT LOAD`) or port them to another store.
pub mod scripts {
    pub use crate::lock::scripts::{ACQUIRE, OWNER, REENTER, RELEASE, RENEW};
    pub use crate::queue::scripts::{
        DELAYED_LEN, DELAYED_POP, DELAYED_PUSH, DELAYED_REMOVE, DESTROY, LEN, POP, PUSH,
    };
}

#[cfg(feature = "redis")]
impl CoordinationConfig {
    /// Open a [`RedisScriptExecutor`] for `redis_url`.
    pub fn redis_executor(&self) -> Result<RedisScriptExecutor, StoreError> {
        RedisScriptExecutor::open(&self.redis_url)
    }
}
