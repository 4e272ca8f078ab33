//! Atomic script boundary.
//!
//! The lock and the delayed queue never talk to the store directly. Every
//! store interaction is a named [`Script`] run through a [`ScriptExecutor`],
//! which must execute it indivisibly with respect to every other operation
//! touching the same keys.
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │ DistributedLock  │   │  DelayedQueue    │
//! └────────┬─────────┘   └────────┬─────────┘
//!          │  eval(script, keys, args)       │
//!          ▼                                 ▼
//! ┌─────────────────────────────────────────────┐
//! │             ScriptExecutor trait             │
//! └─────────────────────────────────────────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌──────────────────┐   ┌──────────────────────┐
//! │  InMemoryStore   │   │ RedisScriptExecutor  │
//! │   (included)     │   │  (feature "redis")   │
//! └──────────────────┘   └──────────────────────┘
//! ```

mod error;
mod value;

pub use error::StoreError;
pub use value::ScriptValue;

use std::sync::Arc;

/// A named server-side script.
///
/// `source` is the Lua body sent to a Redis-compatible store. `name` is a
/// stable identifier that executors which cannot run Lua (such as
/// [`InMemoryStore`](crate::InMemoryStore)) dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Script {
    pub name: &'static str,
    pub source: &'static str,
}

impl Script {
    pub const fn new(name: &'static str, source: &'static str) -> Self {
        Script { name, source }
    }
}

/// Executes a [`Script`] atomically against the store.
///
/// Implementations must guarantee that the script runs without any other
/// operation on the same keys interleaving with it.
pub trait ScriptExecutor: Send + Sync {
    fn eval(
        &self,
        script: &Script,
        keys: &[&str],
        args: &[&str],
    ) -> Result<ScriptValue, StoreError>;
}

impl<E: ScriptExecutor + ?Sized> ScriptExecutor for Arc<E> {
    fn eval(
        &self,
        script: &Script,
        keys: &[&str],
        args: &[&str],
    ) -> Result<ScriptValue, StoreError> {
        (**self).eval(script, keys, args)
    }
}

impl<E: ScriptExecutor + ?Sized> ScriptExecutor for &E {
    fn eval(
        &self,
        script: &Script,
        keys: &[&str],
        args: &[&str],
    ) -> Result<ScriptValue, StoreError> {
        (**self).eval(script, keys, args)
    }
}
