//! [`ScriptExecutor`] over a Redis-compatible server.
//!
//! Scripts go through `EVALSHA` with an `EVAL` fallback (handled by
//! `redis::Script`), so each one runs atomically on the server.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::script::{Script, ScriptExecutor, ScriptValue, StoreError};

/// Redis-backed script executor.
///
/// A connection is taken from the client for every call; `redis::Client` is
/// cheap to share and the coordination scripts are single round-trips.
pub struct RedisScriptExecutor {
    client: redis::Client,
    compiled: Mutex<HashMap<&'static str, redis::Script>>,
}

impl RedisScriptExecutor {
    /// Open a client for `url` (e.g. `redis://127.0.0.1:6379/0`).
    ///
    /// No connection is made until the first script runs.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: redis::Client) -> Self {
        RedisScriptExecutor {
            client,
            compiled: Mutex::new(HashMap::new()),
        }
    }

    /// Round-trip a `PING` to verify the server is reachable.
    pub fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.client.get_connection()?;
        redis::cmd("PING").query::<String>(&mut conn)?;
        Ok(())
    }

    fn compiled(&self, script: &Script) -> Result<redis::Script, StoreError> {
        let mut compiled = self
            .compiled
            .lock()
            .map_err(|_| StoreError::Poisoned("script cache"))?;
        Ok(compiled
            .entry(script.name)
            .or_insert_with(|| redis::Script::new(script.source))
            .clone())
    }
}

impl ScriptExecutor for RedisScriptExecutor {
    fn eval(
        &self,
        script: &Script,
        keys: &[&str],
        args: &[&str],
    ) -> Result<ScriptValue, StoreError> {
        let compiled = self.compiled(script)?;
        let mut invocation = compiled.prepare_invoke();
        for key in keys {
            invocation.key(*key);
        }
        for arg in args {
            invocation.arg(*arg);
        }

        let mut conn = self.client.get_connection()?;
        let reply = invocation
            .invoke::<ScriptValue>(&mut conn)
            .map_err(|err| match StoreError::from(err) {
                StoreError::Backend { message, .. } => StoreError::Backend {
                    script: script.name,
                    message,
                },
                other => other,
            })?;
        debug!(script = script.name, ?keys, reply = %reply, "script executed");
        Ok(reply)
    }
}
