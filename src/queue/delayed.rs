use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::scripts;
use super::{Clock, QueueConfig, QueueError, SystemClock};
use crate::script::ScriptExecutor;

/// Producer/consumer handle for named queues in the shared store.
///
/// ## Example
///
/// ```
/// use redis_coordination::{DelayedQueue, InMemoryStore, ManualClock, QueueConfig};
/// use std::time::Duration;
///
/// let clock = ManualClock::new(1_000);
/// let queue = DelayedQueue::new(InMemoryStore::new(), QueueConfig::default())
///     .unwrap()
///     .with_clock(clock.clone());
///
/// queue.enqueue_delayed("emails", "welcome:42", 1_030).unwrap();
/// assert_eq!(queue.dequeue_delayed("emails").unwrap(), None);
///
/// clock.advance(Duration::from_secs(30));
/// assert_eq!(queue.dequeue_delayed("emails").unwrap().as_deref(), Some("welcome:42"));
/// ```
pub struct DelayedQueue<E> {
    executor: Arc<E>,
    config: QueueConfig,
    clock: Arc<dyn Clock>,
}

impl<E> Clone for DelayedQueue<E> {
    fn clone(&self) -> Self {
        DelayedQueue {
            executor: Arc::clone(&self.executor),
            config: self.config.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<E: ScriptExecutor> DelayedQueue<E> {
    pub fn new(executor: E, config: QueueConfig) -> Result<Self, QueueError> {
        Self::from_arc(Arc::new(executor), config)
    }

    pub fn from_arc(executor: Arc<E>, config: QueueConfig) -> Result<Self, QueueError> {
        config.validate()?;
        Ok(DelayedQueue {
            executor,
            config,
            clock: Arc::new(SystemClock),
        })
    }

    /// Decide readiness with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn list_key(&self, queue: &str) -> Result<String, QueueError> {
        check_name(queue)?;
        Ok(format!("{}:{}", self.config.namespace, queue))
    }

    fn delayed_key(&self, queue: &str) -> Result<String, QueueError> {
        check_name(queue)?;
        Ok(format!("{}:{}", self.config.delayed_namespace, queue))
    }

    /// Append `payload` to the FIFO list of `queue`.
    pub fn enqueue(&self, queue: &str, payload: &str) -> Result<(), QueueError> {
        let key = self.list_key(queue)?;
        self.executor.eval(&scripts::PUSH, &[key.as_str()], &[payload])?;
        debug!(key = %key, payload, "item enqueued");
        Ok(())
    }

    /// Take the oldest item of the FIFO list.
    pub fn dequeue(&self, queue: &str) -> Result<Option<String>, QueueError> {
        let key = self.list_key(queue)?;
        let item = self
            .executor
            .eval(&scripts::POP, &[key.as_str()], &[])?
            .expect_optional_text(scripts::POP.name)?;
        if let Some(payload) = &item {
            debug!(key = %key, payload = %payload, "item dequeued");
        }
        Ok(item)
    }

    /// Schedule `payload` to become due at `ready_at` (epoch seconds).
    ///
    /// Payloads are unique within a queue: scheduling one that is already
    /// waiting moves it to the new time. Returns `true` if it was new.
    pub fn enqueue_delayed(
        &self,
        queue: &str,
        payload: &str,
        ready_at: u64,
    ) -> Result<bool, QueueError> {
        let key = self.delayed_key(queue)?;
        let score = ready_at.to_string();
        let inserted = self
            .executor
            .eval(
                &scripts::DELAYED_PUSH,
                &[key.as_str()],
                &[payload, score.as_str()],
            )?
            .is_truthy();
        debug!(key = %key, payload, ready_at, inserted, "delayed item scheduled");
        Ok(inserted)
    }

    /// Schedule `payload` to become due `delay` from now, rounded up to the
    /// next whole second.
    pub fn enqueue_delayed_after(
        &self,
        queue: &str,
        payload: &str,
        delay: Duration,
    ) -> Result<bool, QueueError> {
        let secs = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
        let ready_at = self.clock.now_epoch_secs().saturating_add(secs);
        self.enqueue_delayed(queue, payload, ready_at)
    }

    /// Take the earliest delayed item if it is due; otherwise `None` and
    /// nothing changes.
    pub fn dequeue_delayed(&self, queue: &str) -> Result<Option<String>, QueueError> {
        let key = self.delayed_key(queue)?;
        let now = self.clock.now_epoch_secs().to_string();
        let item = self
            .executor
            .eval(&scripts::DELAYED_POP, &[key.as_str()], &[now.as_str()])?
            .expect_optional_text(scripts::DELAYED_POP.name)?;
        if let Some(payload) = &item {
            debug!(key = %key, payload = %payload, "delayed item dequeued");
        }
        Ok(item)
    }

    /// Drop a delayed item whether or not it is due. Returns whether it existed.
    pub fn remove(&self, queue: &str, payload: &str) -> Result<bool, QueueError> {
        let key = self.delayed_key(queue)?;
        let removed = self
            .executor
            .eval(&scripts::DELAYED_REMOVE, &[key.as_str()], &[payload])?
            .is_truthy();
        debug!(key = %key, payload, removed, "delayed item removed");
        Ok(removed)
    }

    /// Delete both collections of `queue`. Returns whether anything existed.
    pub fn destroy(&self, queue: &str) -> Result<bool, QueueError> {
        let list = self.list_key(queue)?;
        let delayed = self.delayed_key(queue)?;
        let deleted = self
            .executor
            .eval(&scripts::DESTROY, &[list.as_str(), delayed.as_str()], &[])?
            .expect_int(scripts::DESTROY.name)?;
        debug!(queue, deleted, "queue destroyed");
        Ok(deleted > 0)
    }

    /// Number of items waiting in the FIFO list.
    pub fn len(&self, queue: &str) -> Result<usize, QueueError> {
        let key = self.list_key(queue)?;
        let len = self
            .executor
            .eval(&scripts::LEN, &[key.as_str()], &[])?
            .expect_int(scripts::LEN.name)?;
        Ok(len.max(0) as usize)
    }

    pub fn is_empty(&self, queue: &str) -> Result<bool, QueueError> {
        Ok(self.len(queue)? == 0)
    }

    /// Number of delayed items, due or not.
    pub fn delayed_len(&self, queue: &str) -> Result<usize, QueueError> {
        let key = self.delayed_key(queue)?;
        let len = self
            .executor
            .eval(&scripts::DELAYED_LEN, &[key.as_str()], &[])?
            .expect_int(scripts::DELAYED_LEN.name)?;
        Ok(len.max(0) as usize)
    }

    // ========================================================================
    // Typed payloads
    // ========================================================================

    pub fn enqueue_json<T: Serialize>(&self, queue: &str, item: &T) -> Result<(), QueueError> {
        let payload = serde_json::to_string(item)?;
        self.enqueue(queue, &payload)
    }

    pub fn dequeue_json<T: DeserializeOwned>(&self, queue: &str) -> Result<Option<T>, QueueError> {
        self.dequeue(queue)?
            .map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(QueueError::from)
    }

    pub fn enqueue_delayed_json<T: Serialize>(
        &self,
        queue: &str,
        item: &T,
        ready_at: u64,
    ) -> Result<bool, QueueError> {
        let payload = serde_json::to_string(item)?;
        self.enqueue_delayed(queue, &payload, ready_at)
    }

    pub fn dequeue_delayed_json<T: DeserializeOwned>(
        &self,
        queue: &str,
    ) -> Result<Option<T>, QueueError> {
        self.dequeue_delayed(queue)?
            .map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(QueueError::from)
    }
}

fn check_name(queue: &str) -> Result<(), QueueError> {
    if queue.trim().is_empty() {
        return Err(QueueError::InvalidName(queue.to_string()));
    }
    Ok(())
}
