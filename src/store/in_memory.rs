//! In-process store for tests and single-process deployments.
//!
//! Lua cannot run here, so each known [`Script`] is dispatched by name to a
//! native handler. All handlers run under one mutex, which gives the same
//! indivisibility a Redis server gives a script.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::lock::scripts as lock_scripts;
use crate::queue::scripts as queue_scripts;
use crate::script::{Script, ScriptExecutor, ScriptValue, StoreError};

#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, i64>,
    order: BTreeSet<(i64, String)>,
}

impl SortedSet {
    /// Returns `true` when the member is new.
    fn insert(&mut self, member: &str, score: i64) -> bool {
        match self.scores.insert(member.to_string(), score) {
            Some(previous) => {
                self.order.remove(&(previous, member.to_string()));
                self.order.insert((score, member.to_string()));
                false
            }
            None => {
                self.order.insert((score, member.to_string()));
                true
            }
        }
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.order.remove(&(score, member.to_string()));
                true
            }
            None => false,
        }
    }

    fn first(&self) -> Option<&(i64, String)> {
        self.order.iter().next()
    }

    fn len(&self) -> usize {
        self.scores.len()
    }
}

#[derive(Debug)]
enum Value {
    Str(String),
    List(VecDeque<String>),
    SortedSet(SortedSet),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Entry {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Evals between full sweeps of expired entries.
const SWEEP_EVERY: u64 = 256;

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
    evals: u64,
}

impl Keyspace {
    /// Drop every expired entry, so keys never touched again do not linger.
    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    fn tick(&mut self) {
        self.evals = self.evals.wrapping_add(1);
        if self.evals % SWEEP_EVERY == 0 {
            self.purge_expired();
        }
    }

    /// Live entry for `key`, purging it first if its TTL elapsed.
    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    fn string(&mut self, key: &str) -> Result<Option<&str>, StoreError> {
        match self.live(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.as_str())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn list(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut VecDeque<String>>, StoreError> {
        if create && self.live(key).is_none() {
            self.entries
                .insert(key.to_string(), Entry::new(Value::List(VecDeque::new())));
        }
        match self.live(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn sorted_set(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut SortedSet>, StoreError> {
        if create && self.live(key).is_none() {
            self.entries.insert(
                key.to_string(),
                Entry::new(Value::SortedSet(SortedSet::default())),
            );
        }
        match self.live(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::SortedSet(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    /// Redis deletes collections that become empty.
    fn drop_if_empty(&mut self, key: &str) {
        let empty = match self.entries.get(key).map(|e| &e.value) {
            Some(Value::List(list)) => list.is_empty(),
            Some(Value::SortedSet(set)) => set.len() == 0,
            _ => false,
        };
        if empty {
            self.entries.remove(key);
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        self.live(key).is_some() && self.entries.remove(key).is_some()
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

fn nth<'a>(
    script: &Script,
    values: &[&'a str],
    index: usize,
    what: &str,
) -> Result<&'a str, StoreError> {
    values
        .get(index)
        .copied()
        .ok_or_else(|| StoreError::InvalidArgument {
            script: script.name,
            message: format!("missing {} #{}", what, index + 1),
        })
}

fn parse_int(script: &Script, raw: &str) -> Result<i64, StoreError> {
    raw.parse::<i64>().map_err(|_| StoreError::InvalidArgument {
        script: script.name,
        message: format!("{:?} is not an integer", raw),
    })
}

fn parse_lease(script: &Script, raw: &str) -> Result<Duration, StoreError> {
    let millis = parse_int(script, raw)?;
    if millis <= 0 {
        return Err(StoreError::InvalidArgument {
            script: script.name,
            message: format!("invalid expire time {}", millis),
        });
    }
    Ok(Duration::from_millis(millis as u64))
}

fn flag(ok: bool) -> ScriptValue {
    ScriptValue::Int(i64::from(ok))
}

/// Thread-safe in-memory [`ScriptExecutor`].
///
/// Cloning yields another handle to the same keyspace, so one store can be
/// shared by many lock handles and queue consumers across threads.
///
/// ## Example
///
/// ```
/// use redis_coordination::{InMemoryStore, LockConfig, LockManager, Lock};
///
/// let store = InMemoryStore::new();
/// let manager = LockManager::new(store.clone(), LockConfig::default());
///
/// let lock = manager.get_lock("report-gen").unwrap();
/// assert!(lock.try_lock().unwrap());
/// assert!(store.contains_key("distributed_lock:report-gen"));
/// assert!(lock.unlock());
/// assert!(!store.contains_key("distributed_lock:report-gen"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    keyspace: Arc<Mutex<Keyspace>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` currently exists (expired keys do not).
    pub fn contains_key(&self, key: &str) -> bool {
        self.keyspace
            .lock()
            .map(|mut ks| ks.live(key).is_some())
            .unwrap_or(false)
    }

    /// Remaining lease of `key`, or `None` if it is absent or has no TTL.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut ks = self.keyspace.lock().ok()?;
        let at = ks.live(key)?.expires_at?;
        Some(at.saturating_duration_since(Instant::now()))
    }

    /// Remove every key (useful for test cleanup).
    pub fn clear(&self) {
        if let Ok(mut ks) = self.keyspace.lock() {
            ks.entries.clear();
        }
    }

    fn run(
        ks: &mut Keyspace,
        script: &Script,
        keys: &[&str],
        args: &[&str],
    ) -> Result<ScriptValue, StoreError> {
        match script.name {
            n if n == lock_scripts::ACQUIRE.name => {
                let key = nth(script, keys, 0, "key")?;
                let token = nth(script, args, 0, "argument")?;
                let lease = parse_lease(script, nth(script, args, 1, "argument")?)?;
                if ks.live(key).is_some() {
                    return Ok(flag(false));
                }
                ks.entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Str(token.to_string()),
                        expires_at: Some(Instant::now() + lease),
                    },
                );
                Ok(flag(true))
            }
            n if n == lock_scripts::REENTER.name || n == lock_scripts::RENEW.name => {
                let key = nth(script, keys, 0, "key")?;
                let expected = nth(script, args, 0, "argument")?;
                let lease = parse_lease(script, nth(script, args, 1, "argument")?)?;
                let owned = match ks.string(key)? {
                    Some(holder) if n == lock_scripts::REENTER.name => holder.starts_with(expected),
                    Some(holder) => holder == expected,
                    None => false,
                };
                if owned {
                    if let Some(entry) = ks.live(key) {
                        entry.expires_at = Some(Instant::now() + lease);
                    }
                }
                Ok(flag(owned))
            }
            n if n == lock_scripts::RELEASE.name => {
                let key = nth(script, keys, 0, "key")?;
                let token = nth(script, args, 0, "argument")?;
                let owned = ks.string(key)? == Some(token);
                Ok(flag(owned && ks.delete(key)))
            }
            n if n == lock_scripts::OWNER.name => {
                let key = nth(script, keys, 0, "key")?;
                Ok(ks
                    .string(key)?
                    .map(|s| ScriptValue::Text(s.to_string()))
                    .unwrap_or(ScriptValue::Nil))
            }
            n if n == queue_scripts::PUSH.name => {
                let key = nth(script, keys, 0, "key")?;
                let payload = nth(script, args, 0, "argument")?;
                let list = ks.list(key, true)?.ok_or_else(|| wrong_type(key))?;
                list.push_back(payload.to_string());
                Ok(ScriptValue::Int(list.len() as i64))
            }
            n if n == queue_scripts::POP.name => {
                let key = nth(script, keys, 0, "key")?;
                let popped = ks.list(key, false)?.and_then(|list| list.pop_front());
                ks.drop_if_empty(key);
                Ok(popped.map(ScriptValue::Text).unwrap_or(ScriptValue::Nil))
            }
            n if n == queue_scripts::LEN.name => {
                let key = nth(script, keys, 0, "key")?;
                let len = ks.list(key, false)?.map(|list| list.len()).unwrap_or(0);
                Ok(ScriptValue::Int(len as i64))
            }
            n if n == queue_scripts::DELAYED_PUSH.name => {
                let key = nth(script, keys, 0, "key")?;
                let payload = nth(script, args, 0, "argument")?;
                let score = parse_int(script, nth(script, args, 1, "argument")?)?;
                let set = ks.sorted_set(key, true)?.ok_or_else(|| wrong_type(key))?;
                Ok(flag(set.insert(payload, score)))
            }
            n if n == queue_scripts::DELAYED_POP.name => {
                let key = nth(script, keys, 0, "key")?;
                let now = parse_int(script, nth(script, args, 0, "argument")?)?;
                let popped = match ks.sorted_set(key, false)? {
                    Some(set) => match set.first().cloned() {
                        Some((score, member)) if score <= now => {
                            set.remove(&member);
                            Some(member)
                        }
                        _ => None,
                    },
                    None => None,
                };
                ks.drop_if_empty(key);
                Ok(popped.map(ScriptValue::Text).unwrap_or(ScriptValue::Nil))
            }
            n if n == queue_scripts::DELAYED_REMOVE.name => {
                let key = nth(script, keys, 0, "key")?;
                let payload = nth(script, args, 0, "argument")?;
                let removed = ks
                    .sorted_set(key, false)?
                    .map(|set| set.remove(payload))
                    .unwrap_or(false);
                ks.drop_if_empty(key);
                Ok(ScriptValue::Int(i64::from(removed)))
            }
            n if n == queue_scripts::DELAYED_LEN.name => {
                let key = nth(script, keys, 0, "key")?;
                let len = ks.sorted_set(key, false)?.map(|set| set.len()).unwrap_or(0);
                Ok(ScriptValue::Int(len as i64))
            }
            n if n == queue_scripts::DESTROY.name => {
                let deleted = keys.iter().filter(|key| ks.delete(key)).count();
                Ok(ScriptValue::Int(deleted as i64))
            }
            other => Err(StoreError::Backend {
                script: script.name,
                message: format!("no in-memory handler for script {}", other),
            }),
        }
    }
}

impl ScriptExecutor for InMemoryStore {
    fn eval(
        &self,
        script: &Script,
        keys: &[&str],
        args: &[&str],
    ) -> Result<ScriptValue, StoreError> {
        let mut ks = self
            .keyspace
            .lock()
            .map_err(|_| StoreError::Poisoned("script eval"))?;
        ks.tick();
        Self::run(&mut ks, script, keys, args)
    }
}
