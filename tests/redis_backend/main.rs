//! Runs the primitives against a live server.
//!
//! ```text
//! REDIS_URL=redis://127.0.0.1:6379/15 cargo test --test redis_backend -- --ignored
//! ```

#![cfg(feature = "redis")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use redis_coordination::{
    DelayedQueue, IdentityProvider, Lock, LockConfig, LockManager, QueueConfig,
    RedisScriptExecutor, StoreError,
};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string())
}

fn executor() -> Arc<RedisScriptExecutor> {
    let executor = RedisScriptExecutor::open(&redis_url()).unwrap();
    executor.ping().expect("redis not reachable; set REDIS_URL");
    Arc::new(executor)
}

/// Unique per test run so parallel runs against one server do not collide.
fn unique(name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", name, nanos)
}

fn manager(lease: Duration) -> LockManager<RedisScriptExecutor> {
    LockManager::from_arc(
        executor(),
        LockConfig::default()
            .with_namespace("redis_coordination_test")
            .with_lease(lease)
            .with_poll_interval(Duration::from_millis(10)),
    )
    .with_identity(IdentityProvider::new())
}

#[test]
#[ignore]
fn lock_acquire_reenter_release() {
    let manager = manager(Duration::from_secs(5));
    let name = unique("lock");
    let outer = manager.get_lock(&name).unwrap();
    let inner = manager.get_lock(&name).unwrap();

    assert!(outer.try_lock().unwrap());
    assert!(inner.try_lock().unwrap());
    assert!(inner.is_reentrant());
    assert!(inner.unlock());
    assert!(manager.is_locked(&name).unwrap());
    assert!(outer.unlock());
    assert!(!manager.is_locked(&name).unwrap());
}

#[test]
#[ignore]
fn lock_excludes_other_threads_and_expires() {
    let manager = manager(Duration::from_millis(300));
    let name = unique("expiry");
    let holder = manager.get_lock(&name).unwrap();
    assert!(holder.try_lock().unwrap());

    let other = manager.clone();
    let waited_out = thread::spawn(move || {
        let lock = other.get_lock(&name).unwrap();
        let immediate = lock.try_lock().unwrap();
        let eventually = lock.try_lock_for(Duration::from_secs(3)).unwrap();
        lock.unlock();
        (immediate, eventually)
    })
    .join()
    .unwrap();
    assert_eq!(waited_out, (false, true));
    assert!(!holder.unlock());
}

#[test]
#[ignore]
fn concurrent_try_lock_has_one_winner() {
    let manager = manager(Duration::from_secs(5));
    let name = unique("contend");
    let barrier = Arc::new(Barrier::new(8));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            let name = name.clone();
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                let lock = manager.get_lock(&name).unwrap();
                barrier.wait();
                if lock.try_lock().unwrap() {
                    winners.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(50));
                    lock.unlock();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(winners.load(Ordering::SeqCst), 1);
}

#[test]
#[ignore]
fn delayed_queue_pops_only_due_items() {
    let queue = DelayedQueue::from_arc(executor(), QueueConfig::default()).unwrap();
    let name = unique("delayed");
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    queue.enqueue_delayed(&name, "due", now - 1).unwrap();
    queue.enqueue_delayed(&name, "future", now + 3_600).unwrap();

    assert_eq!(queue.dequeue_delayed(&name).unwrap().as_deref(), Some("due"));
    assert_eq!(queue.dequeue_delayed(&name).unwrap(), None);
    assert_eq!(queue.delayed_len(&name).unwrap(), 1);
    assert!(queue.destroy(&name).unwrap());
}

#[test]
#[ignore]
fn fifo_queue_round_trip() {
    let queue = DelayedQueue::from_arc(executor(), QueueConfig::default()).unwrap();
    let name = unique("fifo");
    queue.enqueue(&name, "first").unwrap();
    queue.enqueue(&name, "second").unwrap();
    assert_eq!(queue.dequeue(&name).unwrap().as_deref(), Some("first"));
    assert_eq!(queue.dequeue(&name).unwrap().as_deref(), Some("second"));
    assert_eq!(queue.dequeue(&name).unwrap(), None);
}

#[test]
fn unreachable_server_is_a_connection_error() {
    let executor = RedisScriptExecutor::open("redis://127.0.0.1:1/").unwrap();
    let manager = LockManager::new(executor, LockConfig::default());
    let lock = manager.get_lock("unreachable").unwrap();
    match lock.try_lock() {
        Err(redis_coordination::LockError::Store(StoreError::Connection(_))) => {}
        other => panic!("expected connection error, got {:?}", other),
    }
    assert!(!lock.unlock());
}
