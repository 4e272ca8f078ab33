use std::thread;
use std::time::Duration;

use redis_coordination::Lock;

use crate::support::{key, manager};

// =============================================================================
// Reentrancy
// =============================================================================

#[test]
fn nested_handle_on_same_thread_reenters() {
    let (manager, store) = manager(Duration::from_secs(10), Duration::from_millis(5));
    let outer = manager.get_lock("nested").unwrap();
    let inner = manager.get_lock("nested").unwrap();

    assert!(outer.try_lock().unwrap());
    assert!(!outer.is_reentrant());
    assert!(inner.try_lock().unwrap());
    assert!(inner.is_reentrant());

    // The store still records the outer holder.
    assert_eq!(manager.owner("nested").unwrap(), Some(outer.token().to_string()));

    assert!(inner.unlock());
    assert!(store.contains_key(&key("nested")));

    assert!(outer.unlock());
    assert!(!store.contains_key(&key("nested")));
}

#[test]
fn reentrant_hold_still_excludes_other_threads() {
    let (manager, _) = manager(Duration::from_secs(10), Duration::from_millis(5));
    let outer = manager.get_lock("shared").unwrap();
    let inner = manager.get_lock("shared").unwrap();
    assert!(outer.try_lock().unwrap());
    assert!(inner.try_lock().unwrap());
    assert!(inner.unlock());

    let contender = manager.clone();
    let acquired = thread::spawn(move || {
        contender
            .get_lock("shared")
            .unwrap()
            .try_lock_for(Duration::from_millis(50))
            .unwrap()
    })
    .join()
    .unwrap();
    assert!(!acquired);

    assert!(outer.unlock());
    let contender = manager.clone();
    let acquired = thread::spawn(move || {
        let lock = contender.get_lock("shared").unwrap();
        let acquired = lock.try_lock().unwrap();
        lock.unlock();
        acquired
    })
    .join()
    .unwrap();
    assert!(acquired);
}

#[test]
fn reentry_refreshes_the_lease() {
    let (manager, store) = manager(Duration::from_millis(300), Duration::from_millis(5));
    let outer = manager.get_lock("refresh").unwrap();
    assert!(outer.try_lock().unwrap());

    thread::sleep(Duration::from_millis(200));
    let inner = manager.get_lock("refresh").unwrap();
    assert!(inner.try_lock().unwrap());
    assert!(store.ttl(&key("refresh")).unwrap() > Duration::from_millis(200));

    thread::sleep(Duration::from_millis(200));
    assert!(store.contains_key(&key("refresh")));
    assert!(outer.unlock());
}

#[test]
fn handle_moved_to_another_thread_keeps_its_origin_identity() {
    let (manager, _) = manager(Duration::from_secs(10), Duration::from_millis(5));
    let outer = manager.get_lock("moved").unwrap();
    assert!(outer.try_lock().unwrap());

    // Built here, used there: still counts as this thread's identity.
    let inner = manager.get_lock("moved").unwrap();
    let reentrant = thread::spawn(move || {
        assert!(inner.try_lock().unwrap());
        inner.is_reentrant()
    })
    .join()
    .unwrap();
    assert!(reentrant);
    assert!(outer.unlock());
}
