use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use redis_coordination::Lock;

use crate::support::manager;

// =============================================================================
// Mutual exclusion
// =============================================================================

#[test]
fn only_one_of_many_concurrent_attempts_succeeds() {
    let (manager, _) = manager(Duration::from_secs(10), Duration::from_millis(5));
    let contenders = 16;
    let barrier = Arc::new(Barrier::new(contenders));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..contenders)
        .map(|_| {
            let manager = manager.clone();
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                let lock = manager.get_lock("single-shot").unwrap();
                barrier.wait();
                if lock.try_lock().unwrap() {
                    winners.fetch_add(1, Ordering::SeqCst);
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
fn critical_section_never_has_two_occupants() {
    let (manager, _) = manager(Duration::from_secs(10), Duration::from_millis(1));
    let occupants = Arc::new(AtomicUsize::new(0));
    let entries = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let manager = manager.clone();
            let occupants = Arc::clone(&occupants);
            let entries = Arc::clone(&entries);
            thread::spawn(move || {
                let lock = manager.get_lock("counter").unwrap();
                for _ in 0..10 {
                    assert!(lock.try_lock_for(Duration::from_secs(5)).unwrap());
                    assert!(!lock.is_reentrant());
                    let inside = occupants.fetch_add(1, Ordering::SeqCst) + 1;
                    assert_eq!(inside, 1, "two holders inside the critical section");
                    thread::sleep(Duration::from_millis(1));
                    occupants.fetch_sub(1, Ordering::SeqCst);
                    entries.fetch_add(1, Ordering::SeqCst);
                    assert!(lock.unlock());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(entries.load(Ordering::SeqCst), 60);
}

#[test]
fn different_names_do_not_contend() {
    let (manager, _) = manager(Duration::from_secs(10), Duration::from_millis(5));
    let a = manager.get_lock("alpha").unwrap();
    assert!(a.try_lock().unwrap());

    let other = {
        let manager = manager.clone();
        thread::spawn(move || {
            let b = manager.get_lock("beta").unwrap();
            let acquired = b.try_lock().unwrap();
            b.unlock();
            acquired
        })
        .join()
        .unwrap()
    };
    assert!(other);
    assert!(a.unlock());
}

#[test]
fn unlock_is_idempotent() {
    let (manager, store) = manager(Duration::from_secs(10), Duration::from_millis(5));
    let never = manager.get_lock("idem").unwrap();
    assert!(!never.unlock());

    let lock = manager.get_lock("idem").unwrap();
    assert!(lock.try_lock().unwrap());
    assert!(lock.unlock());
    assert!(!lock.unlock());
    assert!(!store.contains_key(&crate::support::key("idem")));

    // A second release must not disturb a later holder.
    let later = {
        let manager = manager.clone();
        thread::spawn(move || {
            let later = manager.get_lock("idem").unwrap();
            assert!(later.try_lock().unwrap());
            later.token().to_string()
        })
        .join()
        .unwrap()
    };
    assert!(!lock.unlock());
    assert_eq!(manager.owner("idem").unwrap(), Some(later));
}
