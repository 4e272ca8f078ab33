use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use redis_coordination::{DelayedQueue, InMemoryStore, ManualClock, QueueConfig};
use serde::{Deserialize, Serialize};

const NOW: u64 = 1_760_000_000;

fn queue() -> (DelayedQueue<InMemoryStore>, ManualClock) {
    let clock = ManualClock::new(NOW);
    let queue = DelayedQueue::new(InMemoryStore::new(), QueueConfig::default())
        .unwrap()
        .with_clock(clock.clone());
    (queue, clock)
}

// =============================================================================
// Ordering by ready-at
// =============================================================================

#[test]
fn items_become_available_in_ready_at_order() {
    let (queue, clock) = queue();
    queue.enqueue_delayed("tasks", "ten", NOW + 10).unwrap();
    queue.enqueue_delayed("tasks", "one", NOW + 1).unwrap();
    queue.enqueue_delayed("tasks", "five", NOW + 5).unwrap();

    assert_eq!(queue.dequeue_delayed("tasks").unwrap(), None);

    clock.advance(Duration::from_secs(1));
    assert_eq!(queue.dequeue_delayed("tasks").unwrap().as_deref(), Some("one"));
    assert_eq!(queue.dequeue_delayed("tasks").unwrap(), None);
    assert_eq!(queue.delayed_len("tasks").unwrap(), 2);

    queue.enqueue_delayed("tasks", "one", NOW + 1).unwrap();
    clock.set(NOW + 10);
    let drained: Vec<String> = (0..3)
        .map(|_| queue.dequeue_delayed("tasks").unwrap().unwrap())
        .collect();
    assert_eq!(drained, vec!["one", "five", "ten"]);
    assert_eq!(queue.dequeue_delayed("tasks").unwrap(), None);
}

#[test]
fn empty_queue_pops_nothing() {
    let (queue, _) = queue();
    assert_eq!(queue.dequeue_delayed("nothing").unwrap(), None);
    assert_eq!(queue.dequeue("nothing").unwrap(), None);
}

#[test]
fn queues_are_independent_by_name() {
    let (queue, _) = queue();
    queue.enqueue_delayed("a", "for-a", NOW).unwrap();
    assert_eq!(queue.dequeue_delayed("b").unwrap(), None);
    assert_eq!(queue.dequeue_delayed("a").unwrap().as_deref(), Some("for-a"));
}

#[test]
fn fifo_preserves_insertion_order() {
    let (queue, _) = queue();
    for n in 0..5 {
        queue.enqueue("plain", &n.to_string()).unwrap();
    }
    let drained: Vec<String> = std::iter::from_fn(|| queue.dequeue("plain").unwrap()).collect();
    assert_eq!(drained, vec!["0", "1", "2", "3", "4"]);
}

// =============================================================================
// Atomic pop under contention
// =============================================================================

#[test]
fn exactly_one_consumer_receives_a_ready_item() {
    let (queue, _) = queue();
    queue.enqueue_delayed("race", "only-one", NOW).unwrap();

    let consumers = 12;
    let barrier = Arc::new(Barrier::new(consumers));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = queue.clone();
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                barrier.wait();
                if queue.dequeue_delayed("race").unwrap().is_some() {
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
fn concurrent_consumers_split_items_without_duplicates() {
    let (queue, _) = queue();
    for n in 0..200 {
        queue.enqueue_delayed("bulk", &format!("item-{}", n), NOW).unwrap();
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let queue = queue.clone();
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                while let Some(item) = queue.dequeue_delayed("bulk").unwrap() {
                    seen.lock().unwrap().push(item);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 200);
}

// =============================================================================
// Removal and teardown
// =============================================================================

#[test]
fn removed_item_is_never_delivered() {
    let (queue, clock) = queue();
    queue.enqueue_delayed("q", "cancelled", NOW + 5).unwrap();
    queue.enqueue_delayed("q", "kept", NOW + 6).unwrap();
    assert!(queue.remove("q", "cancelled").unwrap());

    clock.advance(Duration::from_secs(10));
    assert_eq!(queue.dequeue_delayed("q").unwrap().as_deref(), Some("kept"));
    assert_eq!(queue.dequeue_delayed("q").unwrap(), None);
}

#[test]
fn destroy_empties_the_queue() {
    let (queue, clock) = queue();
    queue.enqueue("q", "plain").unwrap();
    queue.enqueue_delayed("q", "later", NOW + 1).unwrap();
    assert!(queue.destroy("q").unwrap());

    clock.advance(Duration::from_secs(5));
    assert_eq!(queue.dequeue("q").unwrap(), None);
    assert_eq!(queue.dequeue_delayed("q").unwrap(), None);
}

// =============================================================================
// Typed payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ReportJob {
    report: String,
    requested_by: String,
}

#[test]
fn typed_jobs_wait_until_due() {
    let (queue, clock) = queue();
    let job = ReportJob {
        report: "monthly".into(),
        requested_by: "ops".into(),
    };
    queue.enqueue_delayed_json("reports", &job, NOW + 60).unwrap();
    assert_eq!(queue.dequeue_delayed_json::<ReportJob>("reports").unwrap(), None);

    clock.advance(Duration::from_secs(60));
    assert_eq!(
        queue.dequeue_delayed_json::<ReportJob>("reports").unwrap(),
        Some(job.clone())
    );

    queue.enqueue_json("reports", &job).unwrap();
    assert_eq!(queue.dequeue_json::<ReportJob>("reports").unwrap(), Some(job));
}
