//! Blocking behaviour of the lock manager under real threads

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use travel_common::TransactionId;
use travel_lock::{LockError, LockManager, LockMode};

fn txn(n: u64) -> TransactionId {
    TransactionId::new(n)
}

/// Poll until `condition` holds, failing the test after a few seconds
fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

fn spawn_lock(
    manager: &Arc<LockManager>,
    id: u64,
    key: &'static str,
    mode: LockMode,
) -> thread::JoinHandle<Result<(), LockError>> {
    let manager = manager.clone();
    thread::spawn(move || manager.lock(txn(id), key, mode))
}

// ============================================================================
// Blocking and release
// ============================================================================

#[test]
fn test_writer_blocks_until_release() {
    let manager = Arc::new(LockManager::with_timeout(Duration::from_secs(5)));
    manager.lock(txn(1), "flights", LockMode::Write).unwrap();

    let blocked = spawn_lock(&manager, 2, "flights", LockMode::Write);
    wait_until(|| manager.waiting("flights").len() == 1);

    // Still only the first writer holds the key
    assert_eq!(manager.holders("flights"), vec![(txn(1), LockMode::Write)]);

    manager.unlock_all(txn(1));
    blocked.join().unwrap().unwrap();

    assert_eq!(manager.holders("flights"), vec![(txn(2), LockMode::Write)]);
    assert!(manager.waiting("flights").is_empty());
}

#[test]
fn test_writers_are_mutually_exclusive() {
    let manager = Arc::new(LockManager::with_timeout(Duration::from_secs(5)));
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (1..=8)
        .map(|id| {
            let manager = manager.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            thread::spawn(move || {
                manager.lock(txn(id), "rooms", LockMode::Write).unwrap();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                inside.fetch_sub(1, Ordering::SeqCst);
                manager.unlock_all(txn(id));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[test]
fn test_release_grants_read_prefix_then_writer() {
    let manager = Arc::new(LockManager::with_timeout(Duration::from_secs(5)));
    manager.lock(txn(1), "cars", LockMode::Write).unwrap();

    // Queue: R2, R3, W4, R5 (enqueued one at a time to fix the order)
    let r2 = spawn_lock(&manager, 2, "cars", LockMode::Read);
    wait_until(|| manager.waiting("cars").len() == 1);
    let r3 = spawn_lock(&manager, 3, "cars", LockMode::Read);
    wait_until(|| manager.waiting("cars").len() == 2);
    let w4 = spawn_lock(&manager, 4, "cars", LockMode::Write);
    wait_until(|| manager.waiting("cars").len() == 3);
    let r5 = spawn_lock(&manager, 5, "cars", LockMode::Read);
    wait_until(|| manager.waiting("cars").len() == 4);

    manager.unlock_all(txn(1));
    r2.join().unwrap().unwrap();
    r3.join().unwrap().unwrap();

    assert_eq!(
        manager.holders("cars"),
        vec![(txn(2), LockMode::Read), (txn(3), LockMode::Read)]
    );
    assert_eq!(
        manager.waiting("cars"),
        vec![(txn(4), LockMode::Write), (txn(5), LockMode::Read)]
    );

    // The writer needs every reader gone
    manager.unlock_all(txn(2));
    assert_eq!(manager.waiting("cars").len(), 2);
    manager.unlock_all(txn(3));
    w4.join().unwrap().unwrap();
    assert_eq!(manager.holders("cars"), vec![(txn(4), LockMode::Write)]);

    manager.unlock_all(txn(4));
    r5.join().unwrap().unwrap();
    assert_eq!(manager.holders("cars"), vec![(txn(5), LockMode::Read)]);
}

// ============================================================================
// Deadlock detection and cancellation
// ============================================================================

#[test]
fn test_lock_cycle_is_reported_as_deadlock() {
    let manager = Arc::new(LockManager::with_timeout(Duration::from_millis(200)));
    manager.lock(txn(1), "flights", LockMode::Write).unwrap();
    manager.lock(txn(2), "cars", LockMode::Write).unwrap();

    let t1 = spawn_lock(&manager, 1, "cars", LockMode::Write);
    let t2 = spawn_lock(&manager, 2, "flights", LockMode::Write);

    let results = [t1.join().unwrap(), t2.join().unwrap()];
    for result in results {
        assert!(
            matches!(result, Err(LockError::Deadlock { .. })),
            "expected deadlock, got {:?}",
            result
        );
    }

    // Neither transaction lost the lock it already held
    assert_eq!(
        manager.locks_held_by(txn(1)),
        vec![("flights".to_string(), LockMode::Write)]
    );
    assert_eq!(
        manager.locks_held_by(txn(2)),
        vec![("cars".to_string(), LockMode::Write)]
    );
}

#[test]
fn test_deadlock_is_reported_after_timeout() {
    let timeout = Duration::from_millis(150);
    let manager = LockManager::with_timeout(timeout);
    manager.lock(txn(1), "flights", LockMode::Write).unwrap();

    let started = Instant::now();
    let err = manager.lock(txn(2), "flights", LockMode::Write).unwrap_err();

    assert!(started.elapsed() >= timeout);
    assert!(matches!(err, LockError::Deadlock { .. }));
}

#[test]
fn test_unlock_all_cancels_pending_wait() {
    let manager = Arc::new(LockManager::with_timeout(Duration::from_secs(30)));
    manager.lock(txn(1), "rooms", LockMode::Write).unwrap();

    let blocked = spawn_lock(&manager, 2, "rooms", LockMode::Read);
    wait_until(|| manager.waiting("rooms").len() == 1);

    let started = Instant::now();
    manager.unlock_all(txn(2));
    let result = blocked.join().unwrap();

    assert_eq!(
        result,
        Err(LockError::Aborted {
            txn: txn(2),
            key: "rooms".to_string()
        })
    );
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(manager.waiting("rooms").is_empty());
    assert_eq!(manager.holders("rooms"), vec![(txn(1), LockMode::Write)]);
}

#[test]
fn test_upgrade_waits_for_other_readers() {
    let manager = Arc::new(LockManager::with_timeout(Duration::from_secs(5)));
    manager.lock(txn(1), "customers", LockMode::Read).unwrap();
    manager.lock(txn(2), "customers", LockMode::Read).unwrap();

    let upgrade = spawn_lock(&manager, 1, "customers", LockMode::Write);
    wait_until(|| manager.waiting("customers").len() == 1);

    manager.unlock_all(txn(2));
    upgrade.join().unwrap().unwrap();

    assert_eq!(
        manager.holders("customers"),
        vec![(txn(1), LockMode::Write)]
    );
}

#[test]
fn test_redundant_read_never_blocks_behind_writer() {
    let manager = Arc::new(LockManager::with_timeout(Duration::from_secs(5)));
    manager.lock(txn(1), "flights", LockMode::Read).unwrap();

    // A writer queues behind the reader
    let writer = spawn_lock(&manager, 2, "flights", LockMode::Write);
    wait_until(|| manager.waiting("flights").len() == 1);

    // Re-requesting the held read lock returns at once
    let started = Instant::now();
    manager.lock(txn(1), "flights", LockMode::Read).unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    manager.unlock_all(txn(1));
    writer.join().unwrap().unwrap();
}
