//! Blocking lock manager
//!
//! Wraps a [`LockTable`] with per-key FIFO wait queues. A caller whose
//! request conflicts is parked on its own condition variable until a release
//! grants it the lock, its transaction is aborted, or the deadlock timeout
//! expires.
//!
//! Three mutexes guard the lock table, the wait table and the wait-start
//! table. They are always taken in that order.

use crate::error::{LockError, Result};
use crate::table::{LockAttemptResult, LockMode, LockTable};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use travel_common::TransactionId;

/// How long a transaction may stay blocked before it is declared deadlocked
pub const DEADLOCK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitSignal {
    Waiting,
    Granted,
    Cancelled,
}

/// A blocked lock request and its wake handle
#[derive(Debug)]
struct Waiter {
    txn: TransactionId,
    mode: LockMode,
    signal: Mutex<WaitSignal>,
    ready: Condvar,
}

impl Waiter {
    fn new(txn: TransactionId, mode: LockMode) -> Self {
        Self {
            txn,
            mode,
            signal: Mutex::new(WaitSignal::Waiting),
            ready: Condvar::new(),
        }
    }

    fn wake(&self, signal: WaitSignal) {
        *self.signal.lock() = signal;
        self.ready.notify_one();
    }
}

type WaitQueues = HashMap<String, VecDeque<Arc<Waiter>>>;

/// Lock manager owned by one participant service
pub struct LockManager {
    /// Granted locks
    table: Mutex<LockTable>,

    /// Blocked requests per key, oldest first
    waiters: Mutex<WaitQueues>,

    /// When each blocked transaction started waiting
    wait_started: Mutex<HashMap<TransactionId, Instant>>,

    /// Deadlock detection threshold
    timeout: Duration,
}

impl LockManager {
    /// Create a lock manager with the standard deadlock timeout
    pub fn new() -> Self {
        Self::with_timeout(DEADLOCK_TIMEOUT)
    }

    /// Create a lock manager with a custom deadlock timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            table: Mutex::new(LockTable::new()),
            waiters: Mutex::new(HashMap::new()),
            wait_started: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Acquire a lock, blocking while it conflicts with other holders
    ///
    /// Redundant requests return immediately without adding an entry. On
    /// [`LockError::Deadlock`] the caller's other locks are left in place.
    pub fn lock(&self, txn: TransactionId, key: &str, mode: LockMode) -> Result<()> {
        let waiter = {
            let mut table = self.table.lock();
            match table.check(txn, key, mode) {
                LockAttemptResult::Redundant => return Ok(()),
                LockAttemptResult::WouldGrant => {
                    table.grant(txn, key, mode);
                    tracing::trace!("Granted {:?} lock on {} to {}", mode, key, txn);
                    return Ok(());
                }
                LockAttemptResult::Conflict { holders } => {
                    let waiter = Arc::new(Waiter::new(txn, mode));
                    self.waiters
                        .lock()
                        .entry(key.to_string())
                        .or_default()
                        .push_back(waiter.clone());
                    tracing::debug!(
                        "Transaction {} waits for {:?} lock on {} held by {:?}",
                        txn,
                        mode,
                        key,
                        holders
                    );
                    waiter
                }
            }
        };

        let started = *self
            .wait_started
            .lock()
            .entry(txn)
            .or_insert_with(Instant::now);

        let result = self.await_grant(&waiter, key, started + self.timeout);
        self.wait_started.lock().remove(&txn);
        result
    }

    /// Release every lock held by a transaction and cancel its pending wait
    pub fn unlock_all(&self, txn: TransactionId) {
        {
            let mut table = self.table.lock();
            let mut touched = table.release_all(txn);

            let mut waiters = self.waiters.lock();
            for (key, queue) in waiters.iter_mut() {
                let before = queue.len();
                queue.retain(|waiter| {
                    if waiter.txn == txn {
                        waiter.wake(WaitSignal::Cancelled);
                        false
                    } else {
                        true
                    }
                });
                if queue.len() != before {
                    touched.push(key.clone());
                }
            }

            touched.sort();
            touched.dedup();
            for key in &touched {
                Self::grant_waiters(&mut table, &mut waiters, key);
            }

            if !touched.is_empty() {
                tracing::trace!("Transaction {} released {:?}", txn, touched);
            }
        }

        self.wait_started.lock().remove(&txn);
    }

    /// Get all locks held by a transaction
    pub fn locks_held_by(&self, txn: TransactionId) -> Vec<(String, LockMode)> {
        self.table.lock().locks_held_by(txn)
    }

    /// Check if a transaction holds any locks
    pub fn has_locks(&self, txn: TransactionId) -> bool {
        self.table.lock().has_locks(txn)
    }

    /// Get the current holders of a key
    pub fn holders(&self, key: &str) -> Vec<(TransactionId, LockMode)> {
        self.table.lock().holders(key)
    }

    /// Get the requests waiting on a key, oldest first
    pub fn waiting(&self, key: &str) -> Vec<(TransactionId, LockMode)> {
        self.waiters
            .lock()
            .get(key)
            .map(|queue| queue.iter().map(|w| (w.txn, w.mode)).collect())
            .unwrap_or_default()
    }

    fn await_grant(&self, waiter: &Arc<Waiter>, key: &str, deadline: Instant) -> Result<()> {
        {
            let mut signal = waiter.signal.lock();
            while *signal == WaitSignal::Waiting {
                if waiter.ready.wait_until(&mut signal, deadline).timed_out() {
                    break;
                }
            }
            if let Some(result) = Self::outcome(*signal, waiter.txn, key) {
                return result;
            }
        }

        // Timed out. Withdraw under the table locks so a concurrent release
        // cannot grant to a waiter that is about to leave.
        let mut table = self.table.lock();
        let mut waiters = self.waiters.lock();

        let signal = *waiter.signal.lock();
        if let Some(result) = Self::outcome(signal, waiter.txn, key) {
            return result;
        }

        if let Some(queue) = waiters.get_mut(key) {
            queue.retain(|queued| !Arc::ptr_eq(queued, waiter));
        }
        Self::grant_waiters(&mut table, &mut waiters, key);

        tracing::warn!(
            "Transaction {} deadlocked waiting for {:?} lock on {}",
            waiter.txn,
            waiter.mode,
            key
        );
        Err(LockError::Deadlock {
            txn: waiter.txn,
            key: key.to_string(),
        })
    }

    fn outcome(signal: WaitSignal, txn: TransactionId, key: &str) -> Option<Result<()>> {
        match signal {
            WaitSignal::Waiting => None,
            WaitSignal::Granted => Some(Ok(())),
            WaitSignal::Cancelled => {
                tracing::debug!("Wait of transaction {} on {} cancelled", txn, key);
                Some(Err(LockError::Aborted {
                    txn,
                    key: key.to_string(),
                }))
            }
        }
    }

    /// Grant queued requests on `key` front to back until one conflicts
    ///
    /// A write at the head is granted only once no other lock remains; reads
    /// at the head are granted as a run that stops at the first write.
    fn grant_waiters(table: &mut LockTable, waiters: &mut WaitQueues, key: &str) {
        let Some(queue) = waiters.get_mut(key) else {
            return;
        };

        while let Some(front) = queue.front() {
            match table.check(front.txn, key, front.mode) {
                LockAttemptResult::Conflict { .. } => break,
                LockAttemptResult::Redundant => {}
                LockAttemptResult::WouldGrant => table.grant(front.txn, key, front.mode),
            }

            if let Some(granted) = queue.pop_front() {
                tracing::debug!(
                    "Granted queued {:?} lock on {} to {}",
                    granted.mode,
                    key,
                    granted.txn
                );
                granted.wake(WaitSignal::Granted);
            }
        }

        if queue.is_empty() {
            waiters.remove(key);
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
