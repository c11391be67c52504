//! Two-phase commit participant state shared by every service
//!
//! A [`TransactionalTable`] couples one lock manager, one snapshot store and
//! one crash injector. The whole table is locked under the service name: an
//! abort restores the table wholesale, so writers must be serialized per
//! table.

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Deref;
use std::sync::Arc;
use travel_common::{Error, Result, ServiceName, TransactionId};
use travel_crash::{CrashInjector, CrashPhase, CrashSite, CrashTiming};
use travel_lock::{LockManager, LockMode};
use travel_store::TransactionalStore;

/// How many finished transactions a table remembers
///
/// Late calls of a transaction finished this recently are still rejected.
pub const RETIRED_CAPACITY: usize = 4096;

/// A transaction as seen by one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    Active,
    Committed,
    Aborted,
}

/// Live transactions plus a bounded record of finished ones
#[derive(Debug, Default)]
struct TransactionLog {
    live: HashSet<TransactionId>,
    retired: HashMap<TransactionId, ParticipantStatus>,
    order: VecDeque<TransactionId>,
}

impl TransactionLog {
    fn status(&self, txn: TransactionId) -> Option<ParticipantStatus> {
        if self.live.contains(&txn) {
            Some(ParticipantStatus::Active)
        } else {
            self.retired.get(&txn).copied()
        }
    }

    fn retire(&mut self, txn: TransactionId, status: ParticipantStatus) {
        self.live.remove(&txn);
        if self.retired.insert(txn, status).is_none() {
            self.order.push_back(txn);
        }
        while self.order.len() > RETIRED_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.retired.remove(&oldest);
            }
        }
    }
}

/// The store of a table, held for one call of a live transaction
///
/// Commit and abort wait until every outstanding access is dropped.
pub struct TableAccess<'a, V> {
    store: &'a TransactionalStore<String, V>,
    _in_flight: RwLockReadGuard<'a, ()>,
}

impl<V> Deref for TableAccess<'_, V> {
    type Target = TransactionalStore<String, V>;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

/// Lock-gated transactional table of one service
pub struct TransactionalTable<V> {
    service: ServiceName,
    locks: LockManager,
    store: TransactionalStore<String, V>,
    crash: Arc<CrashInjector>,
    transactions: Mutex<TransactionLog>,
    in_flight: RwLock<()>,
}

impl<V: Clone> TransactionalTable<V> {
    /// Table with the standard deadlock timeout and a process-exiting crash injector
    pub fn new(service: ServiceName) -> Self {
        Self::with_parts(
            service,
            LockManager::new(),
            Arc::new(CrashInjector::new(CrashSite::Service(service))),
        )
    }

    pub fn with_parts(
        service: ServiceName,
        locks: LockManager,
        crash: Arc<CrashInjector>,
    ) -> Self {
        Self {
            service,
            locks,
            store: TransactionalStore::new(service.as_str()),
            crash,
            transactions: Mutex::new(TransactionLog::default()),
            in_flight: RwLock::new(()),
        }
    }

    pub fn service(&self) -> ServiceName {
        self.service
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.locks
    }

    pub fn crash_injector(&self) -> &Arc<CrashInjector> {
        &self.crash
    }

    /// Status of a transaction here, `None` if it never reached this service
    /// or finished too long ago to be remembered
    pub fn status(&self, txn: TransactionId) -> Option<ParticipantStatus> {
        self.transactions.lock().status(txn)
    }

    /// Number of transactions that have joined and not yet finished
    pub fn live_transactions(&self) -> usize {
        self.transactions.lock().live.len()
    }

    /// The store, after taking a read lock on the table
    pub fn read(&self, txn: TransactionId) -> Result<TableAccess<'_, V>> {
        self.access(txn, LockMode::Read)
    }

    /// The store, after taking a write lock on the table
    pub fn write(&self, txn: TransactionId) -> Result<TableAccess<'_, V>> {
        self.access(txn, LockMode::Write)
    }

    fn access(&self, txn: TransactionId, mode: LockMode) -> Result<TableAccess<'_, V>> {
        self.begin(txn)?;
        self.locks.lock(txn, self.service.as_str(), mode)?;

        // Taken after the lock wait: abort cancels waiters before it can
        // take the write side
        let in_flight = self.in_flight.read();
        if self.status(txn) != Some(ParticipantStatus::Active) {
            drop(in_flight);
            self.locks.unlock_all(txn);
            return Err(Error::Aborted(txn));
        }
        Ok(TableAccess {
            store: &self.store,
            _in_flight: in_flight,
        })
    }

    fn begin(&self, txn: TransactionId) -> Result<()> {
        let mut transactions = self.transactions.lock();
        match transactions.status(txn) {
            None => {
                tracing::debug!("{} joined transaction {}", self.service, txn);
                transactions.live.insert(txn);
                Ok(())
            }
            Some(ParticipantStatus::Active) => Ok(()),
            Some(_) => Err(Error::InvalidTransaction(txn)),
        }
    }

    /// Vote on a transaction
    ///
    /// A transaction that never touched this service votes yes; one that was
    /// already finished here votes no.
    pub fn prepare(&self, txn: TransactionId) -> bool {
        self.crash.checkpoint(CrashTiming::Before, CrashPhase::Vote);

        let vote = match self.status(txn) {
            None => true,
            Some(ParticipantStatus::Active) => {
                tracing::trace!(
                    "{} votes on {} (snapshot: {})",
                    self.service,
                    txn,
                    self.store.prepare(txn)
                );
                true
            }
            Some(_) => false,
        };
        tracing::debug!("{} votes {} on {}", self.service, if vote { "yes" } else { "no" }, txn);

        self.crash.checkpoint(CrashTiming::After, CrashPhase::Vote);
        vote
    }

    /// Keep the transaction's changes and release its locks
    pub fn commit(&self, txn: TransactionId) -> bool {
        self.crash.checkpoint(CrashTiming::Before, CrashPhase::Save);

        {
            let mut transactions = self.transactions.lock();
            if transactions.status(txn) == Some(ParticipantStatus::Aborted) {
                tracing::warn!("{} cannot commit aborted transaction {}", self.service, txn);
                return false;
            }
            transactions.retire(txn, ParticipantStatus::Committed);
        }
        {
            let _exclusive = self.in_flight.write();
            self.store.commit(txn);
        }
        self.locks.unlock_all(txn);
        tracing::debug!("{} committed {}", self.service, txn);

        self.crash.checkpoint(CrashTiming::After, CrashPhase::Save);
        true
    }

    /// Roll the table back to the transaction's snapshot and release its locks
    ///
    /// The status flips first so a call still waiting for the lock fails
    /// instead of touching the restored table. A call already past its
    /// status check finishes before the snapshot is restored.
    pub fn abort(&self, txn: TransactionId) -> bool {
        {
            let mut transactions = self.transactions.lock();
            if transactions.status(txn) == Some(ParticipantStatus::Committed) {
                tracing::warn!("{} cannot abort committed transaction {}", self.service, txn);
                return false;
            }
            transactions.retire(txn, ParticipantStatus::Aborted);
        }
        let restored = {
            let _exclusive = self.in_flight.write();
            self.store.abort(txn)
        };
        self.locks.unlock_all(txn);
        tracing::debug!("{} aborted {} (restored: {})", self.service, txn, restored);
        true
    }
}
