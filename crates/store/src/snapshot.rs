//! Copy-on-first-touch snapshot storage
//!
//! The store does not enforce isolation. Callers hold a lock from the lock
//! manager covering the whole table before any access; the mutexes here only
//! keep the maps themselves consistent.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use travel_common::TransactionId;

/// A table of values with per-transaction rollback
#[derive(Debug)]
pub struct TransactionalStore<K, V> {
    /// Table name, used for logging
    name: String,

    /// Live state, visible to every transaction
    live: Mutex<BTreeMap<K, V>>,

    /// Deep copies of the live state taken at each transaction's first touch
    snapshots: Mutex<HashMap<TransactionId, BTreeMap<K, V>>>,
}

impl<K, V> TransactionalStore<K, V>
where
    K: Ord + Clone + Debug,
    V: Clone,
{
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            live: Mutex::new(BTreeMap::new()),
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read a value
    pub fn get(&self, txn: TransactionId, key: &K) -> Option<V> {
        self.touch(txn);
        self.live.lock().get(key).cloned()
    }

    /// Check whether a key is present
    pub fn contains(&self, txn: TransactionId, key: &K) -> bool {
        self.touch(txn);
        self.live.lock().contains_key(key)
    }

    /// Insert or replace a value, returning the previous one
    pub fn put(&self, txn: TransactionId, key: K, value: V) -> Option<V> {
        self.touch(txn);
        self.live.lock().insert(key, value)
    }

    /// Remove a value, returning it
    pub fn remove(&self, txn: TransactionId, key: &K) -> Option<V> {
        self.touch(txn);
        self.live.lock().remove(key)
    }

    /// Mutate a value in place, returning the closure's result if the key exists
    pub fn update<R>(&self, txn: TransactionId, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.touch(txn);
        self.live.lock().get_mut(key).map(f)
    }

    /// All entries in key order
    pub fn entries(&self, txn: TransactionId) -> Vec<(K, V)> {
        self.touch(txn);
        self.live
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Whether the transaction has an open snapshot of this table
    pub fn prepare(&self, txn: TransactionId) -> bool {
        self.snapshots.lock().contains_key(&txn)
    }

    /// Keep the live state and drop the transaction's snapshot
    ///
    /// Returns whether a snapshot existed.
    pub fn commit(&self, txn: TransactionId) -> bool {
        let existed = self.snapshots.lock().remove(&txn).is_some();
        tracing::trace!("Committed {} on {} (snapshot: {})", txn, self.name, existed);
        existed
    }

    /// Replace the live state with the transaction's snapshot
    ///
    /// Returns whether a snapshot existed. Without one the live state is left
    /// alone.
    pub fn abort(&self, txn: TransactionId) -> bool {
        let mut snapshots = self.snapshots.lock();
        match snapshots.remove(&txn) {
            Some(snapshot) => {
                *self.live.lock() = snapshot;
                tracing::debug!("Restored {} from snapshot of {}", self.name, txn);
                true
            }
            None => false,
        }
    }

    /// Number of transactions with an open snapshot
    pub fn open_snapshots(&self) -> usize {
        self.snapshots.lock().len()
    }

    fn touch(&self, txn: TransactionId) {
        let mut snapshots = self.snapshots.lock();
        if !snapshots.contains_key(&txn) {
            let copy = self.live.lock().clone();
            tracing::trace!(
                "Snapshot of {} ({} entries) for {}",
                self.name,
                copy.len(),
                txn
            );
            snapshots.insert(txn, copy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(n: u64) -> TransactionId {
        TransactionId::new(n)
    }

    fn seeded() -> TransactionalStore<String, u32> {
        let store = TransactionalStore::new("test");
        store.put(txn(1), "a".to_string(), 10);
        store.put(txn(1), "b".to_string(), 20);
        assert!(store.commit(txn(1)));
        store
    }

    #[test]
    fn test_first_touch_creates_snapshot() {
        let store = seeded();
        assert!(!store.prepare(txn(2)));

        assert_eq!(store.get(txn(2), &"a".to_string()), Some(10));
        assert!(store.prepare(txn(2)));
        assert_eq!(store.open_snapshots(), 1);

        // Further access reuses the snapshot
        store.put(txn(2), "a".to_string(), 11);
        assert_eq!(store.open_snapshots(), 1);
    }

    #[test]
    fn test_commit_keeps_live_state() {
        let store = seeded();

        store.put(txn(2), "a".to_string(), 1);
        store.remove(txn(2), &"b".to_string());
        assert!(store.commit(txn(2)));

        assert_eq!(
            store.entries(txn(3)),
            vec![("a".to_string(), 1)]
        );
        assert!(!store.prepare(txn(2)));
    }

    #[test]
    fn test_abort_restores_snapshot() {
        let store = seeded();

        store.put(txn(2), "c".to_string(), 30);
        store.update(txn(2), &"a".to_string(), |v| *v -= 3);
        store.remove(txn(2), &"b".to_string());
        assert!(store.abort(txn(2)));

        assert_eq!(
            store.entries(txn(3)),
            vec![("a".to_string(), 10), ("b".to_string(), 20)]
        );
        assert_eq!(store.open_snapshots(), 1); // only txn 3
    }

    #[test]
    fn test_unknown_transaction_has_nothing_to_finish() {
        let store = seeded();

        assert!(!store.commit(txn(9)));
        assert!(!store.abort(txn(9)));
        assert_eq!(store.get(txn(10), &"a".to_string()), Some(10));
    }

    #[test]
    fn test_update_missing_key() {
        let store: TransactionalStore<String, u32> = TransactionalStore::new("test");
        assert_eq!(store.update(txn(1), &"nope".to_string(), |v| *v), None);
        assert!(!store.contains(txn(1), &"nope".to_string()));
    }
}
