//! Lock table
//!
//! Tracks which transaction holds which lock on which key and answers
//! conflict questions. It never blocks; waiting is the manager's job.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use travel_common::TransactionId;

/// Lock modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockMode {
    /// Shared lock for reading
    Read,
    /// Exclusive lock for writing
    Write,
}

impl LockMode {
    /// Check if two lock modes held by different transactions are compatible
    pub fn is_compatible_with(&self, other: LockMode) -> bool {
        matches!((*self, other), (LockMode::Read, LockMode::Read))
    }

    /// Whether holding this mode already satisfies a request for `other`
    pub fn covers(&self, other: LockMode) -> bool {
        *self == LockMode::Write || other == LockMode::Read
    }
}

/// Information about a held lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub holder: TransactionId,
    pub mode: LockMode,
}

/// Result of checking if a lock can be acquired
#[derive(Debug, Clone, PartialEq)]
pub enum LockAttemptResult {
    /// The transaction already holds a lock covering the request
    Redundant,
    /// Lock would be granted if requested
    WouldGrant,
    /// Lock conflicts with locks held by other transactions
    Conflict {
        /// Conflicting holders, oldest transaction first
        holders: Vec<(TransactionId, LockMode)>,
    },
}

/// Lock table keyed by resource key
#[derive(Debug, Default)]
pub struct LockTable {
    /// All currently held locks (key -> lock holders)
    locks: HashMap<String, Vec<LockInfo>>,
}

impl LockTable {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self {
            locks: HashMap::new(),
        }
    }

    /// Check if a lock can be acquired without modifying state
    pub fn check(&self, tx_id: TransactionId, key: &str, mode: LockMode) -> LockAttemptResult {
        let Some(holders) = self.locks.get(key) else {
            return LockAttemptResult::WouldGrant;
        };

        if holders
            .iter()
            .any(|lock| lock.holder == tx_id && lock.mode.covers(mode))
        {
            return LockAttemptResult::Redundant;
        }

        let mut conflicts: Vec<(TransactionId, LockMode)> = holders
            .iter()
            .filter(|lock| lock.holder != tx_id && !lock.mode.is_compatible_with(mode))
            .map(|lock| (lock.holder, lock.mode))
            .collect();

        if conflicts.is_empty() {
            LockAttemptResult::WouldGrant
        } else {
            conflicts.sort_by_key(|(txn, _)| *txn);
            LockAttemptResult::Conflict { holders: conflicts }
        }
    }

    /// Grant a lock that was previously checked
    ///
    /// A write request from a transaction that holds a read lock on the key
    /// upgrades that entry in place, so a transaction never has two entries
    /// for one key.
    pub fn grant(&mut self, tx_id: TransactionId, key: &str, mode: LockMode) {
        let holders = self.locks.entry(key.to_string()).or_default();

        match holders.iter_mut().find(|lock| lock.holder == tx_id) {
            Some(existing) => {
                if !existing.mode.covers(mode) {
                    existing.mode = mode;
                }
            }
            None => holders.push(LockInfo {
                holder: tx_id,
                mode,
            }),
        }
    }

    /// Release all locks held by a transaction, returning the affected keys
    pub fn release_all(&mut self, tx_id: TransactionId) -> Vec<String> {
        let mut released = Vec::new();

        self.locks.retain(|key, holders| {
            let before = holders.len();
            holders.retain(|lock| lock.holder != tx_id);
            if holders.len() != before {
                released.push(key.clone());
            }
            !holders.is_empty()
        });

        released.sort();
        released
    }

    /// Get all locks held by a transaction
    pub fn locks_held_by(&self, tx_id: TransactionId) -> Vec<(String, LockMode)> {
        let mut result: Vec<(String, LockMode)> = self
            .locks
            .iter()
            .flat_map(|(key, holders)| {
                holders
                    .iter()
                    .filter(move |lock| lock.holder == tx_id)
                    .map(move |lock| (key.clone(), lock.mode))
            })
            .collect();

        result.sort_by(|a, b| a.0.cmp(&b.0)); // Sort by key for determinism
        result
    }

    /// Check if a transaction holds any locks
    pub fn has_locks(&self, tx_id: TransactionId) -> bool {
        self.locks
            .values()
            .any(|holders| holders.iter().any(|h| h.holder == tx_id))
    }

    /// Get all holders of a key
    pub fn holders(&self, key: &str) -> Vec<(TransactionId, LockMode)> {
        self.locks
            .get(key)
            .map(|holders| holders.iter().map(|h| (h.holder, h.mode)).collect())
            .unwrap_or_default()
    }
}
