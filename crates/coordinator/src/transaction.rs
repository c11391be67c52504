//! Transaction records kept by the coordinator

use std::collections::BTreeSet;
use travel_common::{ServiceName, TransactionId};

/// Transaction state in the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Accepting operations
    Active,
    /// Every participant voted yes
    Prepared,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Committed | TransactionState::Aborted)
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub state: TransactionState,
    /// Services touched so far, emptied once the transaction ends
    pub participants: BTreeSet<ServiceName>,
}

impl Transaction {
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            participants: BTreeSet::new(),
        }
    }
}
