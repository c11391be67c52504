//! Inventory operations of one resource manager

use crate::participant::TransactionalTable;
use crate::types::{ItemKind, ReservableItem, ResourceOperation, ResourceResponse};
use std::sync::Arc;
use travel_common::{Result, TransactionId};
use travel_crash::{CrashInjector, CrashSite};
use travel_lock::LockManager;

/// Flight, car or room inventory
pub struct ResourceManager {
    kind: ItemKind,
    table: TransactionalTable<ReservableItem>,
}

impl ResourceManager {
    pub fn new(kind: ItemKind) -> Self {
        Self::with_parts(
            kind,
            LockManager::new(),
            Arc::new(CrashInjector::new(CrashSite::Service(kind.service()))),
        )
    }

    pub fn with_parts(kind: ItemKind, locks: LockManager, crash: Arc<CrashInjector>) -> Self {
        Self {
            kind,
            table: TransactionalTable::with_parts(kind.service(), locks, crash),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// The participant state behind this manager
    pub fn table(&self) -> &TransactionalTable<ReservableItem> {
        &self.table
    }

    /// Add `count` units at `price`, creating the item if absent
    ///
    /// An existing item keeps its price unless `price` is non-zero.
    pub fn add(&self, txn: TransactionId, id: &str, count: u32, price: u32) -> Result<bool> {
        let store = self.table.write(txn)?;
        let key = self.kind.item_key(id);

        let existed = store
            .update(txn, &key, |item| {
                item.count = item.count.saturating_add(count);
                if price > 0 {
                    item.price = price;
                }
            })
            .is_some();

        if !existed {
            store.put(txn, key.clone(), ReservableItem::new(key.clone(), count, price));
        }
        tracing::debug!("Transaction {} added {} units of {}", txn, count, key);
        Ok(true)
    }

    /// Delete an item; fails while units are still available
    pub fn delete(&self, txn: TransactionId, id: &str) -> Result<bool> {
        let store = self.table.write(txn)?;
        let key = self.kind.item_key(id);

        match store.get(txn, &key) {
            None => Ok(false),
            Some(item) if item.count > 0 => {
                tracing::debug!("Refusing to delete {} with {} units left", key, item.count);
                Ok(false)
            }
            Some(_) => {
                store.remove(txn, &key);
                Ok(true)
            }
        }
    }

    /// Units available, 0 for an unknown item
    pub fn query(&self, txn: TransactionId, id: &str) -> Result<u32> {
        Ok(self.get(txn, id)?.map(|item| item.count).unwrap_or(0))
    }

    /// Price, 0 for an unknown item
    pub fn query_price(&self, txn: TransactionId, id: &str) -> Result<u32> {
        Ok(self.get(txn, id)?.map(|item| item.price).unwrap_or(0))
    }

    /// Units handed out, 0 for an unknown item
    pub fn query_reserved(&self, txn: TransactionId, id: &str) -> Result<u32> {
        Ok(self.get(txn, id)?.map(|item| item.reserved).unwrap_or(0))
    }

    /// Hand out one unit
    pub fn reserve(&self, txn: TransactionId, id: &str) -> Result<bool> {
        let store = self.table.write(txn)?;
        let key = self.kind.item_key(id);

        let reserved = store
            .update(txn, &key, |item| {
                if item.count == 0 {
                    return false;
                }
                item.count -= 1;
                item.reserved += 1;
                true
            })
            .unwrap_or(false);

        tracing::debug!("Transaction {} reserve {}: {}", txn, key, reserved);
        Ok(reserved)
    }

    /// Put `amount` units back into inventory
    pub fn release(&self, txn: TransactionId, id: &str, amount: u32) -> Result<bool> {
        let store = self.table.write(txn)?;
        let key = self.kind.item_key(id);

        let released = store
            .update(txn, &key, |item| {
                item.count = item.count.saturating_add(amount);
                item.reserved = item.reserved.saturating_sub(amount);
            })
            .is_some();

        tracing::debug!("Transaction {} released {} of {}: {}", txn, amount, key, released);
        Ok(released)
    }

    /// Run an operation received over the wire
    pub fn execute(
        &self,
        txn: TransactionId,
        operation: &ResourceOperation,
    ) -> Result<ResourceResponse> {
        let response = match operation {
            ResourceOperation::Add { id, count, price } => {
                self.add(txn, id, *count, *price)?;
                ResourceResponse::Added { id: id.clone() }
            }
            ResourceOperation::Delete { id } => ResourceResponse::Deleted {
                id: id.clone(),
                deleted: self.delete(txn, id)?,
            },
            ResourceOperation::Query { id } => ResourceResponse::Count {
                id: id.clone(),
                count: self.query(txn, id)?,
            },
            ResourceOperation::QueryPrice { id } => ResourceResponse::Price {
                id: id.clone(),
                price: self.query_price(txn, id)?,
            },
            ResourceOperation::QueryReserved { id } => ResourceResponse::ReservedCount {
                id: id.clone(),
                reserved: self.query_reserved(txn, id)?,
            },
            ResourceOperation::Reserve { id } => ResourceResponse::Reserved {
                id: id.clone(),
                reserved: self.reserve(txn, id)?,
            },
            ResourceOperation::Release { id, amount } => ResourceResponse::Released {
                id: id.clone(),
                released: self.release(txn, id, *amount)?,
            },
        };
        Ok(response)
    }

    pub fn prepare(&self, txn: TransactionId) -> bool {
        self.table.prepare(txn)
    }

    pub fn commit(&self, txn: TransactionId) -> bool {
        self.table.commit(txn)
    }

    pub fn abort(&self, txn: TransactionId) -> bool {
        self.table.abort(txn)
    }

    fn get(&self, txn: TransactionId, id: &str) -> Result<Option<ReservableItem>> {
        let store = self.table.read(txn)?;
        Ok(store.get(txn, &self.kind.item_key(id)))
    }
}
