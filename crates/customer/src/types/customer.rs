//! Customer records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use travel_resource::ItemKind;

pub type CustomerId = u64;

/// Units of one item held by a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedItem {
    pub kind: ItemKind,
    /// Flight number or location, as passed to the resource manager
    pub id: String,
    /// Storage key on the resource manager
    pub key: String,
    pub amount: u32,
    /// Price at the time of the last reservation
    pub price: u32,
}

/// A customer and their reservation ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// Entries keyed `<service>/<item key>`; never holds a zero amount
    pub reservations: BTreeMap<String, ReservedItem>,
}

impl Customer {
    pub fn new(id: CustomerId) -> Self {
        Self {
            id,
            reservations: BTreeMap::new(),
        }
    }

    pub fn ledger_key(kind: ItemKind, key: &str) -> String {
        format!("{}/{}", kind.service(), key)
    }

    /// Add one unit of an item
    pub fn reserve(&mut self, kind: ItemKind, id: &str, price: u32) {
        let key = kind.item_key(id);
        let entry = self
            .reservations
            .entry(Self::ledger_key(kind, &key))
            .or_insert_with(|| ReservedItem {
                kind,
                id: id.to_string(),
                key,
                amount: 0,
                price,
            });
        entry.amount += 1;
        entry.price = price;
    }

    /// Give back one unit of an item; false if the customer holds none
    pub fn cancel(&mut self, kind: ItemKind, id: &str) -> bool {
        let ledger_key = Self::ledger_key(kind, &kind.item_key(id));
        let Some(entry) = self.reservations.get_mut(&ledger_key) else {
            return false;
        };

        entry.amount = entry.amount.saturating_sub(1);
        if entry.amount == 0 {
            self.reservations.remove(&ledger_key);
        }
        true
    }

    /// Printable bill listing every reservation
    pub fn bill(&self) -> String {
        let mut bill = format!("Bill for customer {}\n", self.id);
        for item in self.reservations.values() {
            let _ = writeln!(bill, "{} {} ${}", item.amount, item.key, item.price);
        }
        bill
    }
}
