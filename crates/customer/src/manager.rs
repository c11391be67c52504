//! Customer ledger operations

use crate::types::{Customer, CustomerId, CustomerOperation, CustomerResponse, ReservedItem};
use rand::Rng;
use std::sync::Arc;
use travel_common::{Result, ServiceName, TransactionId};
use travel_crash::{CrashInjector, CrashSite};
use travel_lock::LockManager;
use travel_resource::{ItemKind, TableAccess, TransactionalTable};

/// Random ids tried before falling back to a linear search
const ID_ATTEMPTS: usize = 100;

pub struct CustomerManager {
    table: TransactionalTable<Customer>,
}

impl Default for CustomerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerManager {
    pub fn new() -> Self {
        Self::with_parts(
            LockManager::new(),
            Arc::new(CrashInjector::new(CrashSite::Service(ServiceName::Customers))),
        )
    }

    pub fn with_parts(locks: LockManager, crash: Arc<CrashInjector>) -> Self {
        Self {
            table: TransactionalTable::with_parts(ServiceName::Customers, locks, crash),
        }
    }

    pub fn table(&self) -> &TransactionalTable<Customer> {
        &self.table
    }

    /// Create a customer with a generated id
    ///
    /// The id is the transaction id followed by three digits of the
    /// sub-second clock and three digits of a random suffix in 1..=100.
    /// If every attempt collides, the first free id below the last
    /// candidate is taken.
    pub fn new_customer(&self, txn: TransactionId) -> Result<CustomerId> {
        let store = self.table.write(txn)?;

        let mut rng = rand::thread_rng();
        let mut id = 0;
        for _ in 0..ID_ATTEMPTS {
            let millis = u64::from(chrono::Utc::now().timestamp_subsec_millis() % 1000);
            let suffix: u64 = rng.gen_range(1..=100);
            id = txn
                .as_u64()
                .saturating_mul(1_000_000)
                .saturating_add(millis * 1000 + suffix);

            if !store.contains(txn, &customer_key(id)) {
                store.put(txn, customer_key(id), Customer::new(id));
                tracing::debug!("Transaction {} created customer {}", txn, id);
                return Ok(id);
            }
        }

        while store.contains(txn, &customer_key(id)) {
            id = id.wrapping_sub(1);
        }
        store.put(txn, customer_key(id), Customer::new(id));
        tracing::debug!("Transaction {} created customer {} after collisions", txn, id);
        Ok(id)
    }

    /// Create a customer with a chosen id; false if it already exists
    pub fn new_customer_with_id(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        let store = self.table.write(txn)?;
        let key = customer_key(customer);

        if store.contains(txn, &key) {
            return Ok(false);
        }
        store.put(txn, key, Customer::new(customer));
        Ok(true)
    }

    /// Remove a customer record
    ///
    /// Reservations are not released here; the coordinator gives them back to
    /// the resource managers first.
    pub fn delete_customer(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        let store = self.table.write(txn)?;
        Ok(store.remove(txn, &customer_key(customer)).is_some())
    }

    /// Record one unit of an item for a customer
    pub fn reserve(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: &str,
        price: u32,
    ) -> Result<bool> {
        let store = self.table.write(txn)?;
        let done = store
            .update(txn, &customer_key(customer), |c| c.reserve(kind, id, price))
            .is_some();
        Ok(done)
    }

    /// Drop one unit of an item from a customer's ledger
    pub fn cancel_reservation(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: &str,
    ) -> Result<bool> {
        let store = self.table.write(txn)?;
        let done = store
            .update(txn, &customer_key(customer), |c| c.cancel(kind, id))
            .unwrap_or(false);
        Ok(done)
    }

    /// The customer's bill, empty for an unknown customer
    pub fn query_customer_info(&self, txn: TransactionId, customer: CustomerId) -> Result<String> {
        let store = self.table.read(txn)?;
        Ok(store
            .get(txn, &customer_key(customer))
            .map(|c| c.bill())
            .unwrap_or_default())
    }

    /// Every ledger entry of a customer, `None` if the customer does not exist
    pub fn reservations(
        &self,
        txn: TransactionId,
        customer: CustomerId,
    ) -> Result<Option<Vec<ReservedItem>>> {
        let store = self.table.read(txn)?;
        Ok(ledger(&store, txn, customer))
    }

    /// Like [`reservations`](Self::reservations), under a write lock
    ///
    /// For callers that go on to change the ledger in the same transaction.
    pub fn reservations_for_update(
        &self,
        txn: TransactionId,
        customer: CustomerId,
    ) -> Result<Option<Vec<ReservedItem>>> {
        let store = self.table.write(txn)?;
        Ok(ledger(&store, txn, customer))
    }

    pub fn execute(
        &self,
        txn: TransactionId,
        operation: &CustomerOperation,
    ) -> Result<CustomerResponse> {
        let response = match operation {
            CustomerOperation::NewCustomer => CustomerResponse::Created {
                customer: self.new_customer(txn)?,
            },
            CustomerOperation::NewCustomerWithId { customer } => CustomerResponse::Done {
                customer: *customer,
                done: self.new_customer_with_id(txn, *customer)?,
            },
            CustomerOperation::DeleteCustomer { customer } => CustomerResponse::Done {
                customer: *customer,
                done: self.delete_customer(txn, *customer)?,
            },
            CustomerOperation::Reserve {
                customer,
                kind,
                id,
                price,
            } => CustomerResponse::Done {
                customer: *customer,
                done: self.reserve(txn, *customer, *kind, id, *price)?,
            },
            CustomerOperation::CancelReservation { customer, kind, id } => CustomerResponse::Done {
                customer: *customer,
                done: self.cancel_reservation(txn, *customer, *kind, id)?,
            },
            CustomerOperation::QueryInfo { customer } => CustomerResponse::Info {
                customer: *customer,
                bill: self.query_customer_info(txn, *customer)?,
            },
            CustomerOperation::Reservations { customer } => CustomerResponse::Reservations {
                customer: *customer,
                items: self.reservations(txn, *customer)?,
            },
            CustomerOperation::ReservationsForUpdate { customer } => {
                CustomerResponse::Reservations {
                    customer: *customer,
                    items: self.reservations_for_update(txn, *customer)?,
                }
            }
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
}

fn customer_key(customer: CustomerId) -> String {
    customer.to_string()
}

fn ledger(
    store: &TableAccess<'_, Customer>,
    txn: TransactionId,
    customer: CustomerId,
) -> Option<Vec<ReservedItem>> {
    store
        .get(txn, &customer_key(customer))
        .map(|c| c.reservations.into_values().collect())
}
