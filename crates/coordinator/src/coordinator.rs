//! Two-phase commit coordinator
//!
//! Every domain call enlists the services it is about to touch before the
//! call goes out, so a failure half way still leaves the coordinator knowing
//! whom to abort. Deadlocks and unreachable services abort the whole
//! transaction before the error is handed back. Nothing is retried.

use crate::config::CoordinatorConfig;
use crate::transaction::{Transaction, TransactionState};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use travel_client::{CustomerClient, ParticipantClient, ResourceClient};
use travel_common::{Error, Result, ServiceName, TransactionId};
use travel_crash::{CrashInjector, CrashPhase, CrashPoint, CrashSite, CrashTiming};
use travel_customer::CustomerId;
use travel_resource::ItemKind;

/// Clients for the four participant services
#[derive(Clone)]
pub struct Participants {
    pub flights: ResourceClient,
    pub cars: ResourceClient,
    pub rooms: ResourceClient,
    pub customers: CustomerClient,
}

impl Participants {
    pub fn resource(&self, kind: ItemKind) -> &ResourceClient {
        match kind {
            ItemKind::Flight => &self.flights,
            ItemKind::Car => &self.cars,
            ItemKind::Room => &self.rooms,
        }
    }

    pub fn participant(&self, service: ServiceName) -> &ParticipantClient {
        match service {
            ServiceName::Flights => self.flights.participant(),
            ServiceName::Cars => self.cars.participant(),
            ServiceName::Rooms => self.rooms.participant(),
            ServiceName::Customers => self.customers.participant(),
        }
    }
}

/// The middleware
pub struct TransactionCoordinator {
    config: CoordinatorConfig,
    participants: Participants,
    crash: Arc<CrashInjector>,
    next_id: AtomicU64,
    transactions: Mutex<HashMap<TransactionId, Transaction>>,
}

impl TransactionCoordinator {
    pub fn new(
        participants: Participants,
        crash: Arc<CrashInjector>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            config,
            participants,
            crash,
            next_id: AtomicU64::new(TransactionId::FIRST.as_u64()),
            transactions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn crash_injector(&self) -> &Arc<CrashInjector> {
        &self.crash
    }

    // ========================================================================
    // Transaction lifecycle
    // ========================================================================

    /// Begin a new transaction
    pub fn start(&self) -> TransactionId {
        let txn = TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.transactions.lock().insert(txn, Transaction::new(txn));
        tracing::debug!("Started transaction {}", txn);
        txn
    }

    /// State of a live transaction, `None` once it has finished or if it never existed
    pub fn state(&self, txn: TransactionId) -> Option<TransactionState> {
        self.transactions.lock().get(&txn).map(|t| t.state)
    }

    /// Whether a transaction was started here and has since committed or aborted
    pub fn is_finished(&self, txn: TransactionId) -> bool {
        txn.as_u64() < self.next_id.load(Ordering::SeqCst)
            && !self.transactions.lock().contains_key(&txn)
    }

    /// Number of transactions started and not yet finished
    pub fn live_transactions(&self) -> usize {
        self.transactions.lock().len()
    }

    /// Services enlisted so far
    pub fn participants(&self, txn: TransactionId) -> Vec<ServiceName> {
        self.transactions
            .lock()
            .get(&txn)
            .map(|t| t.participants.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ask every participant to vote
    ///
    /// Succeeds only if all of them vote yes; an unreachable participant
    /// counts as a no.
    pub fn prepare(&self, txn: TransactionId) -> Result<bool> {
        let participants = {
            let transactions = self.transactions.lock();
            match transactions.get(&txn) {
                Some(t) if t.state == TransactionState::Active => t.participants.clone(),
                _ => return Err(Error::InvalidTransaction(txn)),
            }
        };

        self.crash.checkpoint(CrashTiming::Before, CrashPhase::Prepare);
        let mut all_yes = true;
        for (i, service) in participants.iter().enumerate() {
            let vote = match self.participants.participant(*service).prepare(txn) {
                Ok(vote) => vote,
                Err(e) => {
                    tracing::warn!("No vote from {} on {}: {}", service, txn, e);
                    false
                }
            };
            tracing::debug!("{} voted {} on {}", service, vote, txn);
            all_yes &= vote;

            if i == 0 {
                self.crash.checkpoint(CrashTiming::In, CrashPhase::Prepare);
            }
        }
        self.crash.checkpoint(CrashTiming::After, CrashPhase::Prepare);

        if all_yes {
            let mut transactions = self.transactions.lock();
            if let Some(t) = transactions.get_mut(&txn) {
                if t.state == TransactionState::Active {
                    t.state = TransactionState::Prepared;
                }
            }
        }
        tracing::info!("Transaction {} prepared: {}", txn, all_yes);
        Ok(all_yes)
    }

    /// Commit a transaction, preparing it first if still active
    ///
    /// A no vote aborts the transaction and returns false.
    pub fn commit(&self, txn: TransactionId) -> Result<bool> {
        match self.state(txn) {
            Some(TransactionState::Active) => {
                if !self.prepare(txn)? {
                    self.abort(txn)?;
                    return Ok(false);
                }
            }
            Some(TransactionState::Prepared) => {}
            _ => return Err(Error::InvalidTransaction(txn)),
        }

        let participants = self.finish(txn, TransactionState::Committed)?;
        Ok(self.decide(txn, &participants, true))
    }

    /// Abort a transaction on every participant
    pub fn abort(&self, txn: TransactionId) -> Result<bool> {
        let participants = self.finish(txn, TransactionState::Aborted)?;
        Ok(self.decide(txn, &participants, false))
    }

    /// Drop a live transaction on its way to `state` and take its participants
    ///
    /// Finished transactions are not kept; ids below the counter that are no
    /// longer live are finished.
    fn finish(
        &self,
        txn: TransactionId,
        state: TransactionState,
    ) -> Result<BTreeSet<ServiceName>> {
        let mut transactions = self.transactions.lock();
        let ready = match transactions.get(&txn) {
            Some(t) if state == TransactionState::Committed => {
                t.state == TransactionState::Prepared
            }
            Some(t) => !t.state.is_terminal(),
            None => false,
        };
        if !ready {
            return Err(Error::InvalidTransaction(txn));
        }

        match transactions.remove(&txn) {
            Some(mut t) => {
                t.state = state;
                tracing::trace!("Transaction {} is now {:?}", txn, t.state);
                Ok(t.participants)
            }
            None => Err(Error::InvalidTransaction(txn)),
        }
    }

    /// Send the commit or abort decision to every participant
    fn decide(
        &self,
        txn: TransactionId,
        participants: &BTreeSet<ServiceName>,
        commit: bool,
    ) -> bool {
        self.crash.checkpoint(CrashTiming::Before, CrashPhase::Decision);

        let mut all_done = true;
        for (i, service) in participants.iter().enumerate() {
            let participant = self.participants.participant(*service);
            let outcome = if commit {
                participant.commit(txn)
            } else {
                participant.abort(txn)
            };
            match outcome {
                Ok(done) => all_done &= done,
                Err(e) => {
                    tracing::warn!("{} did not apply decision on {}: {}", service, txn, e);
                    all_done = false;
                }
            }

            if i == 0 {
                self.crash.checkpoint(CrashTiming::In, CrashPhase::Decision);
            }
        }
        self.crash.checkpoint(CrashTiming::After, CrashPhase::Decision);

        tracing::info!(
            "Transaction {} {} on {:?}: {}",
            txn,
            if commit { "committed" } else { "aborted" },
            participants,
            all_done
        );
        all_done
    }

    fn enlist(&self, txn: TransactionId, service: ServiceName) -> Result<()> {
        let mut transactions = self.transactions.lock();
        match transactions.get_mut(&txn) {
            Some(t) if t.state == TransactionState::Active => {
                if t.participants.insert(service) {
                    tracing::trace!("Enlisted {} in {}", service, txn);
                }
                Ok(())
            }
            _ => Err(Error::InvalidTransaction(txn)),
        }
    }

    /// Run a domain call on behalf of a transaction
    ///
    /// Deadlocks and unreachable services abort the transaction before the
    /// error is returned.
    fn run<T>(
        &self,
        txn: TransactionId,
        services: &[ServiceName],
        call: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        for service in services {
            self.enlist(txn, *service)?;
        }

        match call() {
            Err(e @ (Error::Deadlock { .. } | Error::Unavailable(_))) => {
                tracing::warn!("Aborting {} after {}", txn, e);
                if let Err(abort_err) = self.abort(txn) {
                    tracing::debug!("Abort of {} after failure: {}", txn, abort_err);
                }
                Err(e)
            }
            other => other,
        }
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    pub fn add_item(
        &self,
        txn: TransactionId,
        kind: ItemKind,
        id: &str,
        count: u32,
        price: u32,
    ) -> Result<bool> {
        self.run(txn, &[kind.service()], || {
            self.participants.resource(kind).add(txn, id, count, price)
        })
    }

    pub fn add_flight(
        &self,
        txn: TransactionId,
        flight: u32,
        seats: u32,
        price: u32,
    ) -> Result<bool> {
        self.add_item(txn, ItemKind::Flight, &flight.to_string(), seats, price)
    }

    pub fn add_cars(
        &self,
        txn: TransactionId,
        location: &str,
        count: u32,
        price: u32,
    ) -> Result<bool> {
        self.add_item(txn, ItemKind::Car, location, count, price)
    }

    pub fn add_rooms(
        &self,
        txn: TransactionId,
        location: &str,
        count: u32,
        price: u32,
    ) -> Result<bool> {
        self.add_item(txn, ItemKind::Room, location, count, price)
    }

    pub fn delete_item(&self, txn: TransactionId, kind: ItemKind, id: &str) -> Result<bool> {
        self.run(txn, &[kind.service()], || {
            self.participants.resource(kind).delete(txn, id)
        })
    }

    pub fn delete_flight(&self, txn: TransactionId, flight: u32) -> Result<bool> {
        self.delete_item(txn, ItemKind::Flight, &flight.to_string())
    }

    pub fn delete_cars(&self, txn: TransactionId, location: &str) -> Result<bool> {
        self.delete_item(txn, ItemKind::Car, location)
    }

    pub fn delete_rooms(&self, txn: TransactionId, location: &str) -> Result<bool> {
        self.delete_item(txn, ItemKind::Room, location)
    }

    pub fn query_item(&self, txn: TransactionId, kind: ItemKind, id: &str) -> Result<u32> {
        self.run(txn, &[kind.service()], || {
            self.participants.resource(kind).query(txn, id)
        })
    }

    pub fn query_flight(&self, txn: TransactionId, flight: u32) -> Result<u32> {
        self.query_item(txn, ItemKind::Flight, &flight.to_string())
    }

    pub fn query_cars(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_item(txn, ItemKind::Car, location)
    }

    pub fn query_rooms(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_item(txn, ItemKind::Room, location)
    }

    pub fn query_price(&self, txn: TransactionId, kind: ItemKind, id: &str) -> Result<u32> {
        self.run(txn, &[kind.service()], || {
            self.participants.resource(kind).query_price(txn, id)
        })
    }

    pub fn query_flight_price(&self, txn: TransactionId, flight: u32) -> Result<u32> {
        self.query_price(txn, ItemKind::Flight, &flight.to_string())
    }

    pub fn query_cars_price(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_price(txn, ItemKind::Car, location)
    }

    pub fn query_rooms_price(&self, txn: TransactionId, location: &str) -> Result<u32> {
        self.query_price(txn, ItemKind::Room, location)
    }

    // ========================================================================
    // Customers and reservations
    // ========================================================================

    pub fn new_customer(&self, txn: TransactionId) -> Result<CustomerId> {
        self.run(txn, &[ServiceName::Customers], || {
            self.participants.customers.new_customer(txn)
        })
    }

    pub fn new_customer_with_id(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        self.run(txn, &[ServiceName::Customers], || {
            self.participants.customers.new_customer_with_id(txn, customer)
        })
    }

    pub fn query_customer_info(&self, txn: TransactionId, customer: CustomerId) -> Result<String> {
        self.run(txn, &[ServiceName::Customers], || {
            self.participants.customers.query_customer_info(txn, customer)
        })
    }

    /// Give every reserved unit back to its inventory, then drop the customer
    pub fn delete_customer(&self, txn: TransactionId, customer: CustomerId) -> Result<bool> {
        self.run(txn, &[ServiceName::Customers], || {
            let customers = &self.participants.customers;
            let Some(items) = customers.reservations_for_update(txn, customer)? else {
                return Ok(false);
            };

            for item in &items {
                self.enlist(txn, item.kind.service())?;
                let released = self
                    .participants
                    .resource(item.kind)
                    .release(txn, &item.id, item.amount)?;
                if !released {
                    tracing::warn!(
                        "{} was gone when releasing for customer {}",
                        item.key,
                        customer
                    );
                }
            }
            self.participants.customers.delete_customer(txn, customer)
        })
    }

    /// Reserve one unit of an item for a customer
    ///
    /// The customer table is write-locked before the inventory, the same
    /// order [`bundle`](Self::bundle) and
    /// [`delete_customer`](Self::delete_customer) use.
    pub fn reserve_item(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: &str,
    ) -> Result<bool> {
        self.run(txn, &[ServiceName::Customers, kind.service()], || {
            let customers = &self.participants.customers;
            if customers.reservations_for_update(txn, customer)?.is_none() {
                return Ok(false);
            }
            self.reserve_unit(txn, customer, kind, id)
        })
    }

    pub fn reserve_flight(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        flight: u32,
    ) -> Result<bool> {
        self.reserve_item(txn, customer, ItemKind::Flight, &flight.to_string())
    }

    pub fn reserve_car(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        location: &str,
    ) -> Result<bool> {
        self.reserve_item(txn, customer, ItemKind::Car, location)
    }

    pub fn reserve_room(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        location: &str,
    ) -> Result<bool> {
        self.reserve_item(txn, customer, ItemKind::Room, location)
    }

    /// Book flights, then a car and a room, all or nothing
    ///
    /// On the first failed step the units already booked are released and
    /// removed from the ledger, newest first. A crash between a booking and
    /// its compensation is left to the transaction's abort.
    pub fn bundle(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        flights: &[String],
        location: &str,
        car: bool,
        room: bool,
    ) -> Result<bool> {
        let mut steps: Vec<(ItemKind, &str)> = flights
            .iter()
            .map(|f| (ItemKind::Flight, f.as_str()))
            .collect();
        if car {
            steps.push((ItemKind::Car, location));
        }
        if room {
            steps.push((ItemKind::Room, location));
        }

        self.run(txn, &[ServiceName::Customers], || {
            let customers = &self.participants.customers;
            if customers.reservations_for_update(txn, customer)?.is_none() {
                return Ok(false);
            }

            let mut booked: Vec<(ItemKind, &str)> = Vec::with_capacity(steps.len());
            for (kind, id) in &steps {
                self.enlist(txn, kind.service())?;
                if self.reserve_unit(txn, customer, *kind, id)? {
                    booked.push((*kind, *id));
                    continue;
                }

                tracing::info!(
                    "Bundle for customer {} failed at {}; undoing {} bookings",
                    customer,
                    kind.item_key(id),
                    booked.len()
                );
                for (kind, id) in booked.iter().rev() {
                    self.participants.resource(*kind).release(txn, id, 1)?;
                    self.participants
                        .customers
                        .cancel_reservation(txn, customer, *kind, id)?;
                }
                return Ok(false);
            }
            Ok(true)
        })
    }

    /// One unit off the inventory, then its price onto the ledger
    ///
    /// Reserving first takes the write lock, so the price lookup never has
    /// to upgrade a read lock.
    fn reserve_unit(
        &self,
        txn: TransactionId,
        customer: CustomerId,
        kind: ItemKind,
        id: &str,
    ) -> Result<bool> {
        let resource = self.participants.resource(kind);
        if !resource.reserve(txn, id)? {
            return Ok(false);
        }
        let price = resource.query_price(txn, id)?;

        if !self
            .participants
            .customers
            .reserve(txn, customer, kind, id, price)?
        {
            resource.release(txn, id, 1)?;
            return Ok(false);
        }
        Ok(true)
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Arm a crash point here or on a service
    pub fn inject_crash(&self, site: CrashSite, point: CrashPoint) -> Result<bool> {
        match site {
            CrashSite::Middleware => Ok(self.crash.arm(point)),
            CrashSite::Service(service) => {
                if !point.is_valid_for(site) {
                    return Ok(false);
                }
                self.participants.participant(service).inject_crash(point)
            }
        }
    }

    /// Kill one process
    pub fn crash(&self, site: CrashSite) -> Result<bool> {
        match site {
            CrashSite::Middleware => {
                self.crash.kill();
                Ok(true)
            }
            CrashSite::Service(service) => self.participants.participant(service).crash(),
        }
    }

    /// Stop every service, then this process, after the grace period
    pub fn shutdown(&self) -> Result<bool> {
        let grace = self.config.shutdown_grace;
        for service in ServiceName::ALL {
            if let Err(e) = self.participants.participant(service).shutdown(grace) {
                tracing::warn!("Could not shut down {}: {}", service, e);
            }
        }
        self.crash.shutdown_after(grace);
        Ok(true)
    }
}
