//! Keeps [`DashboardState`] in step with the store.
//!
//! One live query follows the user's orders. Each visible order gets its own
//! live query on its people collection. When an order leaves the snapshot its
//! people listener is cancelled, and any event it already queued is dropped
//! because its generation no longer matches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use super::error::DashboardError;
use super::state::DashboardState;
use crate::domain::order::fields;
use crate::domain::paths::{orders_collection, people_collection};
use crate::domain::{Order, Person, User};
use crate::store::{Direction, Listener, Query, Snapshot, StoreClient};

#[derive(Debug)]
struct PeopleEvent {
    order_id: String,
    generation: u64,
    people: Vec<Person>,
    read_time: DateTime<Utc>,
}

struct PeopleListener {
    generation: u64,
    cancel: CancellationToken,
}

/// Handle to the running sync task.
pub(crate) struct OrderSync {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl OrderSync {
    /// Opens the order listener and spawns the sync loop. Returns once the
    /// listener is registered, so the first snapshot is already queued.
    #[instrument(skip_all, fields(uid = %user.uid))]
    pub(crate) async fn start(
        store: StoreClient,
        user: &User,
        state: Arc<watch::Sender<DashboardState>>,
    ) -> Result<Self, DashboardError> {
        let query = Query::collection(orders_collection(&user.uid)?)
            .order_by(fields::CREATED_AT, Direction::Descending);
        let orders = store.listen(query).await?;

        let cancel = CancellationToken::new();
        let (people_tx, people_rx) = mpsc::unbounded_channel();
        let sync = SyncLoop {
            store,
            uid: user.uid.clone(),
            state,
            people_tx,
            people_listeners: HashMap::new(),
            next_generation: 1,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(
            sync.run(orders, people_rx)
                .instrument(info_span!("order_sync", uid = %user.uid)),
        );

        info!("Order sync started");
        Ok(Self { cancel, task })
    }

    pub(crate) async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "Order sync task failed");
        }
    }
}

impl Drop for OrderSync {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SyncLoop {
    store: StoreClient,
    uid: String,
    state: Arc<watch::Sender<DashboardState>>,
    people_tx: mpsc::UnboundedSender<PeopleEvent>,
    people_listeners: HashMap<String, PeopleListener>,
    next_generation: u64,
    cancel: CancellationToken,
}

impl SyncLoop {
    async fn run(mut self, mut orders: Listener, mut people_rx: mpsc::UnboundedReceiver<PeopleEvent>) {
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    debug!("Order sync cancelled");
                    break;
                }
                snapshot = orders.next() => match snapshot {
                    Some(snapshot) => self.apply_orders(snapshot),
                    None => {
                        warn!("Order subscription closed");
                        break;
                    }
                },
                Some(event) = people_rx.recv() => self.apply_people(event),
            }
        }

        for (_, listener) in self.people_listeners.drain() {
            listener.cancel.cancel();
        }
        info!("Order sync stopped");
    }

    fn apply_orders(&mut self, snapshot: Snapshot) {
        let orders: Vec<Order> = snapshot.documents.iter().map(Order::from_document).collect();
        let ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
        debug!(version = snapshot.version, count = ids.len(), "Orders snapshot");

        let applied = self
            .state
            .send_if_modified(|state| state.apply_orders_snapshot(orders, snapshot.read_time));
        if !applied {
            debug!(version = snapshot.version, "Dropping outdated orders snapshot");
            return;
        }

        let visible: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.people_listeners.retain(|order_id, listener| {
            let keep = visible.contains(order_id.as_str());
            if !keep {
                debug!(order_id = %order_id, "Cancelling people listener");
                listener.cancel.cancel();
            }
            keep
        });

        for order_id in ids {
            if !self.people_listeners.contains_key(&order_id) {
                self.open_people_listener(order_id);
            }
        }
    }

    fn apply_people(&mut self, event: PeopleEvent) {
        let current = self
            .people_listeners
            .get(&event.order_id)
            .map(|l| l.generation);
        if current != Some(event.generation) {
            debug!(order_id = %event.order_id, "Dropping people snapshot from closed listener");
            return;
        }
        let PeopleEvent {
            order_id,
            people,
            read_time,
            ..
        } = event;
        let applied = self
            .state
            .send_if_modified(|state| state.apply_people_snapshot(&order_id, people, read_time));
        if !applied {
            debug!(order_id = %order_id, "Dropping outdated people snapshot");
        }
    }

    fn open_people_listener(&mut self, order_id: String) {
        let query = match people_collection(&self.uid, &order_id) {
            Ok(collection) => Query::collection(collection),
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Cannot watch people");
                return;
            }
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        let cancel = self.cancel.child_token();
        self.people_listeners.insert(
            order_id.clone(),
            PeopleListener {
                generation,
                cancel: cancel.clone(),
            },
        );

        let store = self.store.clone();
        let sink = self.people_tx.clone();
        let span = info_span!("people_listener", order_id = %order_id);
        tokio::spawn(
            forward_people(store, query, order_id, generation, sink, cancel).instrument(span),
        );
    }
}

async fn forward_people(
    store: StoreClient,
    query: Query,
    order_id: String,
    generation: u64,
    sink: mpsc::UnboundedSender<PeopleEvent>,
    cancel: CancellationToken,
) {
    let mut listener = tokio::select! {
        biased;

        () = cancel.cancelled() => return,
        result = store.listen(query) => match result {
            Ok(listener) => listener,
            Err(e) => {
                warn!(error = %e, "People listener failed to open");
                return;
            }
        },
    };

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,
            snapshot = listener.next() => {
                let Some(snapshot) = snapshot else { break };
                let people = snapshot.documents.iter().map(Person::from_document).collect();
                let event = PeopleEvent {
                    order_id: order_id.clone(),
                    generation,
                    people,
                    read_time: snapshot.read_time,
                };
                if sink.send(event).is_err() {
                    break;
                }
            }
        }
    }
    debug!("People listener closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::committed;
    use crate::store::{StoreActor, WriteFields};
    use chrono::TimeDelta;

    fn sync_loop() -> (SyncLoop, Arc<watch::Sender<DashboardState>>) {
        let (actor, store) = StoreActor::new(8, || "id".to_string());
        tokio::spawn(actor.run());

        let (tx, _rx) = watch::channel(DashboardState::default());
        let state = Arc::new(tx);
        let (people_tx, _people_rx) = mpsc::unbounded_channel();
        let sync = SyncLoop {
            store,
            uid: "u1".to_string(),
            state: state.clone(),
            people_tx,
            people_listeners: HashMap::new(),
            next_generation: 1,
            cancel: CancellationToken::new(),
        };
        (sync, state)
    }

    fn orders_snapshot(ids: &[&str], read_time: DateTime<Utc>) -> Snapshot {
        let collection = orders_collection("u1").unwrap();
        let documents = ids
            .iter()
            .map(|id| committed(collection.doc(id).unwrap(), WriteFields::new().set(fields::NAME, *id)))
            .collect();
        Snapshot {
            documents,
            version: 1,
            read_time,
        }
    }

    fn people_event(generation: u64, person_id: &str, read_time: DateTime<Utc>) -> PeopleEvent {
        PeopleEvent {
            order_id: "o1".to_string(),
            generation,
            people: vec![Person {
                id: person_id.to_string(),
                name: person_id.to_string(),
                payment_status: false,
            }],
            read_time,
        }
    }

    #[tokio::test]
    async fn test_orders_snapshot_opens_people_listeners() {
        let (mut sync, state) = sync_loop();
        sync.apply_orders(orders_snapshot(&["o1", "o2"], Utc::now()));

        assert_eq!(state.borrow().orders.len(), 2);
        assert!(sync.people_listeners.contains_key("o1"));
        assert!(sync.people_listeners.contains_key("o2"));
        assert_ne!(
            sync.people_listeners["o1"].generation,
            sync.people_listeners["o2"].generation
        );
    }

    #[tokio::test]
    async fn test_event_from_replaced_listener_is_ignored() {
        let (mut sync, state) = sync_loop();
        let now = Utc::now();
        sync.apply_orders(orders_snapshot(&["o1"], now));
        let generation = sync.people_listeners["o1"].generation;

        sync.apply_people(people_event(generation + 100, "stale", now));
        assert!(state.borrow().people_of("o1").is_empty());

        sync.apply_people(people_event(generation, "fresh", now));
        assert_eq!(state.borrow().people_of("o1")[0].id, "fresh");
    }

    #[tokio::test]
    async fn test_removed_order_cancels_its_listener() {
        let (mut sync, state) = sync_loop();
        let now = Utc::now();
        sync.apply_orders(orders_snapshot(&["o1"], now));
        let generation = sync.people_listeners["o1"].generation;
        let token = sync.people_listeners["o1"].cancel.clone();

        sync.apply_orders(orders_snapshot(&[], now + TimeDelta::seconds(1)));
        assert!(token.is_cancelled());
        assert!(sync.people_listeners.is_empty());

        // A late event from the cancelled listener must not resurrect the entry.
        sync.apply_people(people_event(generation, "late", now));
        assert!(state.borrow().people.is_empty());
    }

    #[tokio::test]
    async fn test_outdated_orders_snapshot_changes_nothing() {
        let (mut sync, state) = sync_loop();
        let now = Utc::now();
        sync.apply_orders(orders_snapshot(&["o1"], now));
        let token = sync.people_listeners["o1"].cancel.clone();

        sync.apply_orders(orders_snapshot(&[], now - TimeDelta::seconds(1)));
        assert!(!token.is_cancelled());
        assert_eq!(state.borrow().orders.len(), 1);
    }
}
