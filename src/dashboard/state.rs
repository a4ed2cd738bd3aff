use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::metrics::DashboardMetrics;
use crate::domain::{Order, Person};

/// Local view of the signed-in user's orders and their people.
///
/// Orders are kept newest first. People are keyed by order id; an order with
/// no entry simply has no people loaded yet.
///
/// Live snapshots and confirmed writes both land here. Each scope remembers
/// the newest store time it reflects, and snapshots older than that are
/// dropped so a write is never rolled back by a snapshot already in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    pub orders: Vec<Order>,
    pub people: HashMap<String, Vec<Person>>,
    #[serde(skip)]
    orders_seen: Option<DateTime<Utc>>,
    #[serde(skip)]
    people_seen: HashMap<String, DateTime<Utc>>,
}

impl DashboardState {
    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn people_of(&self, order_id: &str) -> &[Person] {
        self.people.get(order_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn person(&self, order_id: &str, person_id: &str) -> Option<&Person> {
        self.people_of(order_id).iter().find(|p| p.id == person_id)
    }

    pub fn metrics(&self) -> DashboardMetrics {
        DashboardMetrics::compute(&self.orders)
    }

    /// Takes the order list from a live snapshot. Returns false when the
    /// snapshot predates what the state already shows.
    pub(crate) fn apply_orders_snapshot(&mut self, orders: Vec<Order>, read_time: DateTime<Utc>) -> bool {
        if self.orders_seen.is_some_and(|seen| read_time < seen) {
            return false;
        }
        self.orders_seen = Some(read_time);
        self.replace_orders(orders);
        true
    }

    /// Takes one order's people from a live snapshot. Ignored for orders that
    /// are no longer shown.
    pub(crate) fn apply_people_snapshot(
        &mut self,
        order_id: &str,
        people: Vec<Person>,
        read_time: DateTime<Utc>,
    ) -> bool {
        if self.order(order_id).is_none() {
            return false;
        }
        if self.people_seen.get(order_id).is_some_and(|seen| read_time < *seen) {
            return false;
        }
        self.people_seen.insert(order_id.to_string(), read_time);
        self.people.insert(order_id.to_string(), people);
        true
    }

    /// People of orders that are gone are dropped.
    fn replace_orders(&mut self, orders: Vec<Order>) {
        let keep = |order_id: &String| orders.iter().any(|o| &o.id == order_id);
        self.people.retain(|order_id, _| keep(order_id));
        self.people_seen.retain(|order_id, _| keep(order_id));
        self.orders = orders;
    }

    fn mark_orders(&mut self, write_time: DateTime<Utc>) {
        self.orders_seen = self.orders_seen.max(Some(write_time));
    }

    fn mark_people(&mut self, order_id: &str, write_time: DateTime<Utc>) {
        let seen = self.people_seen.entry(order_id.to_string()).or_insert(write_time);
        *seen = (*seen).max(write_time);
    }

    pub(crate) fn upsert_order(&mut self, order: Order, write_time: DateTime<Utc>) {
        self.mark_orders(write_time);
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
        // Undated orders go last, matching what the live query would return.
        self.orders
            .sort_by_key(|o| (o.created_at.is_none(), Reverse(o.created_at)));
    }

    /// `deleted_at` is `None` when the store had nothing to delete; the
    /// freshness marker then stays where it was.
    pub(crate) fn remove_order(&mut self, order_id: &str, deleted_at: Option<DateTime<Utc>>) {
        if let Some(write_time) = deleted_at {
            self.mark_orders(write_time);
        }
        self.orders.retain(|o| o.id != order_id);
        self.people.remove(order_id);
        self.people_seen.remove(order_id);
    }

    pub(crate) fn upsert_person(&mut self, order_id: &str, person: Person, write_time: DateTime<Utc>) {
        self.mark_people(order_id, write_time);
        let people = self.people.entry(order_id.to_string()).or_default();
        match people.iter_mut().find(|p| p.id == person.id) {
            Some(existing) => *existing = person,
            None => people.push(person),
        }
    }

    pub(crate) fn remove_person(
        &mut self,
        order_id: &str,
        person_id: &str,
        deleted_at: Option<DateTime<Utc>>,
    ) {
        if let Some(write_time) = deleted_at {
            self.mark_people(order_id, write_time);
        }
        if let Some(people) = self.people.get_mut(order_id) {
            people.retain(|p| p.id != person_id);
        }
    }
}
