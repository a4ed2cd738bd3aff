use tracing::{error, info, instrument};

use super::error::DashboardError;
use super::Dashboard;
use crate::domain::paths::{order_document, orders_collection, people_collection, person_document};
use crate::domain::{Order, OrderCreate, OrderEdit, Person, PersonCreate};

// Every handler performs one store write and touches local state only after
// the store confirms it.
impl Dashboard {
    #[instrument(skip(self), fields(uid = %self.user.uid))]
    pub async fn add_order(&self, name: &str) -> Result<Order, DashboardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardError::EmptyName("Order"));
        }

        let collection = orders_collection(&self.user.uid)?;
        let document = self
            .store
            .create(collection, OrderCreate::new(name).fields())
            .await
            .inspect_err(|e| error!(error = %e, "Order creation failed"))?;

        let order = Order::from_document(&document);
        info!(order_id = %order.id, "Order created");
        self.state
            .send_modify(|state| state.upsert_order(order.clone(), document.update_time));
        Ok(order)
    }

    #[instrument(skip(self, edit), fields(uid = %self.user.uid))]
    pub async fn edit_order(&self, order_id: &str, edit: OrderEdit) -> Result<Order, DashboardError> {
        let path = order_document(&self.user.uid, order_id)?;
        let document = self
            .store
            .update(path, edit.fields())
            .await
            .inspect_err(|e| error!(error = %e, "Order update failed"))?;

        let order = Order::from_document(&document);
        info!(name = %order.name, status = %order.status_label(), "Order updated");
        self.state
            .send_modify(|state| state.upsert_order(order.clone(), document.update_time));
        Ok(order)
    }

    /// Deletes the order document. Its people stay in the store but drop out
    /// of local state.
    #[instrument(skip(self), fields(uid = %self.user.uid))]
    pub async fn delete_order(&self, order_id: &str) -> Result<(), DashboardError> {
        let path = order_document(&self.user.uid, order_id)?;
        let deleted_at = self
            .store
            .delete(path)
            .await
            .inspect_err(|e| error!(error = %e, "Order deletion failed"))?;

        info!(existed = deleted_at.is_some(), "Order deleted");
        self.state
            .send_modify(|state| state.remove_order(order_id, deleted_at));
        Ok(())
    }

    #[instrument(skip(self), fields(uid = %self.user.uid))]
    pub async fn add_person(&self, order_id: &str, name: &str) -> Result<Person, DashboardError> {
        let create = PersonCreate::new(name);
        if create.name.is_empty() {
            return Err(DashboardError::EmptyName("Person"));
        }

        let collection = people_collection(&self.user.uid, order_id)?;
        let document = self
            .store
            .create(collection, create.fields())
            .await
            .inspect_err(|e| error!(error = %e, "Person creation failed"))?;

        let person = Person::from_document(&document);
        info!(person_id = %person.id, "Person added");
        self.state
            .send_modify(|state| state.upsert_person(order_id, person.clone(), document.update_time));
        Ok(person)
    }

    /// Flips the person's payment status as currently shown.
    #[instrument(skip(self), fields(uid = %self.user.uid))]
    pub async fn toggle_payment(&self, order_id: &str, person_id: &str) -> Result<Person, DashboardError> {
        let current = self
            .state
            .borrow()
            .person(order_id, person_id)
            .map(|p| p.payment_status);
        let Some(current) = current else {
            return Err(DashboardError::PersonNotFound {
                order_id: order_id.to_string(),
                person_id: person_id.to_string(),
            });
        };

        let path = person_document(&self.user.uid, order_id, person_id)?;
        let document = self
            .store
            .update(path, Person::payment_fields(!current))
            .await
            .inspect_err(|e| error!(error = %e, "Payment toggle failed"))?;

        let person = Person::from_document(&document);
        info!(paid = person.payment_status, "Payment status toggled");
        self.state
            .send_modify(|state| state.upsert_person(order_id, person.clone(), document.update_time));
        Ok(person)
    }

    #[instrument(skip(self), fields(uid = %self.user.uid))]
    pub async fn delete_person(&self, order_id: &str, person_id: &str) -> Result<(), DashboardError> {
        let path = person_document(&self.user.uid, order_id, person_id)?;
        let deleted_at = self
            .store
            .delete(path)
            .await
            .inspect_err(|e| error!(error = %e, "Person deletion failed"))?;

        info!(existed = deleted_at.is_some(), "Person deleted");
        self.state
            .send_modify(|state| state.remove_person(order_id, person_id, deleted_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fields as order_fields;
    use crate::domain::{OrderStatus, User};
    use crate::mock_framework::{committed, create_mock_store, expect_create, expect_delete, expect_update};
    use crate::store::{FieldWrite, StoreError, Value, WriteFields};
    use chrono::Utc;

    fn dashboard() -> (Dashboard, tokio::sync::mpsc::Receiver<crate::store::StoreRequest>) {
        let (store, receiver) = create_mock_store(10);
        (Dashboard::new(store, User::new("u1", "a@b.c")), receiver)
    }

    fn seed_people(dashboard: &Dashboard, ids: &[&str]) {
        dashboard.state.send_modify(|state| {
            for id in ids {
                let person = Person {
                    id: id.to_string(),
                    name: "Ana".to_string(),
                    payment_status: false,
                };
                state.upsert_person("o1", person, Utc::now());
            }
        });
    }

    #[tokio::test]
    async fn test_add_order_writes_defaults_and_reconciles() {
        let (dashboard, mut receiver) = dashboard();

        let task = tokio::spawn(async move {
            let result = dashboard.add_order("  Test ").await;
            (dashboard, result)
        });

        let (collection, fields, responder) =
            expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(collection.as_str(), "users/u1/orders");
        assert_eq!(fields.get(order_fields::NAME), Some(&FieldWrite::Set(Value::from("Test"))));
        assert_eq!(fields.get(order_fields::CREATED_AT), Some(&FieldWrite::ServerTimestamp));
        assert_eq!(
            fields.get(order_fields::STATUS),
            Some(&FieldWrite::Set(Value::from("Awaiting Payment")))
        );
        responder
            .send(Ok(committed(collection.doc("o1").unwrap(), fields)))
            .unwrap();

        let (dashboard, result) = task.await.unwrap();
        let order = result.unwrap();
        assert_eq!(order.id, "o1");
        assert_eq!(order.status, Some(OrderStatus::AwaitingPayment));
        assert_eq!(order.expense, Some(0.0));
        assert!(order.created_at.is_some());
        assert_eq!(dashboard.state().orders, vec![order]);
        assert!(dashboard.state().people_of("o1").is_empty());
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected_without_writing() {
        let (dashboard, mut receiver) = dashboard();

        assert_eq!(dashboard.add_order("   ").await, Err(DashboardError::EmptyName("Order")));
        assert_eq!(
            dashboard.add_person("o1", "\t").await,
            Err(DashboardError::EmptyName("Person"))
        );
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_create_leaves_state_unchanged() {
        let (dashboard, mut receiver) = dashboard();

        let task = tokio::spawn(async move {
            let result = dashboard.add_order("Dinner").await;
            (dashboard, result)
        });

        let (_, _, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        responder
            .send(Err(StoreError::WriteRejected("permission denied".to_string())))
            .unwrap();

        let (dashboard, result) = task.await.unwrap();
        assert_eq!(
            result,
            Err(DashboardError::Store(StoreError::WriteRejected(
                "permission denied".to_string()
            )))
        );
        assert_eq!(dashboard.state(), Default::default());
    }

    #[tokio::test]
    async fn test_toggle_writes_negated_status() {
        let (dashboard, mut receiver) = dashboard();
        seed_people(&dashboard, &["p1"]);

        let task = tokio::spawn(async move {
            let result = dashboard.toggle_payment("o1", "p1").await;
            (dashboard, result)
        });

        let (path, fields, responder) =
            expect_update(&mut receiver).await.expect("Expected Update request");
        assert_eq!(path.to_string(), "users/u1/orders/o1/people/p1");
        assert_eq!(fields, Person::payment_fields(true));
        let written = fields.clone().set("name", "Ana");
        responder.send(Ok(committed(path, written))).unwrap();

        let (dashboard, result) = task.await.unwrap();
        assert!(result.unwrap().payment_status);
        assert!(dashboard.state().person("o1", "p1").unwrap().payment_status);
    }

    #[tokio::test]
    async fn test_failed_toggle_leaves_state_unchanged() {
        let (dashboard, mut receiver) = dashboard();
        seed_people(&dashboard, &["p1"]);
        let before = dashboard.state();

        let task = tokio::spawn(async move {
            let result = dashboard.toggle_payment("o1", "p1").await;
            (dashboard, result)
        });

        let (path, _, responder) = expect_update(&mut receiver).await.expect("Expected Update request");
        responder.send(Err(StoreError::NotFound(path.to_string()))).unwrap();

        let (dashboard, result) = task.await.unwrap();
        assert!(matches!(result, Err(DashboardError::Store(StoreError::NotFound(_)))));
        assert_eq!(dashboard.state(), before);
    }

    #[tokio::test]
    async fn test_toggle_unknown_person() {
        let (dashboard, mut receiver) = dashboard();

        let result = dashboard.toggle_payment("o1", "ghost").await;
        assert_eq!(
            result,
            Err(DashboardError::PersonNotFound {
                order_id: "o1".to_string(),
                person_id: "ghost".to_string(),
            })
        );
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edit_order_sends_nan_for_non_numeric_input() {
        let (dashboard, mut receiver) = dashboard();

        let task = tokio::spawn(async move {
            let edit = OrderEdit::from_inputs("Lunch", "lots", "12.5kg", OrderStatus::Completed);
            let result = dashboard.edit_order("o1", edit).await;
            (dashboard, result)
        });

        let (path, fields, responder) =
            expect_update(&mut receiver).await.expect("Expected Update request");
        assert_eq!(path.id(), "o1");
        match fields.get(order_fields::PAYMENTS_RECEIVED) {
            Some(FieldWrite::Set(Value::Double(v))) => assert!(v.is_nan()),
            other => panic!("Unexpected payments write: {:?}", other),
        }
        assert_eq!(
            fields.get(order_fields::EXPENSE),
            Some(&FieldWrite::Set(Value::Double(12.5)))
        );
        responder.send(Ok(committed(path, fields))).unwrap();

        let (dashboard, result) = task.await.unwrap();
        let order = result.unwrap();
        assert!(order.is_completed());
        assert_eq!(dashboard.metrics().total_profit, -12.5);
        assert_eq!(dashboard.metrics().pending_orders, 0);
    }

    #[tokio::test]
    async fn test_delete_person_removes_only_that_id() {
        let (dashboard, mut receiver) = dashboard();
        seed_people(&dashboard, &["p1", "p2", "p3"]);

        let task = tokio::spawn(async move {
            let result = dashboard.delete_person("o1", "p2").await;
            (dashboard, result)
        });

        let (path, responder) = expect_delete(&mut receiver).await.expect("Expected Delete request");
        assert_eq!(path.id(), "p2");
        responder.send(Ok(Some(Utc::now()))).unwrap();

        let (dashboard, result) = task.await.unwrap();
        assert_eq!(result, Ok(()));
        let state = dashboard.state();
        let ids: Vec<&str> = state.people_of("o1").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_deleting_missing_order_does_not_hide_later_snapshots() {
        let (dashboard, mut receiver) = dashboard();
        let read_time = Utc::now();

        let task = tokio::spawn(async move {
            let result = dashboard.delete_order("ghost").await;
            (dashboard, result)
        });

        let (path, responder) = expect_delete(&mut receiver).await.expect("Expected Delete request");
        assert_eq!(path.id(), "ghost");
        responder.send(Ok(None)).unwrap();

        let (dashboard, result) = task.await.unwrap();
        assert_eq!(result, Ok(()));

        // An orders snapshot from another device, taken before the delete
        // was answered, still lands.
        let collection = orders_collection("u1").unwrap();
        let external = Order::from_document(&committed(
            collection.doc("ext").unwrap(),
            WriteFields::new().set(order_fields::NAME, "ext"),
        ));
        let applied = dashboard
            .state
            .send_if_modified(|state| state.apply_orders_snapshot(vec![external], read_time));
        assert!(applied);
        assert!(dashboard.state().order("ext").is_some());
    }
}
