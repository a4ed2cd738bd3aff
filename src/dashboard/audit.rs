//! Finds orders that carry the misspelled `paymentsRecieved` field.
//!
//! New orders are created with that spelling while edits and metrics use
//! `paymentsReceived`. The two are never merged; this report lists what a
//! migration would have to touch.

use serde::Serialize;

use crate::domain::Order;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFieldIssue {
    pub order_id: String,
    pub order_name: String,
    pub misspelled_value: f64,
    /// Whether `paymentsReceived` is also set on the order.
    pub has_canonical_field: bool,
}

pub fn audit_payment_fields(orders: &[Order]) -> Vec<PaymentFieldIssue> {
    orders
        .iter()
        .filter_map(|order| {
            order.legacy_payments_recieved.map(|value| PaymentFieldIssue {
                order_id: order.id.clone(),
                order_name: order.name.clone(),
                misspelled_value: value,
                has_canonical_field: order.payments_received.is_some(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, canonical: Option<f64>, legacy: Option<f64>) -> Order {
        Order {
            id: id.to_string(),
            name: format!("Order {id}"),
            created_at: None,
            status: None,
            fulfillment: None,
            payments_received: canonical,
            expense: None,
            placeholder_people: None,
            placeholder_total: None,
            legacy_payments_recieved: legacy,
        }
    }

    #[test]
    fn test_lists_only_orders_with_the_misspelling() {
        let orders = vec![
            order("fresh", None, Some(0.0)),
            order("edited", Some(40.0), Some(0.0)),
            order("clean", Some(10.0), None),
        ];

        let issues = audit_payment_fields(&orders);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].order_id, "fresh");
        assert!(!issues[0].has_canonical_field);
        assert_eq!(issues[1].order_name, "Order edited");
        assert!(issues[1].has_canonical_field);
    }

    #[test]
    fn test_empty_list_has_no_issues() {
        assert!(audit_payment_fields(&[]).is_empty());
    }
}
