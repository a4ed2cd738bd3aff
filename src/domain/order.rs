use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use super::numeric::parse_float_loose;
use crate::store::{Document, WriteFields};

/// Field names of an order document.
pub mod fields {
    pub const NAME: &str = "name";
    pub const CREATED_AT: &str = "createdAt";
    pub const PEOPLE: &str = "people";
    pub const TOTAL: &str = "total";
    pub const STATUS: &str = "status";
    /// Older documents carry their status here instead of `status`.
    pub const FULFILLMENT: &str = "fulfillment";
    pub const EXPENSE: &str = "expense";
    pub const PAYMENTS_RECEIVED: &str = "paymentsReceived";
    /// Misspelled twin of `paymentsReceived`, written only when an order is
    /// created. Reads and edits never touch it.
    pub const PAYMENTS_RECIEVED_LEGACY: &str = "paymentsRecieved";
}

/// Fulfillment status of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum OrderStatus {
    AwaitingPayment,
    AwaitingFulfillment,
    AwaitingApproval,
    Completed,
    /// A status string this version does not know about, kept verbatim.
    Unknown(String),
}

impl OrderStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Awaiting Payment" => OrderStatus::AwaitingPayment,
            "Awaiting Fulfillment" => OrderStatus::AwaitingFulfillment,
            "Awaiting Approval" => OrderStatus::AwaitingApproval,
            "Completed" => OrderStatus::Completed,
            other => OrderStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::AwaitingPayment => "Awaiting Payment",
            OrderStatus::AwaitingFulfillment => "Awaiting Fulfillment",
            OrderStatus::AwaitingApproval => "Awaiting Approval",
            OrderStatus::Completed => "Completed",
            OrderStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

/// An order as read back from the store.
///
/// Every field but the id is optional on the wire; missing or mistyped values
/// read as `None` and the dashboard decides how to display them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    /// The `status` field only. Empty or non-string values read as `None`.
    pub status: Option<OrderStatus>,
    /// Legacy `fulfillment` text, shown when `status` is absent.
    pub fulfillment: Option<String>,
    pub payments_received: Option<f64>,
    pub expense: Option<f64>,
    /// Random head count written at creation. Not the people collection.
    pub placeholder_people: Option<i64>,
    /// Random amount written at creation.
    pub placeholder_total: Option<i64>,
    /// Value of the misspelled `paymentsRecieved` field, if present.
    pub legacy_payments_recieved: Option<f64>,
}

impl Order {
    pub fn from_document(document: &Document) -> Self {
        let number = |field: &str| document.get(field).and_then(|v| v.as_f64());
        let text = |field: &str| {
            document
                .get(field)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
        };

        Self {
            id: document.id().to_string(),
            name: document
                .get(fields::NAME)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            created_at: document.get(fields::CREATED_AT).and_then(|v| v.as_timestamp()),
            status: text(fields::STATUS).map(OrderStatus::parse),
            fulfillment: text(fields::FULFILLMENT).map(str::to_string),
            payments_received: number(fields::PAYMENTS_RECEIVED),
            expense: number(fields::EXPENSE),
            placeholder_people: document.get(fields::PEOPLE).and_then(|v| v.as_i64()),
            placeholder_total: document.get(fields::TOTAL).and_then(|v| v.as_i64()),
            legacy_payments_recieved: number(fields::PAYMENTS_RECIEVED_LEGACY),
        }
    }

    /// Only `status` decides. A missing status counts as not completed, even
    /// when `fulfillment` says otherwise.
    pub fn is_completed(&self) -> bool {
        self.status.as_ref().is_some_and(OrderStatus::is_completed)
    }

    /// Badge text: `status`, then `fulfillment`, then `Unknown`.
    pub fn status_label(&self) -> &str {
        self.status
            .as_ref()
            .map(OrderStatus::as_str)
            .or(self.fulfillment.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Input for a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub name: String,
}

impl OrderCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Fields written for a new order, placeholder values included.
    pub fn fields(&self) -> WriteFields {
        let mut rng = rand::rng();
        WriteFields::new()
            .set(fields::NAME, self.name.as_str())
            .server_timestamp(fields::CREATED_AT)
            .set(fields::PEOPLE, rng.random_range(1..=5_i64))
            .set(fields::TOTAL, rng.random_range(20..=119_i64))
            .set(fields::STATUS, OrderStatus::AwaitingPayment.as_str())
            .set(fields::EXPENSE, 0_i64)
            .set(fields::PAYMENTS_RECIEVED_LEGACY, 0_i64)
    }
}

/// Changes applied by the edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEdit {
    pub name: String,
    pub payments_received: f64,
    pub expense: f64,
    pub status: OrderStatus,
}

impl OrderEdit {
    /// Builds an edit from raw form text. Amounts that are not numbers become
    /// NaN and are stored as such.
    pub fn from_inputs(
        name: impl Into<String>,
        payments_input: &str,
        expense_input: &str,
        status: OrderStatus,
    ) -> Self {
        Self {
            name: name.into(),
            payments_received: parse_float_loose(payments_input),
            expense: parse_float_loose(expense_input),
            status,
        }
    }

    pub fn fields(&self) -> WriteFields {
        WriteFields::new()
            .set(fields::NAME, self.name.as_str())
            .set(fields::PAYMENTS_RECEIVED, self.payments_received)
            .set(fields::EXPENSE, self.expense)
            .set(fields::STATUS, self.status.as_str())
    }
}
