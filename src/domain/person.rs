use serde::Serialize;

use crate::store::{Document, WriteFields};

pub mod fields {
    pub const NAME: &str = "name";
    pub const PAYMENT_STATUS: &str = "paymentStatus";
}

/// Someone attached to an order, with whether they have paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub payment_status: bool,
}

impl Person {
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id().to_string(),
            name: document
                .get(fields::NAME)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            payment_status: document
                .get(fields::PAYMENT_STATUS)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }

    pub fn payment_fields(payment_status: bool) -> WriteFields {
        WriteFields::new().set(fields::PAYMENT_STATUS, payment_status)
    }
}

/// Input for a new person. The name is trimmed.
#[derive(Debug, Clone)]
pub struct PersonCreate {
    pub name: String,
}

impl PersonCreate {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
        }
    }

    /// New people start unpaid.
    pub fn fields(&self) -> WriteFields {
        WriteFields::new()
            .set(fields::NAME, self.name.as_str())
            .set(fields::PAYMENT_STATUS, false)
    }
}
