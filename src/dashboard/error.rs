use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while working with the dashboard.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    #[error("Not signed in")]
    NotSignedIn,
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),
    #[error("Person {person_id} not found in order {order_id}")]
    PersonNotFound { order_id: String, person_id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
