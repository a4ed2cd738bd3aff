//! Document store boundary: collection-scoped writes, reads and live queries.

pub mod actor;
pub mod client;
pub mod document;
pub mod error;
pub mod path;
pub mod value;

pub use actor::{ListenerId, StoreActor, StoreRequest};
pub use client::{Listener, StoreClient};
pub use document::{Direction, Document, FieldWrite, Fields, Query, Snapshot, WriteFields};
pub use error::StoreError;
pub use path::{CollectionPath, DocumentPath};
pub use value::Value;
