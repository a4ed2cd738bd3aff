use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Store write rejected: {0}")]
    WriteRejected(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
