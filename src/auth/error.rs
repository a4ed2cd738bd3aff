use thiserror::Error;

/// Errors that can occur during authentication.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Password should be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("Email already in use: {0}")]
    EmailAlreadyInUse(String),
    #[error("Invalid email or password")]
    InvalidCredential,
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
