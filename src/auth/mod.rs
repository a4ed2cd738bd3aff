//! Auth provider boundary and the session state derived from it.

pub mod client;
pub mod error;
mod password;
pub mod provider;
pub mod session;
pub mod signup_form;

pub use client::{AuthClient, SessionEvents};
pub use error::AuthError;
pub use provider::{AuthProvider, AuthRequest};
pub use session::{AuthSession, SessionState};
pub use signup_form::SignupForm;
