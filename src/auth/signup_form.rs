use tracing::{info, warn};

use super::client::AuthClient;
use crate::routing::{self, Route};

/// Sign-up form state. Auth failures show up as the form's message.
#[derive(Debug, Default, Clone)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    error: Option<String>,
}

impl SignupForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Creates the account. Returns where to navigate on success.
    pub async fn submit(&mut self, auth: &AuthClient) -> Option<Route> {
        self.error = None;
        match auth.sign_up(&self.email, &self.password).await {
            Ok(user) => {
                info!(uid = %user.uid, "Sign-up complete");
                Some(routing::after_sign_up())
            }
            Err(e) => {
                warn!(error = %e, "Sign-up failed");
                self.error = Some(e.to_string());
                None
            }
        }
    }
}
