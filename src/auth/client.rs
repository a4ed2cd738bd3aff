use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use super::error::AuthError;
use super::provider::{AuthRequest, Response};
use crate::domain::User;

/// Stream of session changes; `None` means signed out.
pub type SessionEvents = mpsc::UnboundedReceiver<Option<User>>;

/// Handle to the auth provider. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuthClient {
    sender: mpsc::Sender<AuthRequest>,
}

impl AuthClient {
    pub(crate) fn new(sender: mpsc::Sender<AuthRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> AuthRequest,
    ) -> Result<T, AuthError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| AuthError::ActorCommunicationError("Auth provider closed".to_string()))?;

        response
            .await
            .map_err(|_| AuthError::ActorCommunicationError("Auth provider dropped".to_string()))?
    }

    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        debug!("Sending request");
        let (email, password) = (email.to_string(), password.to_string());
        self.request(|respond_to| AuthRequest::SignUp {
            email,
            password,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        debug!("Sending request");
        let (email, password) = (email.to_string(), password.to_string());
        self.request(|respond_to| AuthRequest::SignIn {
            email,
            password,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        debug!("Sending request");
        self.request(|respond_to| AuthRequest::SignOut { respond_to }).await
    }

    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<Option<User>, AuthError> {
        debug!("Sending request");
        self.request(|respond_to| AuthRequest::CurrentUser { respond_to }).await
    }

    /// Subscribes to session changes. The current session arrives first.
    #[instrument(skip(self))]
    pub async fn on_session_change(&self) -> Result<SessionEvents, AuthError> {
        debug!("Sending request");
        let (sink, events) = mpsc::unbounded_channel();
        self.request(|respond_to| AuthRequest::Subscribe { sink, respond_to })
            .await?;
        Ok(events)
    }

    #[cfg(test)]
    pub async fn subscriber_count(&self) -> Result<usize, AuthError> {
        self.request(|respond_to| AuthRequest::SubscriberCount { respond_to }).await
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), AuthError> {
        debug!("Sending shutdown request");
        self.sender
            .send(AuthRequest::Shutdown)
            .await
            .map_err(|_| AuthError::ActorCommunicationError("Auth provider closed".to_string()))
    }
}
