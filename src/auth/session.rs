use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use super::client::AuthClient;
use super::error::AuthError;
use crate::domain::User;

/// What the rest of the app knows about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    /// True until the provider has reported the session at least once.
    pub loading: bool,
}

impl SessionState {
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            loading: false,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Mirrors the provider's session-change stream into a watchable state.
///
/// Subscribes once on [`AuthSession::start`]; [`AuthSession::shutdown`]
/// cancels the forwarding task, which drops the subscription.
pub struct AuthSession {
    state: watch::Receiver<SessionState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl AuthSession {
    pub async fn start(auth: &AuthClient) -> Result<Self, AuthError> {
        let mut events = auth.on_session_change().await?;
        let (tx, state) = watch::channel(SessionState::loading());
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        biased;

                        () = token.cancelled() => {
                            debug!("session watcher cancelled");
                            break;
                        }
                        event = events.recv() => match event {
                            Some(user) => {
                                tx.send_replace(SessionState { user, loading: false });
                            }
                            None => {
                                warn!("session stream closed");
                                break;
                            }
                        }
                    }
                }
            }
            .instrument(info_span!("auth_session")),
        );

        Ok(Self {
            state,
            cancel,
            task,
        })
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits for the first session report.
    pub async fn ready(&self) -> Result<SessionState, AuthError> {
        self.wait_for(|s| !s.loading).await
    }

    /// Waits until someone is signed in.
    pub async fn signed_in_user(&self) -> Result<User, AuthError> {
        let state = self.wait_for(|s| s.user.is_some()).await?;
        state
            .user
            .ok_or_else(|| AuthError::ActorCommunicationError("session lost".to_string()))
    }

    /// Waits until nobody is signed in.
    pub async fn signed_out(&self) -> Result<SessionState, AuthError> {
        self.wait_for(|s| !s.loading && s.user.is_none()).await
    }

    async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, AuthError> {
        let mut state = self.state.clone();
        let result = state
            .wait_for(predicate)
            .await
            .map(|s| s.clone())
            .map_err(|_| AuthError::ActorCommunicationError("session watcher stopped".to_string()));
        result
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "session watcher task failed");
        }
    }
}
