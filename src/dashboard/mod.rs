//! The signed-in user's order dashboard.
//!
//! A [`Dashboard`] owns the local [`DashboardState`], keeps it synced with the
//! store, and applies user mutations with write-then-reconcile.

pub mod audit;
pub mod error;
mod handlers;
pub mod metrics;
pub mod order_form;
pub mod state;
mod sync;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument};

pub use audit::{audit_payment_fields, PaymentFieldIssue};
pub use error::DashboardError;
pub use metrics::{format_currency, DashboardMetrics, OrderFinancials};
pub use order_form::OrderForm;
pub use state::DashboardState;

use crate::auth::SessionState;
use crate::domain::User;
use crate::store::StoreClient;
use sync::OrderSync;

pub struct Dashboard {
    store: StoreClient,
    user: User,
    state: Arc<watch::Sender<DashboardState>>,
    sync: Option<OrderSync>,
}

impl Dashboard {
    /// Opens the dashboard for whoever is signed in and starts syncing.
    #[instrument(skip_all)]
    pub async fn open(store: StoreClient, session: &SessionState) -> Result<Self, DashboardError> {
        let user = session.user.clone().ok_or(DashboardError::NotSignedIn)?;
        let mut dashboard = Self::new(store, user);
        dashboard.start_sync().await?;
        info!(uid = %dashboard.user.uid, "Dashboard opened");
        Ok(dashboard)
    }

    /// A dashboard with empty state and no sync running.
    pub(crate) fn new(store: StoreClient, user: User) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            store,
            user,
            state: Arc::new(state),
            sync: None,
        }
    }

    pub(crate) async fn start_sync(&mut self) -> Result<(), DashboardError> {
        if self.sync.is_none() {
            let sync = OrderSync::start(self.store.clone(), &self.user, self.state.clone()).await?;
            self.sync = Some(sync);
        }
        Ok(())
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn metrics(&self) -> DashboardMetrics {
        self.state.borrow().metrics()
    }

    /// Stops syncing. Every listener the dashboard opened is released.
    pub async fn close(mut self) {
        if let Some(sync) = self.sync.take() {
            sync.stop().await;
        }
        info!(uid = %self.user.uid, "Dashboard closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreActor;

    #[tokio::test]
    async fn test_open_requires_a_user() {
        let (actor, store) = StoreActor::new(8, || "id".to_string());
        tokio::spawn(actor.run());

        let result = Dashboard::open(store.clone(), &SessionState::signed_out()).await;
        assert!(matches!(result, Err(DashboardError::NotSignedIn)));

        let result = Dashboard::open(store, &SessionState::loading()).await;
        assert!(matches!(result, Err(DashboardError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_close_releases_listeners() {
        let (actor, store) = StoreActor::new(8, || "id".to_string());
        tokio::spawn(actor.run());

        let session = SessionState::signed_in(User::new("u1", "a@b.c"));
        let dashboard = Dashboard::open(store.clone(), &session).await.unwrap();
        assert_eq!(store.listener_count().await.unwrap(), 1);

        dashboard.close().await;
        // Unlisten is sent from Drop; the next request is served after it.
        assert_eq!(store.listener_count().await.unwrap(), 0);
    }
}
