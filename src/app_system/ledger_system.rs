use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthClient, AuthProvider};
use crate::config::PlatformConfig;
use crate::store::{StoreActor, StoreClient};

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Actor task failed: {0}")]
    TaskFailed(String),
}

fn next_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Starts the document store and the auth provider and hands out their
/// clients.
pub struct LedgerSystem {
    pub store: StoreClient,
    pub auth: AuthClient,
    handles: Vec<JoinHandle<()>>,
}

impl LedgerSystem {
    pub fn new(config: &PlatformConfig) -> Self {
        info!(project_id = %config.project_id, "Starting ledger system");
        Self::with_buffer(config.channel_buffer)
    }

    pub fn with_buffer(buffer_size: usize) -> Self {
        // Ids are time ordered, so people list in the order they were added.
        let (store_actor, store) = StoreActor::new(buffer_size, next_id);
        let store_handle = tokio::spawn(store_actor.run());

        let (auth_provider, auth) = AuthProvider::new(buffer_size, next_id);
        let auth_handle = tokio::spawn(auth_provider.run());

        Self {
            store,
            auth,
            handles: vec![store_handle, auth_handle],
        }
    }

    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");

        if let Err(e) = self.auth.shutdown().await {
            warn!(error = %e, "Auth provider already stopped");
        }
        if let Err(e) = self.store.shutdown().await {
            warn!(error = %e, "Store already stopped");
        }

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::TaskFailed(e.to_string()));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
