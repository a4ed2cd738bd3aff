use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use super::actor::{ListenerId, StoreRequest};
use super::document::{Document, Query, Snapshot, WriteFields};
use super::error::StoreError;
use super::path::{CollectionPath, DocumentPath};

/// Generate client methods with oneshot channel boilerplate and automatic tracing.
macro_rules! client_method {
    ($client:ty => $vis:vis fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            #[instrument(skip(self))]
            $vis async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, StoreError> {
                debug!("Sending request");
                let (respond_to, response) = oneshot::channel();
                self.sender
                    .send($request::$variant {
                        $($param,)*
                        respond_to,
                    })
                    .await
                    .map_err(|_| StoreError::ActorCommunicationError("Store closed".to_string()))?;

                response
                    .await
                    .map_err(|_| StoreError::ActorCommunicationError("Store dropped".to_string()))?
            }
        }
    };
}

/// Handle to the document store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub(crate) fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    /// Opens a live query. The first snapshot is the current state; later ones
    /// follow every commit to the collection. Dropping the listener
    /// unsubscribes.
    pub async fn listen(&self, query: Query) -> Result<Listener, StoreError> {
        let (sink, snapshots) = mpsc::unbounded_channel();
        let id = self.register_listener(query, sink).await?;
        Ok(Listener {
            id,
            snapshots,
            sender: self.sender.clone(),
        })
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        debug!("Sending shutdown request");
        self.sender
            .send(StoreRequest::Shutdown)
            .await
            .map_err(|_| StoreError::ActorCommunicationError("Store closed".to_string()))
    }
}

client_method!(StoreClient => pub fn create(collection: CollectionPath, fields: WriteFields) -> Document as StoreRequest::Create);
client_method!(StoreClient => pub fn get(path: DocumentPath) -> Option<Document> as StoreRequest::Get);
client_method!(StoreClient => pub fn update(path: DocumentPath, fields: WriteFields) -> Document as StoreRequest::Update);
client_method!(StoreClient => pub fn delete(path: DocumentPath) -> Option<DateTime<Utc>> as StoreRequest::Delete);
client_method!(StoreClient => pub fn list(query: Query) -> Snapshot as StoreRequest::List);
client_method!(StoreClient => fn register_listener(query: Query, sink: mpsc::UnboundedSender<Snapshot>) -> ListenerId as StoreRequest::Listen);

// Test-only method for internal state inspection
#[cfg(test)]
client_method!(StoreClient => pub fn listener_count() -> usize as StoreRequest::ListenerCount);

/// A live query subscription.
#[derive(Debug)]
pub struct Listener {
    id: ListenerId,
    snapshots: mpsc::UnboundedReceiver<Snapshot>,
    sender: mpsc::Sender<StoreRequest>,
}

impl Listener {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Next snapshot, or `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        // Best effort; the store also prunes listeners whose receiver is gone.
        let _ = self.sender.try_send(StoreRequest::Unlisten { id: self.id });
    }
}
