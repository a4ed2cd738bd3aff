use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::client::StoreClient;
use super::document::{Document, Query, Snapshot, WriteFields};
use super::error::StoreError;
use super::path::{CollectionPath, DocumentPath};

// =============================================================================
// MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Debug)]
pub enum StoreRequest {
    Create {
        collection: CollectionPath,
        fields: WriteFields,
        respond_to: Response<Document>,
    },
    Get {
        path: DocumentPath,
        respond_to: Response<Option<Document>>,
    },
    Update {
        path: DocumentPath,
        fields: WriteFields,
        respond_to: Response<Document>,
    },
    Delete {
        path: DocumentPath,
        respond_to: Response<Option<DateTime<Utc>>>,
    },
    List {
        query: Query,
        respond_to: Response<Snapshot>,
    },
    Listen {
        query: Query,
        sink: mpsc::UnboundedSender<Snapshot>,
        respond_to: Response<ListenerId>,
    },
    Unlisten {
        id: ListenerId,
    },
    Shutdown,
    #[cfg(test)]
    ListenerCount {
        respond_to: Response<usize>,
    },
}

// =============================================================================
// SERVER CLOCK
// =============================================================================

/// Commit clock. Never hands out the same instant twice, so documents created
/// back to back still order deterministically by their timestamps.
#[derive(Debug, Default)]
struct ServerClock {
    last: Option<DateTime<Utc>>,
}

impl ServerClock {
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last = Some(next);
        next
    }
}

// =============================================================================
// THE STORE ACTOR
// =============================================================================

struct ActiveListener {
    query: Query,
    sink: mpsc::UnboundedSender<Snapshot>,
}

/// In-process document store.
///
/// Owns every collection and serves requests one at a time. Live queries are
/// re-run after each commit that touches their collection, and the result is
/// pushed to the listener in commit order.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    collections: HashMap<CollectionPath, BTreeMap<String, Document>>,
    listeners: HashMap<ListenerId, ActiveListener>,
    next_listener: u64,
    version: u64,
    read_time: DateTime<Utc>,
    clock: ServerClock,
    next_id_fn: Box<dyn Fn() -> String + Send + Sync>,
}

impl StoreActor {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> String + Send + Sync + 'static,
    ) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let mut clock = ServerClock::default();
        let actor = Self {
            receiver,
            collections: HashMap::new(),
            listeners: HashMap::new(),
            next_listener: 1,
            version: 0,
            read_time: clock.tick(),
            clock,
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, StoreClient::new(sender))
    }

    #[instrument(name = "document_store", skip(self))]
    pub async fn run(mut self) {
        info!("DocumentStore starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Create {
                    collection,
                    fields,
                    respond_to,
                } => {
                    let _ = respond_to.send(Ok(self.handle_create(collection, fields)));
                }
                StoreRequest::Get { path, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_get(&path)));
                }
                StoreRequest::Update {
                    path,
                    fields,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_update(path, fields));
                }
                StoreRequest::Delete { path, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_delete(&path)));
                }
                StoreRequest::List { query, respond_to } => {
                    let _ = respond_to.send(Ok(self.snapshot(&query)));
                }
                StoreRequest::Listen {
                    query,
                    sink,
                    respond_to,
                } => {
                    let _ = respond_to.send(Ok(self.handle_listen(query, sink)));
                }
                StoreRequest::Unlisten { id } => {
                    if self.listeners.remove(&id).is_some() {
                        debug!(listener = id.0, "Listener removed");
                    }
                }
                StoreRequest::Shutdown => {
                    info!("DocumentStore shutting down");
                    break;
                }
                #[cfg(test)]
                StoreRequest::ListenerCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.listeners.len()));
                }
            }
        }

        info!("DocumentStore stopped");
    }

    #[instrument(skip_all, fields(collection = %collection))]
    fn handle_create(&mut self, collection: CollectionPath, fields: WriteFields) -> Document {
        let commit_time = self.clock.tick();
        let id = self.fresh_id(&collection);
        let document = Document {
            path: DocumentPath::from_parts(collection.clone(), id),
            fields: fields.resolve(commit_time),
            create_time: commit_time,
            update_time: commit_time,
        };

        debug!(document_id = %document.id(), "Document created");
        self.collections
            .entry(collection.clone())
            .or_default()
            .insert(document.id().to_string(), document.clone());
        self.commit(&collection, commit_time);
        document
    }

    fn handle_get(&self, path: &DocumentPath) -> Option<Document> {
        self.collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .cloned()
    }

    #[instrument(skip_all, fields(path = %path))]
    fn handle_update(
        &mut self,
        path: DocumentPath,
        fields: WriteFields,
    ) -> Result<Document, StoreError> {
        if fields.is_empty() {
            return Err(StoreError::WriteRejected(format!("empty update for {path}")));
        }
        let commit_time = self.clock.tick();
        let document = self
            .collections
            .get_mut(path.collection())
            .and_then(|docs| docs.get_mut(path.id()))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        document.fields.extend(fields.resolve(commit_time));
        document.update_time = commit_time;
        let updated = document.clone();

        debug!("Document updated");
        self.commit(path.collection(), commit_time);
        Ok(updated)
    }

    /// Deleting a missing document succeeds without committing and returns
    /// `None`. Nested collections are left alone.
    #[instrument(skip_all, fields(path = %path))]
    fn handle_delete(&mut self, path: &DocumentPath) -> Option<DateTime<Utc>> {
        let removed = self
            .collections
            .get_mut(path.collection())
            .and_then(|docs| docs.remove(path.id()))
            .is_some();
        if !removed {
            debug!("Nothing to delete");
            return None;
        }
        let commit_time = self.clock.tick();
        debug!("Document deleted");
        self.commit(path.collection(), commit_time);
        Some(commit_time)
    }

    fn handle_listen(&mut self, query: Query, sink: mpsc::UnboundedSender<Snapshot>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;

        // A new listener always sees the current state first.
        if sink.send(self.snapshot(&query)).is_ok() {
            debug!(listener = id.0, collection = %query.collection, "Listener added");
            self.listeners.insert(id, ActiveListener { query, sink });
        }
        id
    }

    fn fresh_id(&self, collection: &CollectionPath) -> String {
        let existing = self.collections.get(collection);
        loop {
            let id = (self.next_id_fn)();
            if !existing.is_some_and(|docs| docs.contains_key(&id)) {
                return id;
            }
            warn!(document_id = %id, "Generated id already taken, retrying");
        }
    }

    fn snapshot(&self, query: &Query) -> Snapshot {
        let documents = match self.collections.get(&query.collection) {
            Some(docs) => query.run(docs.values()),
            None => Vec::new(),
        };
        Snapshot {
            documents,
            version: self.version,
            read_time: self.read_time,
        }
    }

    /// Bumps the commit counter and pushes fresh results to every listener on
    /// the collection. Listeners whose receiver is gone are dropped.
    fn commit(&mut self, collection: &CollectionPath, commit_time: DateTime<Utc>) {
        self.version += 1;
        self.read_time = commit_time;

        let affected: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|(_, listener)| &listener.query.collection == collection)
            .map(|(id, _)| *id)
            .collect();

        for id in affected {
            let Some(listener) = self.listeners.get(&id) else {
                continue;
            };
            let snapshot = self.snapshot(&listener.query);
            if listener.sink.send(snapshot).is_err() {
                debug!(listener = id.0, "Listener receiver dropped");
                self.listeners.remove(&id);
            }
        }
    }
}
