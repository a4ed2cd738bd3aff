//! # Mock Framework
//!
//! Utilities for testing store-backed code in isolation.
//!
//! Use [`create_mock_store`] to get a client and a receiver.
//! Then use helpers like [`expect_create`] or [`expect_update`] to assert
//! behavior and script the store's reply.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::store::actor::Response;
use crate::store::{
    CollectionPath, Document, DocumentPath, ListenerId, Query, Snapshot, StoreClient, StoreRequest,
    WriteFields,
};

/// Creates a store client whose requests land on the returned receiver.
///
/// Tests answer each request through its `respond_to` sender, so success,
/// failure and ordering are fully under their control.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Builds the document the store would return after committing `fields` at
/// `path` now.
pub fn committed(path: DocumentPath, fields: WriteFields) -> Document {
    let now = Utc::now();
    Document {
        path,
        fields: fields.resolve(now),
        create_time: now,
        update_time: now,
    }
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(CollectionPath, WriteFields, Response<Document>)> {
    match receiver.recv().await {
        Some(StoreRequest::Create {
            collection,
            fields,
            respond_to,
        }) => Some((collection, fields, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(DocumentPath, Response<Option<Document>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Get { path, respond_to }) => Some((path, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(DocumentPath, WriteFields, Response<Document>)> {
    match receiver.recv().await {
        Some(StoreRequest::Update {
            path,
            fields,
            respond_to,
        }) => Some((path, fields, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Delete request
pub async fn expect_delete(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(DocumentPath, Response<Option<DateTime<Utc>>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Delete { path, respond_to }) => Some((path, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Listen request. Tests push
/// snapshots through the returned sink.
pub async fn expect_listen(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(Query, mpsc::UnboundedSender<Snapshot>, Response<ListenerId>)> {
    match receiver.recv().await {
        Some(StoreRequest::Listen {
            query,
            sink,
            respond_to,
        }) => Some((query, sink, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[tokio::test]
    async fn test_mock_store_get() {
        let (client, mut receiver) = create_mock_store(10);

        let get_task = tokio::spawn(async move {
            let path = DocumentPath::parse("users/u1/orders/o1").unwrap();
            client.get(path).await
        });

        let (path, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(path.id(), "o1");
        responder.send(Ok(None)).unwrap();

        let result = get_task.await.unwrap();
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_mock_listener_receives_scripted_snapshots() {
        let (client, mut receiver) = create_mock_store(10);

        let listen_task = tokio::spawn(async move {
            let query = Query::collection(CollectionPath::parse("users/u1/orders").unwrap());
            let mut listener = client.listen(query).await?;
            let first = listener.next().await;
            Ok::<_, StoreError>(first.map(|s| s.version))
        });

        let (query, sink, responder) = expect_listen(&mut receiver).await.expect("Expected Listen request");
        assert_eq!(query.collection.as_str(), "users/u1/orders");
        responder.send(Ok(ListenerId(1))).unwrap();
        sink.send(Snapshot {
            documents: Vec::new(),
            version: 3,
            read_time: Utc::now(),
        })
        .unwrap();

        let version = listen_task.await.unwrap();
        assert_eq!(version, Ok(Some(3)));
    }
}
