//! Document Store
//!
//! Collections of JSON documents keyed by string id. Backends:
//!
//! - [`MemoryStore`] - in-process, used by tests and `STORE_BACKEND=memory`
//! - [`SqliteStore`] - one `documents` table via sqlx
//!
//! Typed access goes through the free functions in [`document`], the same
//! way repositories take a pool handle.

pub mod document;
pub mod memory;
pub mod query;
pub mod sqlite;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use shared::error::{AppError, ErrorCode};

pub use document::Document;
pub use memory::MemoryStore;
pub use query::{Direction, Filter, FilterOp, Query};
pub use sqlite::SqliteStore;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Query needs backend configuration that is missing (e.g. an index)
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::with_message(ErrorCode::NotFound, format!("{collection} not found"))
                    .with_detail("id", id)
            }
            StoreError::FailedPrecondition(msg) => {
                tracing::error!(error = %msg, "Store query precondition failed");
                AppError::new(ErrorCode::StoreIndexMissing)
            }
            StoreError::Backend(msg) => AppError::database(msg),
            StoreError::Serialization(e) => AppError::internal(format!("Invalid document: {e}")),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document as read from a backend
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

/// One write inside an atomic batch
#[derive(Debug, Clone)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        data: Value,
        merge: bool,
    },
    Update {
        collection: String,
        id: String,
        data: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            Self::Set { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Set { id, .. } | Self::Update { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    fn change_kind(&self) -> ChangeKind {
        match self {
            Self::Set { .. } => ChangeKind::Set,
            Self::Update { .. } => ChangeKind::Update,
            Self::Delete { .. } => ChangeKind::Delete,
        }
    }

    pub(crate) fn change_event(&self) -> ChangeEvent {
        ChangeEvent {
            collection: self.collection().to_string(),
            id: self.id().to_string(),
            kind: self.change_kind(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Update,
    Delete,
}

/// Emitted after every successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
}

/// Document store backend
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// Write a document; with `merge` the top-level fields are merged into
    /// an existing document instead of replacing it
    async fn set(&self, collection: &str, id: &str, data: Value, merge: bool) -> StoreResult<()>;

    /// Insert with a store-assigned id
    async fn add(&self, collection: &str, data: Value) -> StoreResult<String>;

    /// Merge fields into an existing document (`NotFound` if missing)
    async fn update(&self, collection: &str, id: &str, data: Value) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn query(&self, query: &Query) -> StoreResult<Vec<StoredDocument>>;

    /// Apply every write or none of them
    async fn commit(&self, ops: Vec<WriteOp>) -> StoreResult<()>;

    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Push subscription: the current result set, then a fresh result set after
/// every write to the queried collection
pub fn subscribe(
    store: Arc<dyn DocumentStore>,
    query: Query,
) -> BoxStream<'static, StoreResult<Vec<StoredDocument>>> {
    let rx = store.changes();
    futures::stream::unfold(
        (store, query, rx, true),
        |(store, query, mut rx, first)| async move {
            if !first {
                loop {
                    match rx.recv().await {
                        Ok(event) if event.collection == query.collection => break,
                        Ok(_) => continue,
                        // Missed events: re-query anyway
                        Err(broadcast::error::RecvError::Lagged(_)) => break,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
            let snapshot = store.query(&query).await;
            Some((snapshot, (store, query, rx, false)))
        },
    )
    .boxed()
}

/// Store-assigned document id
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Shallow merge of `patch` into `base` (both must be objects)
pub(crate) fn merge_fields(base: &mut Value, patch: Value) -> StoreResult<()> {
    let Value::Object(patch) = patch else {
        return Err(StoreError::Backend("document data must be an object".into()));
    };
    match base {
        Value::Object(existing) => {
            for (key, value) in patch {
                existing.insert(key, value);
            }
        }
        other => *other = Value::Object(patch),
    }
    Ok(())
}

pub(crate) fn ensure_object(data: &Value) -> StoreResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::Backend("document data must be an object".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_fields() {
        let mut base = json!({"a": 1, "b": 2});
        merge_fields(&mut base, json!({"b": 3, "c": null})).unwrap();
        assert_eq!(base, json!({"a": 1, "b": 3, "c": null}));
        assert!(merge_fields(&mut base, json!(5)).is_err());
    }

    #[test]
    fn test_store_error_mapping() {
        let err: AppError = StoreError::FailedPrecondition("index shifts(employeeId)".into()).into();
        assert_eq!(err.code, ErrorCode::StoreIndexMissing);
        assert!(err.message.contains("database index"));

        let err: AppError = StoreError::Backend("disk full".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        let err: AppError = StoreError::NotFound {
            collection: "shifts".into(),
            id: "x".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_subscribe_pushes_after_write() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mut stream = subscribe(store.clone(), Query::collection("shifts"));

        let initial = stream.next().await.unwrap().unwrap();
        assert!(initial.is_empty());

        store.add("notifications", json!({"x": 1})).await.unwrap();
        store.add("shifts", json!({"employeeId": "e1"})).await.unwrap();

        let next = stream.next().await.unwrap().unwrap();
        assert_eq!(next.len(), 1);
    }
}
