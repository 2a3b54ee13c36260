//! In-process document store

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;

use super::{
    ChangeEvent, ChangeKind, DocumentStore, Query, StoreError, StoreResult, StoredDocument,
    WriteOp, ensure_object, merge_fields, new_document_id,
};

type Collections = HashMap<String, BTreeMap<String, Value>>;

const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Collections held in a single lock; a batch is applied to a scratch copy
/// of the touched collections and swapped in only when every op succeeded.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            collections: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, collection: &str, id: &str, kind: ChangeKind) {
        // No receivers is fine
        let _ = self.changes.send(ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_op(collections: &mut Collections, op: &WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Set {
            collection,
            id,
            data,
            merge,
        } => {
            ensure_object(data)?;
            let docs = collections.entry(collection.clone()).or_default();
            match docs.get_mut(id) {
                Some(existing) if *merge => merge_fields(existing, data.clone())?,
                _ => {
                    docs.insert(id.clone(), data.clone());
                }
            }
        }
        WriteOp::Update {
            collection,
            id,
            data,
        } => {
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.clone(),
                    id: id.clone(),
                })?;
            merge_fields(existing, data.clone())?;
        }
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = collections.get_mut(collection) {
                docs.remove(id);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| StoredDocument {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, data: Value, merge: bool) -> StoreResult<()> {
        let op = WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
            merge,
        };
        apply_op(&mut self.collections.write(), &op)?;
        self.notify(collection, id, ChangeKind::Set);
        Ok(())
    }

    async fn add(&self, collection: &str, data: Value) -> StoreResult<String> {
        let id = new_document_id();
        self.set(collection, &id, data, false).await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        let op = WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        };
        apply_op(&mut self.collections.write(), &op)?;
        self.notify(collection, id, ChangeKind::Update);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let op = WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        apply_op(&mut self.collections.write(), &op)?;
        self.notify(collection, id, ChangeKind::Delete);
        Ok(())
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let snapshot: Vec<StoredDocument> = {
            let collections = self.collections.read();
            collections
                .get(&query.collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, data)| StoredDocument {
                            id: id.clone(),
                            data: data.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(query.apply(snapshot))
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        {
            let mut collections = self.collections.write();
            let mut scratch: Collections = HashMap::new();
            for op in &ops {
                let name = op.collection();
                if !scratch.contains_key(name) {
                    let current = collections.get(name).cloned().unwrap_or_default();
                    scratch.insert(name.to_string(), current);
                }
                apply_op(&mut scratch, op)?;
            }
            for (name, docs) in scratch {
                collections.insert(name, docs);
            }
        }
        for op in &ops {
            let _ = self.changes.send(op.change_event());
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_merge() {
        let store = MemoryStore::new();
        store
            .set("users", "u1", json!({"name": "Ana", "role": "cashier"}), false)
            .await
            .unwrap();
        store
            .set("users", "u1", json!({"role": "manager"}), true)
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"name": "Ana", "role": "manager"}));

        store
            .set("users", "u1", json!({"name": "Bea"}), false)
            .await
            .unwrap();
        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"name": "Bea"}));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("shifts", "nope", json!({"status": "completed"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .set("roleRequests", "u1", json!({"status": "pending"}), false)
            .await
            .unwrap();

        let ops = vec![
            WriteOp::Update {
                collection: "roleRequests".into(),
                id: "u1".into(),
                data: json!({"status": "approved"}),
            },
            // fails: document does not exist
            WriteOp::Update {
                collection: "roleElevations".into(),
                id: "u1".into(),
                data: json!({"temporaryRole": "manager"}),
            },
        ];
        assert!(store.commit(ops).await.is_err());

        let request = store.get("roleRequests", "u1").await.unwrap().unwrap();
        assert_eq!(request.data["status"], "pending");
        assert!(store.get("roleElevations", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_notifies() {
        let store = MemoryStore::new();
        let mut rx = store.changes();
        let id = store.add("breaks", json!({"status": "active"})).await.unwrap();
        assert!(!id.is_empty());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, "breaks");
        assert_eq!(event.id, id);
        assert_eq!(event.kind, ChangeKind::Set);
    }

    #[tokio::test]
    async fn test_rejects_non_object_documents() {
        let store = MemoryStore::new();
        assert!(store.set("x", "1", json!([1, 2]), false).await.is_err());
    }
}
