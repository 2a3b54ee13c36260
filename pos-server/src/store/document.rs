//! Typed document access
//!
//! Models keep their id in an optional `id` field. It is filled from the
//! document key on read and stripped from the body on write.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use shared::models::{
    AttendanceRecord, BreakRecord, Notification, RoleElevationRecord, RoleRequest, Shift,
    UserProfile,
};

use super::{DocumentStore, Query, StoreResult, StoredDocument, WriteOp};

/// Collection names
pub mod collections {
    pub const USERS: &str = "users";
    pub const ROLE_ELEVATIONS: &str = "roleElevations";
    pub const ROLE_REQUESTS: &str = "roleRequests";
    pub const SHIFTS: &str = "shifts";
    pub const ATTENDANCE: &str = "attendance";
    pub const BREAKS: &str = "breaks";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// A model persisted in one collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn set_id(&mut self, id: String);
}

macro_rules! impl_document {
    ($($ty:ty => $collection:expr),* $(,)?) => {
        $(
            impl Document for $ty {
                const COLLECTION: &'static str = $collection;

                fn set_id(&mut self, id: String) {
                    self.id = Some(id);
                }
            }
        )*
    };
}

impl_document! {
    UserProfile => collections::USERS,
    RoleElevationRecord => collections::ROLE_ELEVATIONS,
    RoleRequest => collections::ROLE_REQUESTS,
    Shift => collections::SHIFTS,
    AttendanceRecord => collections::ATTENDANCE,
    BreakRecord => collections::BREAKS,
    Notification => collections::NOTIFICATIONS,
}

/// Serialize a model into a document body (without `id`)
pub fn to_body<T: Document>(doc: &T) -> StoreResult<Value> {
    let mut value = serde_json::to_value(doc)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    Ok(value)
}

pub fn from_stored<T: Document>(stored: StoredDocument) -> StoreResult<T> {
    let mut doc: T = serde_json::from_value(stored.data)?;
    doc.set_id(stored.id);
    Ok(doc)
}

pub async fn fetch<T: Document>(store: &dyn DocumentStore, id: &str) -> StoreResult<Option<T>> {
    store
        .get(T::COLLECTION, id)
        .await?
        .map(from_stored)
        .transpose()
}

/// Overwrite the document keyed by `id`
pub async fn put<T: Document>(store: &dyn DocumentStore, id: &str, doc: &T) -> StoreResult<()> {
    store.set(T::COLLECTION, id, to_body(doc)?, false).await
}

/// Insert with a store-assigned id, returning it
pub async fn insert<T: Document>(store: &dyn DocumentStore, doc: &T) -> StoreResult<String> {
    store.add(T::COLLECTION, to_body(doc)?).await
}

/// Merge a partial body into an existing document
pub async fn patch<T: Document>(store: &dyn DocumentStore, id: &str, fields: Value) -> StoreResult<()> {
    store.update(T::COLLECTION, id, fields).await
}

pub async fn remove<T: Document>(store: &dyn DocumentStore, id: &str) -> StoreResult<()> {
    store.delete(T::COLLECTION, id).await
}

pub async fn find<T: Document>(store: &dyn DocumentStore, query: &Query) -> StoreResult<Vec<T>> {
    store
        .query(query)
        .await?
        .into_iter()
        .map(from_stored)
        .collect()
}

/// Batch op overwriting the document keyed by `id`
pub fn put_op<T: Document>(id: &str, doc: &T) -> StoreResult<WriteOp> {
    Ok(WriteOp::Set {
        collection: T::COLLECTION.to_string(),
        id: id.to_string(),
        data: to_body(doc)?,
        merge: false,
    })
}

/// Batch op merging fields into an existing document
pub fn patch_op<T: Document>(id: &str, fields: Value) -> WriteOp {
    WriteOp::Update {
        collection: T::COLLECTION.to_string(),
        id: id.to_string(),
        data: fields,
    }
}
