//! SQLite-backed document store
//!
//! One `documents` table holds every collection. Document bodies are stored
//! as JSON text; queries load the collection and evaluate filters with
//! [`Query::apply`].

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;
use tokio::sync::broadcast;

use super::{
    ChangeEvent, DocumentStore, Query, StoreError, StoreResult, StoredDocument, WriteOp,
    ensure_object, merge_fields, new_document_id,
};

const CHANGE_CHANNEL_CAPACITY: usize = 1024;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, id)
)";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema
    pub async fn open(db_path: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| StoreError::Backend(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // busy_timeout: 写冲突时等待 5s 而非立即失败
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool (tests use `sqlite::memory:`)
    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { pool, changes })
    }

    fn notify(&self, ops: &[WriteOp]) {
        for op in ops {
            let _ = self.changes.send(op.change_event());
        }
    }
}

async fn load(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
) -> StoreResult<Option<Value>> {
    let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => {
            let text: String = row.try_get("data")?;
            Ok(Some(serde_json::from_str(&text)?))
        }
        None => Ok(None),
    }
}

async fn store(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
    data: &Value,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)
         ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
    )
    .bind(collection)
    .bind(id)
    .bind(serde_json::to_string(data)?)
    .bind(shared::util::now_millis())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Apply one write on an open connection (inside the caller's transaction)
async fn apply_op(conn: &mut SqliteConnection, op: &WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Set {
            collection,
            id,
            data,
            merge,
        } => {
            ensure_object(data)?;
            let body = match (merge, load(conn, collection, id).await?) {
                (true, Some(mut existing)) => {
                    merge_fields(&mut existing, data.clone())?;
                    existing
                }
                _ => data.clone(),
            };
            store(conn, collection, id, &body).await
        }
        WriteOp::Update {
            collection,
            id,
            data,
        } => {
            let mut existing =
                load(conn, collection, id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        collection: collection.clone(),
                        id: id.clone(),
                    })?;
            merge_fields(&mut existing, data.clone())?;
            store(conn, collection, id, &existing).await
        }
        WriteOp::Delete { collection, id } => {
            sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .execute(&mut *conn)
                .await?;
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        let mut conn = self.pool.acquire().await?;
        Ok(load(&mut conn, collection, id)
            .await?
            .map(|data| StoredDocument {
                id: id.to_string(),
                data,
            }))
    }

    async fn set(&self, collection: &str, id: &str, data: Value, merge: bool) -> StoreResult<()> {
        self.commit(vec![WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
            merge,
        }])
        .await
    }

    async fn add(&self, collection: &str, data: Value) -> StoreResult<String> {
        let id = new_document_id();
        self.set(collection, &id, data, false).await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.commit(vec![WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        }])
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.commit(vec![WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        }])
        .await
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = ?")
            .bind(&query.collection)
            .fetch_all(&self.pool)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let text: String = row.try_get("data")?;
            docs.push(StoredDocument {
                id,
                data: serde_json::from_str(&text)?,
            });
        }
        Ok(query.apply(docs))
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for op in &ops {
            // Dropping the transaction on error rolls it back
            apply_op(&mut tx, op).await?;
        }
        tx.commit().await?;
        self.notify(&ops);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
