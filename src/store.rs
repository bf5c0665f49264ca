//! Persistent product store.
//!
//! The rest of the service only sees the [`RecordStore`] trait; the SQLite
//! implementation lives behind it so tests can substitute an in-memory store.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::models::Product;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Storage seam used by the reconciler and the CRUD surface.
///
/// Every call is one committed operation; there is no batch transaction
/// spanning calls. A reconciliation cycle aborted partway leaves earlier
/// upserts committed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Product>, StoreError>;

    /// Rows ordered by id, paginated.
    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Product>, StoreError>;

    /// Fails if the id already exists.
    async fn insert(&self, product: Product) -> Result<(), StoreError>;

    /// Overwrites name/description/price for an existing id.
    async fn update(&self, product: Product) -> Result<(), StoreError>;

    /// Returns false when no row had the id.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// SQLite-backed store. A single connection guarded by a mutex: each
/// operation acquires the handle on the blocking pool, commits, releases.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS products (
                 id INTEGER PRIMARY KEY,
                 name TEXT NOT NULL,
                 description TEXT NOT NULL,
                 price INTEGER NOT NULL
             );",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            op(&conn)
        })
        .await?
        .map_err(StoreError::from)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, id: i64) -> Result<Option<Product>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, name, description, price FROM products WHERE id = ?1",
                params![id],
                row_to_product,
            )
            .optional()
        })
        .await
    }

    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Product>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, price FROM products
                 ORDER BY id LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt.query_map(params![limit, offset], row_to_product)?;
            rows.collect()
        })
        .await
    }

    async fn insert(&self, product: Product) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, price) VALUES (?1, ?2, ?3, ?4)",
                params![product.id, product.name, product.description, product.price],
            )
            .map(|_| ())
        })
        .await
    }

    async fn update(&self, product: Product) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE products SET name = ?2, description = ?3, price = ?4 WHERE id = ?1",
                params![product.id, product.name, product.description, product.price],
            )
            .map(|_| ())
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM products WHERE id = ?1", params![id])
                .map(|n| n > 0)
        })
        .await
    }
}

fn row_to_product(row: &rusqlite::Row<'_>) -> Result<Product, rusqlite::Error> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
    })
}
