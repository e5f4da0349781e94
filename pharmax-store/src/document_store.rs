//! SQLite-backed document store
//!
//! One generic table holds every collection:
//!   documents(collection, id, value, unique_key, created_at, deleted)
//!
//! Documents are stored as JSON text. Field filters use json_extract, so a
//! collection never needs its own schema. Uniqueness (patient email, malady
//! name) rides on a partial unique index over (collection, unique_key)
//! restricted to non-deleted rows, which makes duplicate detection an insert
//! outcome rather than a racy pre-check.

use crate::error::{Result, StoreError};
use rusqlite::{params, Connection, ErrorCode, Transaction};
use serde_json::Value;
use std::ops::Deref;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed document store shared by all request handlers.
pub struct DocumentStore {
    conn: Mutex<Connection>,
}

/// Equality filter on a top-level field of the stored JSON value.
#[derive(Debug, Clone, Copy)]
pub struct FieldFilter<'a> {
    pub field: &'a str,
    pub value: &'a str,
}

#[allow(clippy::result_large_err)]
impl DocumentStore {
    /// Open the store (create if not exists)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for read-write concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                value TEXT NOT NULL,
                unique_key TEXT,
                created_at TEXT NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;

        // Uniqueness applies only to live rows; a soft-deleted patient frees
        // its email for reuse.
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_unique_key
             ON documents(collection, unique_key)
             WHERE unique_key IS NOT NULL AND deleted = 0",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection
             ON documents(collection, deleted, created_at)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a document. `unique_key` carries the collection's uniqueness
    /// constraint (normalized email, malady name); pass `None` when the
    /// collection has none.
    pub fn insert(
        &self,
        collection: &str,
        id: &str,
        unique_key: Option<&str>,
        created_at: &str,
        doc: &Value,
    ) -> Result<()> {
        let value = serde_json::to_string(doc)?;
        let conn = self.conn.lock().unwrap();

        let result = conn.execute(
            "INSERT INTO documents (collection, id, value, unique_key, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![collection, id, value, unique_key, created_at],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate {
                    collection: collection.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a document by id, excluding soft-deleted rows.
    pub fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT value FROM documents WHERE collection = ? AND id = ? AND deleted = 0",
        )?;
        let result = stmt.query_row(params![collection, id], |row| row.get::<_, String>(0));

        match result {
            Ok(value) => Ok(Some(serde_json::from_str(&value)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List non-deleted documents, newest first, optionally filtered by a
    /// field-equality condition on the JSON value.
    pub fn find_many(&self, collection: &str, filter: Option<FieldFilter<'_>>) -> Result<Vec<Value>> {
        let conn = self.conn.lock().unwrap();

        let mut docs = Vec::new();

        if let Some(f) = filter {
            let mut stmt = conn.prepare(
                "SELECT value FROM documents
                 WHERE collection = ? AND deleted = 0
                   AND json_extract(value, '$.' || ?) = ?
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows =
                stmt.query_map(params![collection, f.field, f.value], |row| {
                    row.get::<_, String>(0)
                })?;
            for row in rows {
                docs.push(serde_json::from_str(&row?)?);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT value FROM documents
                 WHERE collection = ? AND deleted = 0
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;
            for row in rows {
                docs.push(serde_json::from_str(&row?)?);
            }
        }

        Ok(docs)
    }

    /// Soft-delete a document. Returns false when no live document matched.
    pub fn soft_delete(&self, collection: &str, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        soft_delete_on(&conn, collection, id)
    }

    /// Soft-delete every live document whose `field` equals `value`.
    /// Returns the number of documents marked.
    pub fn soft_delete_where(&self, collection: &str, field: &str, value: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        soft_delete_where_on(&conn, collection, field, value)
    }

    /// Non-deleted document counts per collection.
    pub fn count_by_collection(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT collection, COUNT(*) FROM documents
             WHERE deleted = 0 GROUP BY collection ORDER BY collection",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Connectivity probe for the health endpoint.
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Execute multiple operations atomically within an SQLite transaction
    pub fn in_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&TransactionOps<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let ops = TransactionOps { tx: &tx };
        let result = f(&ops)?;
        tx.commit()?;
        Ok(result)
    }
}

/// Operations available within a transaction
pub struct TransactionOps<'a> {
    tx: &'a Transaction<'a>,
}

#[allow(clippy::result_large_err)]
impl<'a> TransactionOps<'a> {
    /// Soft-delete a document. Returns false when no live document matched.
    pub fn soft_delete(&self, collection: &str, id: &str) -> Result<bool> {
        soft_delete_on(self.tx.deref(), collection, id)
    }

    /// Soft-delete every live document whose `field` equals `value`.
    pub fn soft_delete_where(&self, collection: &str, field: &str, value: &str) -> Result<usize> {
        soft_delete_where_on(self.tx.deref(), collection, field, value)
    }
}

// The deleted column drives the queries; isDeleted inside the JSON value is
// kept in sync so the stored document stays self-describing.
fn soft_delete_on(conn: &Connection, collection: &str, id: &str) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE documents
         SET deleted = 1, value = json_set(value, '$.isDeleted', json('true'))
         WHERE collection = ? AND id = ? AND deleted = 0",
        params![collection, id],
    )?;
    Ok(rows > 0)
}

fn soft_delete_where_on(
    conn: &Connection,
    collection: &str,
    field: &str,
    value: &str,
) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE documents
         SET deleted = 1, value = json_set(value, '$.isDeleted', json('true'))
         WHERE collection = ? AND deleted = 0
           AND json_extract(value, '$.' || ?) = ?",
        params![collection, field, value],
    )?;
    Ok(rows)
}
