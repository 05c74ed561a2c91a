// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded pocket database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! Primary tables map a UUID (or session digest) to a JSON-serialized record:
//!
//! - `users`, `admins`, `pockets`, `bindings`, `items`, `purchases`,
//!   `email_verifications`, `sessions`
//!
//! Index tables enforce uniqueness and grouping at the application level:
//!
//! - `user_usernames`: username → user_id
//! - `user_emails`: email → user_id
//! - `admin_usernames`: username → admin_id
//! - `activation_codes`: activation code → pocket_id
//! - `pocket_items`: composite key (pocket_id|sequence_be|item_id) → item_id
//! - `audit_events`: composite key (timestamp_be|event_id) → serialized event
//!
//! Every compound check-then-mutate operation runs inside a single write
//! transaction, so invariants such as `item count <= capacity` hold under
//! concurrent requests.

use std::path::Path;

use redb::{
    backends::InMemoryBackend, ReadableDatabase, ReadableTable, Table, TableDefinition,
};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
pub(crate) const USER_USERNAMES: TableDefinition<&str, &str> =
    TableDefinition::new("user_usernames");
pub(crate) const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

pub(crate) const ADMINS: TableDefinition<&str, &[u8]> = TableDefinition::new("admins");
pub(crate) const ADMIN_USERNAMES: TableDefinition<&str, &str> =
    TableDefinition::new("admin_usernames");

pub(crate) const POCKETS: TableDefinition<&str, &[u8]> = TableDefinition::new("pockets");
pub(crate) const ACTIVATION_CODES: TableDefinition<&str, &str> =
    TableDefinition::new("activation_codes");

pub(crate) const BINDINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("bindings");

pub(crate) const ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("items");
pub(crate) const POCKET_ITEMS: TableDefinition<&[u8], &str> = TableDefinition::new("pocket_items");

pub(crate) const PURCHASES: TableDefinition<&str, &[u8]> = TableDefinition::new("purchases");

pub(crate) const EMAIL_VERIFICATIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("email_verifications");

pub(crate) const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

pub(crate) const AUDIT_EVENTS: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("audit_events");

/// Name of the database file inside the data directory.
pub const DATABASE_FILE: &str = "pocket.redb";

// =============================================================================
// Error Type
// =============================================================================

/// Error type for store operations.
///
/// Besides wrapping redb and serde failures, it carries the domain outcome of
/// compound transactions so handlers can map them to wire error codes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: user {user_id} cannot access {resource}")]
    PermissionDenied { user_id: String, resource: String },

    #[error("pocket {0} is assigned to another user")]
    AlreadyOwned(String),

    #[error("pocket {pocket_id} is full (capacity {capacity})")]
    PocketFull { pocket_id: String, capacity: u32 },

    #[error("pocket {pocket_id} cannot shrink below {items} items (capacity {capacity})")]
    CapacityUnderflow {
        pocket_id: String,
        capacity: u32,
        items: u64,
    },

    #[error("expired: {0}")]
    Expired(String),
}

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Record Helpers
// =============================================================================

/// Read and deserialize a JSON record from a primary table.
pub(crate) fn read_record<T, Tbl>(table: &Tbl, key: &str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Serialize a record as JSON and insert it into a primary table.
pub(crate) fn write_record<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let json = serde_json::to_vec(value)?;
    table.insert(key, json.as_slice())?;
    Ok(())
}

/// Deserialize every record of a primary table.
pub(crate) fn read_all_records<T, Tbl>(table: &Tbl) -> StorageResult<Vec<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(serde_json::from_slice(value.value())?);
    }
    Ok(records)
}

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID database holding every pocket table.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;
        Self::with_tables(db)
    }

    /// Create a database that lives only in memory (tests, ephemeral runs).
    pub fn in_memory() -> StorageResult<Self> {
        let db = redb::Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::with_tables(db)
    }

    /// Pre-create all tables so later read transactions don't fail.
    fn with_tables(db: redb::Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_USERNAMES)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(ADMINS)?;
            let _ = write_txn.open_table(ADMIN_USERNAMES)?;
            let _ = write_txn.open_table(POCKETS)?;
            let _ = write_txn.open_table(ACTIVATION_CODES)?;
            let _ = write_txn.open_table(BINDINGS)?;
            let _ = write_txn.open_table(ITEMS)?;
            let _ = write_txn.open_table(POCKET_ITEMS)?;
            let _ = write_txn.open_table(PURCHASES)?;
            let _ = write_txn.open_table(EMAIL_VERIFICATIONS)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(AUDIT_EVENTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_read(&self) -> StorageResult<redb::ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> StorageResult<redb::WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Verify the database answers a read transaction.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the pocket_items index.
///
/// Format: `pocket_id | sequence_be | item_id`, where `sequence` is the
/// item's position within its pocket, so a forward range scan returns a
/// pocket's items in insertion order.
pub(crate) fn make_item_key(pocket_id: &str, sequence: u64, item_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(pocket_id.len() + 1 + 8 + 1 + item_id.len());
    key.extend_from_slice(pocket_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&sequence.to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(item_id.as_bytes());
    key
}

/// Start of the range holding every index entry of a pocket.
pub(crate) fn make_pocket_prefix(pocket_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(pocket_id.len() + 1);
    prefix.extend_from_slice(pocket_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a pocket range scan (prefix with 0xFF bytes appended).
pub(crate) fn make_pocket_prefix_end(pocket_id: &str) -> Vec<u8> {
    let mut end = make_pocket_prefix(pocket_id);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_database_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(DATABASE_FILE);

        let db = Database::open(&path).expect("open database");
        db.health_check().expect("health check passes");
        assert!(path.exists());
    }

    #[test]
    fn in_memory_database_is_healthy() {
        let db = Database::in_memory().unwrap();
        db.health_check().unwrap();
    }

    #[test]
    fn record_helpers_round_trip_json() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Row {
            id: String,
            capacity: u32,
        }

        let db = Database::in_memory().unwrap();
        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(POCKETS).unwrap();
            write_record(
                &mut table,
                "p1",
                &Row {
                    id: "p1".into(),
                    capacity: 15,
                },
            )
            .unwrap();
        }
        write_txn.commit().unwrap();

        let read_txn = db.begin_read().unwrap();
        let table = read_txn.open_table(POCKETS).unwrap();
        let row: Option<Row> = read_record(&table, "p1").unwrap();
        assert_eq!(row.map(|r| r.capacity), Some(15));
        let missing: Option<Row> = read_record(&table, "p2").unwrap();
        assert!(missing.is_none());
        let all: Vec<Row> = read_all_records(&table).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn item_keys_sort_by_pocket_then_sequence() {
        let early = make_item_key("pocket-a", 1, "item-z");
        let late = make_item_key("pocket-a", 2, "item-a");
        assert!(early < late);

        let prefix = make_pocket_prefix("pocket-a");
        let end = make_pocket_prefix_end("pocket-a");
        assert!(early.as_slice() >= prefix.as_slice());
        assert!(late.as_slice() < end.as_slice());

        let other = make_item_key("pocket-b", 0, "item-a");
        assert!(other.as_slice() >= end.as_slice());
    }
}
