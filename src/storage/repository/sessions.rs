// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session repository.
//!
//! Sessions are keyed by the HMAC digest of the token handed to the client;
//! the raw token is never persisted.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{read_all_records, read_record, write_record, Database, SESSIONS};
use super::super::StorageResult;
use crate::auth::Principal;

/// Server-side session record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    /// HMAC-SHA256 digest of the session token (hex)
    pub token_digest: String,
    pub principal: Principal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Repository for session operations.
pub struct SessionRepository<'a> {
    db: &'a Database,
}

impl<'a> SessionRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, session: &StoredSession) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            write_record(&mut table, &session.token_digest, session)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, token_digest: &str) -> StorageResult<Option<StoredSession>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        read_record(&table, token_digest)
    }

    /// Delete a session. Returns whether it existed.
    pub fn revoke(&self, token_digest: &str) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let removed = table.remove(token_digest)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Delete every session expired at `now`. Returns the number removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let all: Vec<StoredSession> = read_all_records(&table)?;
            let mut removed = 0;
            for session in all.iter().filter(|s| s.is_expired(now)) {
                if table.remove(session.token_digest.as_str())?.is_some() {
                    removed += 1;
                }
            }
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Number of stored sessions, expired or not.
    pub fn count(&self) -> StorageResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}
