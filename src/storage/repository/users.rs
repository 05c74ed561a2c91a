// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are stored in the `users` table; `user_usernames` and `user_emails`
//! index tables enforce uniqueness of usernames and emails.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{
    read_all_records, read_record, write_record, Database, EMAIL_VERIFICATIONS, USERS,
    USER_EMAILS, USER_USERNAMES,
};
use super::super::{StorageError, StorageResult};
use super::verifications::StoredVerification;

/// Registered user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Unique, NFKC-normalized username
    pub username: String,
    /// Unique, lower-cased email address
    pub email: String,
    /// Argon2id PHC hash (never exposed via API)
    pub password_hash: String,
    /// Whether the email address has been verified
    pub verified_email: bool,
    /// When the user registered
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// Build a new, unverified user.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            verified_email: false,
            created_at: Utc::now(),
        }
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new user.
    ///
    /// Fails with `AlreadyExists` if the username or email is taken.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        self.insert(user, None)
    }

    /// Insert a new user together with its first email verification code.
    pub fn create_with_verification(
        &self,
        user: &StoredUser,
        verification: &StoredVerification,
    ) -> StorageResult<()> {
        self.insert(user, Some(verification))
    }

    fn insert(
        &self,
        user: &StoredUser,
        verification: Option<&StoredVerification>,
    ) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut usernames = write_txn.open_table(USER_USERNAMES)?;
            let mut emails = write_txn.open_table(USER_EMAILS)?;

            if usernames.get(user.username.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "User with username {}",
                    user.username
                )));
            }
            if emails.get(user.email.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "User with email {}",
                    user.email
                )));
            }

            usernames.insert(user.username.as_str(), user.id.as_str())?;
            emails.insert(user.email.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            write_record(&mut users, &user.id, user)?;

            if let Some(verification) = verification {
                let mut verifications = write_txn.open_table(EMAIL_VERIFICATIONS)?;
                write_record(&mut verifications, &verification.id, verification)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        read_record(&users, user_id)?
            .ok_or_else(|| StorageError::NotFound(format!("User {user_id}")))
    }

    /// Find a user by username.
    pub fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let usernames = read_txn.open_table(USER_USERNAMES)?;
        let user_id = match usernames.get(username)? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS)?;
        read_record(&users, &user_id)
    }

    /// Find a user by email.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let user_id = match emails.get(email)? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS)?;
        read_record(&users, &user_id)
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        let found = users.get(user_id)?.is_some();
        Ok(found)
    }

    /// List all users (admin view), oldest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        let mut all: Vec<StoredUser> = read_all_records(&users)?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}
