// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin repository.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};

use super::super::database::{read_record, write_record, Database, ADMINS, ADMIN_USERNAMES};
use super::super::{StorageError, StorageResult};

/// Administrator record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAdmin {
    pub id: String,
    pub username: String,
    /// Argon2id PHC hash
    pub password_hash: String,
    /// Set for bootstrapped admins until the first password change
    pub must_rotate_password: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredAdmin {
    pub fn new(username: String, password_hash: String, must_rotate_password: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash,
            must_rotate_password,
            created_at: Utc::now(),
        }
    }
}

/// Repository for admin operations.
pub struct AdminRepository<'a> {
    db: &'a Database,
}

impl<'a> AdminRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new admin. Fails with `AlreadyExists` on a duplicate username.
    pub fn create(&self, admin: &StoredAdmin) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut usernames = write_txn.open_table(ADMIN_USERNAMES)?;
            if usernames.get(admin.username.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Admin {}",
                    admin.username
                )));
            }
            usernames.insert(admin.username.as_str(), admin.id.as_str())?;

            let mut admins = write_txn.open_table(ADMINS)?;
            write_record(&mut admins, &admin.id, admin)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Create the given admin only if the admins table is empty.
    ///
    /// Returns `true` when the admin was created.
    pub fn bootstrap(&self, admin: &StoredAdmin) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        {
            let mut admins = write_txn.open_table(ADMINS)?;
            if !admins.is_empty()? {
                return Ok(false);
            }
            write_record(&mut admins, &admin.id, admin)?;

            let mut usernames = write_txn.open_table(ADMIN_USERNAMES)?;
            usernames.insert(admin.username.as_str(), admin.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    /// Get an admin by ID.
    pub fn get(&self, admin_id: &str) -> StorageResult<StoredAdmin> {
        let read_txn = self.db.begin_read()?;
        let admins = read_txn.open_table(ADMINS)?;
        read_record(&admins, admin_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Admin {admin_id}")))
    }

    /// Find an admin by username.
    pub fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredAdmin>> {
        let read_txn = self.db.begin_read()?;
        let usernames = read_txn.open_table(ADMIN_USERNAMES)?;
        let admin_id = match usernames.get(username)? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };
        let admins = read_txn.open_table(ADMINS)?;
        read_record(&admins, &admin_id)
    }

    /// Whether any admin exists.
    pub fn any(&self) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let admins = read_txn.open_table(ADMINS)?;
        Ok(!admins.is_empty()?)
    }

    /// Replace the password hash and clear the rotation flag.
    pub fn rotate_password(&self, admin_id: &str, new_hash: String) -> StorageResult<StoredAdmin> {
        let write_txn = self.db.begin_write()?;
        let admin = {
            let mut admins = write_txn.open_table(ADMINS)?;
            let mut admin: StoredAdmin = read_record(&admins, admin_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Admin {admin_id}")))?;
            admin.password_hash = new_hash;
            admin.must_rotate_password = false;
            write_record(&mut admins, admin_id, &admin)?;
            admin
        };
        write_txn.commit()?;
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_only_when_empty() {
        let db = Database::in_memory().unwrap();
        let repo = AdminRepository::new(&db);
        assert!(!repo.any().unwrap());

        let first = StoredAdmin::new("root".into(), "h1".into(), true);
        assert!(repo.bootstrap(&first).unwrap());
        assert!(repo.any().unwrap());

        let second = StoredAdmin::new("other".into(), "h2".into(), true);
        assert!(!repo.bootstrap(&second).unwrap());
        assert!(repo.find_by_username("other").unwrap().is_none());
        assert_eq!(repo.find_by_username("root").unwrap(), Some(first));
    }

    #[test]
    fn duplicate_admin_username_rejected() {
        let db = Database::in_memory().unwrap();
        let repo = AdminRepository::new(&db);
        repo.create(&StoredAdmin::new("root".into(), "h".into(), false))
            .unwrap();
        let dup = repo.create(&StoredAdmin::new("root".into(), "h".into(), false));
        assert!(matches!(dup, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn rotate_password_clears_flag() {
        let db = Database::in_memory().unwrap();
        let repo = AdminRepository::new(&db);
        let admin = StoredAdmin::new("root".into(), "old".into(), true);
        repo.create(&admin).unwrap();

        let rotated = repo.rotate_password(&admin.id, "new".into()).unwrap();
        assert!(!rotated.must_rotate_password);
        assert_eq!(repo.get(&admin.id).unwrap().password_hash, "new");

        assert!(matches!(
            repo.rotate_password("missing", "x".into()),
            Err(StorageError::NotFound(_))
        ));
    }
}
