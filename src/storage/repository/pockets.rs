// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pocket repository.
//!
//! A pocket is created by an admin together with its activation code and
//! password, assigned to a user on activation, and soft-deleted when the
//! code is revoked. The `activation_codes` index keeps codes unique across
//! live and soft-deleted pockets.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    read_all_records, read_record, write_record, Database, ACTIVATION_CODES, POCKETS,
};
use super::super::ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
use super::super::{StorageError, StorageResult};

/// Capacity given to new pockets when the admin does not specify one.
pub const DEFAULT_POCKET_CAPACITY: u32 = 15;

/// Pocket record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredPocket {
    pub id: String,
    /// Unique activation code
    pub activation_code: String,
    /// Password paired with the activation code
    pub activation_password: String,
    /// Maximum number of items the pocket may hold
    pub capacity: u32,
    /// User the pocket is currently assigned to
    pub assigned_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the activation code is revoked
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoredPocket {
    pub fn new(activation_code: String, activation_password: String, capacity: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            activation_code,
            activation_password,
            capacity,
            assigned_user_id: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl OwnedResource for StoredPocket {
    fn owner_user_id(&self) -> Option<&str> {
        self.assigned_user_id.as_deref()
    }

    fn resource_label(&self) -> String {
        format!("pocket {}", self.id)
    }
}

/// Repository for pocket operations.
pub struct PocketRepository<'a> {
    db: &'a Database,
}

impl<'a> PocketRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a pocket. Fails with `AlreadyExists` if the code was ever used.
    pub fn create(&self, pocket: &StoredPocket) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut codes = write_txn.open_table(ACTIVATION_CODES)?;
            if codes.get(pocket.activation_code.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Activation code {}",
                    pocket.activation_code
                )));
            }
            codes.insert(pocket.activation_code.as_str(), pocket.id.as_str())?;

            let mut pockets = write_txn.open_table(POCKETS)?;
            write_record(&mut pockets, &pocket.id, pocket)?;
        }
        write_txn.commit()?;

        tracing::info!(
            pocket_id = %pocket.id,
            capacity = pocket.capacity,
            "Created pocket"
        );
        Ok(())
    }

    /// Get a pocket by ID.
    pub fn get(&self, pocket_id: &str) -> StorageResult<StoredPocket> {
        let read_txn = self.db.begin_read()?;
        let pockets = read_txn.open_table(POCKETS)?;
        read_record(&pockets, pocket_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Pocket {pocket_id}")))
    }

    /// Get a pocket assigned to the given user.
    ///
    /// Missing and foreign pockets both fail; callers map either to the same
    /// wire error.
    pub fn get_owned(&self, pocket_id: &str, user_id: &str) -> StorageResult<StoredPocket> {
        self.get(pocket_id).verify_owner(user_id)
    }

    /// Assign a live pocket to `user_id` by its code and password.
    ///
    /// - `NotFound` if no live pocket matches the code/password pair
    /// - `AlreadyOwned` if it is assigned to another user
    ///
    /// Re-activation by the current owner succeeds without changes.
    pub fn activate(
        &self,
        activation_code: &str,
        activation_password: &str,
        user_id: &str,
    ) -> StorageResult<StoredPocket> {
        let write_txn = self.db.begin_write()?;
        let pocket = {
            let codes = write_txn.open_table(ACTIVATION_CODES)?;
            let pocket_id = match codes.get(activation_code)? {
                Some(id) => id.value().to_string(),
                None => {
                    return Err(StorageError::NotFound(format!(
                        "Activation code {activation_code}"
                    )))
                }
            };

            let mut pockets = write_txn.open_table(POCKETS)?;
            let mut pocket: StoredPocket = read_record(&pockets, &pocket_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Pocket {pocket_id}")))?;

            if pocket.is_deleted() || pocket.activation_password != activation_password {
                return Err(StorageError::NotFound(format!(
                    "Activation code {activation_code}"
                )));
            }

            match pocket.assigned_user_id.as_deref() {
                Some(owner) if owner != user_id => {
                    return Err(StorageError::AlreadyOwned(pocket.id));
                }
                Some(_) => {}
                None => {
                    pocket.assigned_user_id = Some(user_id.to_string());
                    write_record(&mut pockets, &pocket.id, &pocket)?;
                }
            }
            pocket
        };
        write_txn.commit()?;
        Ok(pocket)
    }

    /// Clear the assignment of a pocket owned by `user_id`.
    pub fn unbind(&self, pocket_id: &str, user_id: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut pockets = write_txn.open_table(POCKETS)?;
            let mut pocket: StoredPocket = read_record(&pockets, pocket_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Pocket {pocket_id}")))?;
            pocket.verify_owner_id(user_id)?;

            pocket.assigned_user_id = None;
            write_record(&mut pockets, pocket_id, &pocket)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Mark a pocket's activation code as revoked.
    ///
    /// Deleting twice keeps the first deletion time.
    pub fn soft_delete(&self, pocket_id: &str) -> StorageResult<StoredPocket> {
        let write_txn = self.db.begin_write()?;
        let pocket = {
            let mut pockets = write_txn.open_table(POCKETS)?;
            let mut pocket: StoredPocket = read_record(&pockets, pocket_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Pocket {pocket_id}")))?;
            if pocket.deleted_at.is_none() {
                pocket.deleted_at = Some(Utc::now());
                write_record(&mut pockets, pocket_id, &pocket)?;
            }
            pocket
        };
        write_txn.commit()?;
        Ok(pocket)
    }

    /// List every pocket, including soft-deleted ones, oldest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredPocket>> {
        let read_txn = self.db.begin_read()?;
        let pockets = read_txn.open_table(POCKETS)?;
        let mut all: Vec<StoredPocket> = read_all_records(&pockets)?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    /// List the live pockets assigned to a user.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<StoredPocket>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|p| !p.is_deleted() && p.assigned_user_id.as_deref() == Some(user_id))
            .collect())
    }
}
