// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity binding repository.
//!
//! Bindings are an append-only log of IP/identity records attached to an
//! owned pocket. Duplicates are allowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    read_all_records, read_record, write_record, Database, BINDINGS, POCKETS,
};
use super::super::ownership::OwnershipEnforcer;
use super::super::{StorageError, StorageResult};
use super::pockets::StoredPocket;

/// Binding record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredBinding {
    pub id: String,
    pub user_id: String,
    pub pocket_id: String,
    pub ip_address: String,
    pub full_name: String,
    /// Hong Kong identity card number
    pub hkid: String,
    pub bound_at: DateTime<Utc>,
}

impl StoredBinding {
    pub fn new(
        user_id: String,
        pocket_id: String,
        ip_address: String,
        full_name: String,
        hkid: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            pocket_id,
            ip_address,
            full_name,
            hkid,
            bound_at: Utc::now(),
        }
    }
}

/// Repository for binding operations.
pub struct BindingRepository<'a> {
    db: &'a Database,
}

impl<'a> BindingRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a binding to a pocket owned by `binding.user_id`.
    pub fn bind(&self, binding: &StoredBinding) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let pockets = write_txn.open_table(POCKETS)?;
            let pocket: StoredPocket = read_record(&pockets, &binding.pocket_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Pocket {}", binding.pocket_id)))?;
            pocket.verify_owner_id(&binding.user_id)?;

            let mut bindings = write_txn.open_table(BINDINGS)?;
            write_record(&mut bindings, &binding.id, binding)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// List bindings recorded for a pocket, oldest first.
    pub fn list_by_pocket(&self, pocket_id: &str) -> StorageResult<Vec<StoredBinding>> {
        let read_txn = self.db.begin_read()?;
        let bindings = read_txn.open_table(BINDINGS)?;
        let mut all: Vec<StoredBinding> = read_all_records(&bindings)?;
        all.retain(|b| b.pocket_id == pocket_id);
        all.sort_by(|a, b| a.bound_at.cmp(&b.bound_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::super::pockets::PocketRepository;
    use super::*;

    fn binding(user_id: &str, pocket_id: &str) -> StoredBinding {
        StoredBinding::new(
            user_id.into(),
            pocket_id.into(),
            "10.0.0.1".into(),
            "Chan Tai Man".into(),
            "A123456(7)".into(),
        )
    }

    #[test]
    fn bind_appends_without_uniqueness() {
        let db = Database::in_memory().unwrap();
        let pocket = StoredPocket::new("C1".into(), "PW1".into(), 15);
        let pockets = PocketRepository::new(&db);
        pockets.create(&pocket).unwrap();
        pockets.activate("C1", "PW1", "u1").unwrap();

        let repo = BindingRepository::new(&db);
        repo.bind(&binding("u1", &pocket.id)).unwrap();
        repo.bind(&binding("u1", &pocket.id)).unwrap();
        assert_eq!(repo.list_by_pocket(&pocket.id).unwrap().len(), 2);
    }

    #[test]
    fn bind_rejects_non_owner_and_unknown_pocket() {
        let db = Database::in_memory().unwrap();
        let pocket = StoredPocket::new("C1".into(), "PW1".into(), 15);
        PocketRepository::new(&db).create(&pocket).unwrap();

        let repo = BindingRepository::new(&db);
        assert!(matches!(
            repo.bind(&binding("u1", &pocket.id)),
            Err(StorageError::PermissionDenied { .. })
        ));
        assert!(matches!(
            repo.bind(&binding("u1", "missing")),
            Err(StorageError::NotFound(_))
        ));
        assert!(repo.list_by_pocket(&pocket.id).unwrap().is_empty());
    }
}
