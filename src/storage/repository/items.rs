// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Item repository.
//!
//! Items live in the `items` table and are grouped per pocket through the
//! `pocket_items` index, whose composite key orders them by creation time.
//! Capacity checks and the mutation they guard always share one write
//! transaction, so `item count <= capacity` holds under concurrency.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    make_item_key, make_pocket_prefix, make_pocket_prefix_end, read_record, write_record,
    Database, ITEMS, POCKETS, POCKET_ITEMS,
};
use super::super::ownership::OwnershipEnforcer;
use super::super::{StorageError, StorageResult};
use super::pockets::StoredPocket;

/// Item stored in a pocket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredItem {
    pub id: String,
    pub pocket_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl StoredItem {
    pub fn new(pocket_id: String, name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pocket_id,
            name,
            created_at: Utc::now(),
        }
    }
}

/// Count index entries of a pocket within any readable view of `pocket_items`.
fn count_in<T>(index: &T, pocket_id: &str) -> StorageResult<u64>
where
    T: ReadableTable<&'static [u8], &'static str>,
{
    let start = make_pocket_prefix(pocket_id);
    let end = make_pocket_prefix_end(pocket_id);
    let mut count = 0u64;
    for entry in index.range(start.as_slice()..end.as_slice())? {
        entry?;
        count += 1;
    }
    Ok(count)
}

/// Repository for item operations.
pub struct ItemRepository<'a> {
    db: &'a Database,
}

impl<'a> ItemRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert an item into a pocket owned by `user_id`.
    ///
    /// Fails with `PocketFull` when the pocket already holds `capacity` items.
    pub fn add_within_capacity(&self, user_id: &str, item: &StoredItem) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let pockets = write_txn.open_table(POCKETS)?;
            let pocket: StoredPocket = read_record(&pockets, &item.pocket_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Pocket {}", item.pocket_id)))?;
            pocket.verify_owner_id(user_id)?;

            let mut index = write_txn.open_table(POCKET_ITEMS)?;
            let count = count_in(&index, &pocket.id)?;
            if count >= u64::from(pocket.capacity) {
                return Err(StorageError::PocketFull {
                    pocket_id: pocket.id,
                    capacity: pocket.capacity,
                });
            }

            // Items are never removed, so the count is the next position.
            let key = make_item_key(&item.pocket_id, count, &item.id);
            index.insert(key.as_slice(), item.id.as_str())?;

            let mut items = write_txn.open_table(ITEMS)?;
            write_record(&mut items, &item.id, item)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Shrink the capacity of a pocket owned by `user_id` by one slot.
    ///
    /// The stored items are left untouched. Fails with `CapacityUnderflow`
    /// when the reduced capacity would fall below the current item count.
    /// Returns the new capacity.
    pub fn retrieve(&self, user_id: &str, pocket_id: &str) -> StorageResult<u32> {
        let write_txn = self.db.begin_write()?;
        let capacity = {
            let mut pockets = write_txn.open_table(POCKETS)?;
            let mut pocket: StoredPocket = read_record(&pockets, pocket_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Pocket {pocket_id}")))?;
            pocket.verify_owner_id(user_id)?;

            let index = write_txn.open_table(POCKET_ITEMS)?;
            let count = count_in(&index, pocket_id)?;

            let new_capacity = match pocket.capacity.checked_sub(1) {
                Some(cap) if u64::from(cap) >= count => cap,
                _ => {
                    return Err(StorageError::CapacityUnderflow {
                        pocket_id: pocket.id,
                        capacity: pocket.capacity,
                        items: count,
                    })
                }
            };

            pocket.capacity = new_capacity;
            write_record(&mut pockets, pocket_id, &pocket)?;
            new_capacity
        };
        write_txn.commit()?;
        Ok(capacity)
    }

    /// List a pocket's items in creation order.
    pub fn list_by_pocket(&self, pocket_id: &str) -> StorageResult<Vec<StoredItem>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(POCKET_ITEMS)?;
        let items = read_txn.open_table(ITEMS)?;

        let start = make_pocket_prefix(pocket_id);
        let end = make_pocket_prefix_end(pocket_id);

        let mut result = Vec::new();
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_, item_id) = entry?;
            if let Some(item) = read_record(&items, item_id.value())? {
                result.push(item);
            }
        }
        Ok(result)
    }

    /// Number of items stored in a pocket.
    pub fn count_by_pocket(&self, pocket_id: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(POCKET_ITEMS)?;
        count_in(&index, pocket_id)
    }
}
