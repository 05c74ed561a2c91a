// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capacity purchase repository.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    read_all_records, read_record, write_record, Database, POCKETS, PURCHASES,
};
use super::super::ownership::OwnershipEnforcer;
use super::super::{StorageError, StorageResult};
use super::pockets::StoredPocket;

/// Capacity package offered for purchase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum PackageType {
    #[serde(rename = "5")]
    Small,
    #[serde(rename = "13")]
    Medium,
    #[serde(rename = "30")]
    Large,
}

impl PackageType {
    /// Number of item slots granted.
    pub fn slots(self) -> u32 {
        match self {
            PackageType::Small => 5,
            PackageType::Medium => 13,
            PackageType::Large => 30,
        }
    }

    /// Price charged for the package.
    pub fn price(self) -> u32 {
        match self {
            PackageType::Small => 100,
            PackageType::Medium => 200,
            PackageType::Large => 350,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageType::Small => "5",
            PackageType::Medium => "13",
            PackageType::Large => "30",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown package type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPackage(pub String);

impl FromStr for PackageType {
    type Err = UnknownPackage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5" => Ok(PackageType::Small),
            "13" => Ok(PackageType::Medium),
            "30" => Ok(PackageType::Large),
            other => Err(UnknownPackage(other.to_string())),
        }
    }
}

/// Purchase record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredPurchase {
    pub id: String,
    pub user_id: String,
    pub pocket_id: String,
    pub package: PackageType,
    pub slots: u32,
    pub price: u32,
    pub purchased_at: DateTime<Utc>,
}

/// Repository for purchase operations.
pub struct PurchaseRepository<'a> {
    db: &'a Database,
}

impl<'a> PurchaseRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record a purchase and grow the pocket by the package's slots.
    ///
    /// Both writes share one transaction. Returns the purchase and the new
    /// pocket capacity.
    pub fn purchase(
        &self,
        user_id: &str,
        pocket_id: &str,
        package: PackageType,
    ) -> StorageResult<(StoredPurchase, u32)> {
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut pockets = write_txn.open_table(POCKETS)?;
            let mut pocket: StoredPocket = read_record(&pockets, pocket_id)?
                .ok_or_else(|| StorageError::NotFound(format!("Pocket {pocket_id}")))?;
            pocket.verify_owner_id(user_id)?;

            let purchase = StoredPurchase {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                pocket_id: pocket_id.to_string(),
                package,
                slots: package.slots(),
                price: package.price(),
                purchased_at: Utc::now(),
            };

            pocket.capacity = pocket.capacity.saturating_add(package.slots());
            write_record(&mut pockets, pocket_id, &pocket)?;

            let mut purchases = write_txn.open_table(PURCHASES)?;
            write_record(&mut purchases, &purchase.id, &purchase)?;

            (purchase, pocket.capacity)
        };
        write_txn.commit()?;

        tracing::info!(
            pocket_id = %pocket_id,
            package = %package,
            capacity = result.1,
            "Recorded capacity purchase"
        );
        Ok(result)
    }

    /// List purchases made for a pocket, oldest first.
    pub fn list_by_pocket(&self, pocket_id: &str) -> StorageResult<Vec<StoredPurchase>> {
        let read_txn = self.db.begin_read()?;
        let purchases = read_txn.open_table(PURCHASES)?;
        let mut all: Vec<StoredPurchase> = read_all_records(&purchases)?;
        all.retain(|p| p.pocket_id == pocket_id);
        all.sort_by(|a, b| a.purchased_at.cmp(&b.purchased_at));
        Ok(all)
    }
}
