// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in a single embedded redb database file
//! (`<DATA_DIR>/pocket.redb`). See [`database`] for the table layout.
//!
//! ## Layers
//!
//! - [`database`]: table definitions, the `Database` handle and `StorageError`
//! - [`repository`]: one repository per entity
//! - [`ownership`]: pocket ownership checks shared by repositories
//! - [`audit`]: append-only audit log
//!
//! Passwords are stored only as Argon2id hashes and session tokens only as
//! HMAC digests.

pub mod audit;
pub mod database;
pub mod ownership;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use database::{Database, StorageError, StorageResult, DATABASE_FILE};
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
pub use repository::{
    AdminRepository, BindingRepository, ItemRepository, PackageType, PocketRepository,
    PurchaseRepository, SessionRepository, StoredAdmin, StoredBinding, StoredItem, StoredPocket,
    StoredPurchase, StoredSession, StoredUser, StoredVerification, UserRepository,
    VerificationRepository, DEFAULT_POCKET_CAPACITY, VERIFICATION_CODE_TTL,
};
