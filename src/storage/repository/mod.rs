// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the pocket database.
//!
//! Each repository provides the operations for one entity type. Operations
//! that check and mutate more than one record run in a single redb write
//! transaction.

pub mod admins;
pub mod bindings;
pub mod items;
pub mod pockets;
pub mod purchases;
pub mod sessions;
pub mod users;
pub mod verifications;

pub use admins::{AdminRepository, StoredAdmin};
pub use bindings::{BindingRepository, StoredBinding};
pub use items::{ItemRepository, StoredItem};
pub use pockets::{PocketRepository, StoredPocket, DEFAULT_POCKET_CAPACITY};
pub use purchases::{PackageType, PurchaseRepository, StoredPurchase, UnknownPackage};
pub use sessions::{SessionRepository, StoredSession};
pub use users::{StoredUser, UserRepository};
pub use verifications::{StoredVerification, VerificationRepository, VERIFICATION_CODE_TTL};
