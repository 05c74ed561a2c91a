// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! First-admin bootstrap.
//!
//! The first admin is created from an externally supplied credential and
//! must replace its password on first login.

use crate::auth::{hash_password, normalize_username, AuthError};
use crate::config::AdminBootstrap;
use crate::storage::{AdminRepository, Database, StorageError, StoredAdmin};

/// Outcome of [`ensure_admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// An admin already existed; nothing was done
    AlreadyPresent,
    /// The bootstrap admin was created
    Created,
    /// No admin exists and no credential was configured
    NotConfigured,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create the bootstrap admin if no admin exists yet.
pub fn ensure_admin(
    db: &Database,
    credential: Option<&AdminBootstrap>,
) -> Result<BootstrapOutcome, BootstrapError> {
    let repo = AdminRepository::new(db);
    if repo.any()? {
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    let Some(credential) = credential else {
        tracing::warn!(
            "No admin account exists and ADMIN_BOOTSTRAP_USERNAME/ADMIN_BOOTSTRAP_PASSWORD are not set"
        );
        return Ok(BootstrapOutcome::NotConfigured);
    };

    let admin = StoredAdmin::new(
        normalize_username(&credential.username),
        hash_password(&credential.password)?,
        true,
    );
    if repo.bootstrap(&admin)? {
        tracing::info!(
            admin_id = %admin.id,
            username = %admin.username,
            "Bootstrapped admin account; password rotation required on first login"
        );
        Ok(BootstrapOutcome::Created)
    } else {
        Ok(BootstrapOutcome::AlreadyPresent)
    }
}
