// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for pocket-scoped operations.
//!
//! Every item, binding and purchase operation must pass through an ownership
//! check against the pocket's assigned user.

use crate::auth::AuthenticatedUser;

use super::{StorageError, StorageResult};

/// Trait for resources that may be assigned to a user.
pub trait OwnedResource {
    /// Get the assigned user's ID, if any.
    fn owner_user_id(&self) -> Option<&str>;

    /// Label used in permission errors.
    fn resource_label(&self) -> String;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user owns this resource.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` if the resource is unassigned
    /// or assigned to someone else.
    fn verify_owner_id(&self, user_id: &str) -> StorageResult<()>;

    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        self.verify_owner_id(&user.user_id)
    }
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_owner_id(&self, user_id: &str) -> StorageResult<()> {
        if self.owner_user_id() == Some(user_id) {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: user_id.to_string(),
                resource: self.resource_label(),
            })
        }
    }
}

/// Extension trait for ownership verification on lookups.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    fn verify_owner(self, user_id: &str) -> StorageResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for StorageResult<T> {
    fn verify_owner(self, user_id: &str) -> StorageResult<T> {
        let resource = self?;
        resource.verify_owner_id(user_id)?;
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: Option<String>,
    }

    impl OwnedResource for TestResource {
        fn owner_user_id(&self) -> Option<&str> {
            self.owner.as_deref()
        }

        fn resource_label(&self) -> String {
            "test resource".to_string()
        }
    }

    fn make_user(user_id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            session_digest: "digest".to_string(),
        }
    }

    #[test]
    fn ownership_verification_passes_for_owner() {
        let resource = TestResource {
            owner: Some("user_123".to_string()),
        };
        assert!(resource.verify_ownership(&make_user("user_123")).is_ok());
    }

    #[test]
    fn ownership_verification_fails_for_non_owner() {
        let resource = TestResource {
            owner: Some("user_123".to_string()),
        };
        let result = resource.verify_ownership(&make_user("user_456"));
        assert!(matches!(result, Err(StorageError::PermissionDenied { .. })));
    }

    #[test]
    fn unassigned_resource_has_no_owner() {
        let resource = TestResource { owner: None };
        let result = resource.verify_owner_id("user_123");
        assert!(matches!(result, Err(StorageError::PermissionDenied { .. })));
    }

    #[test]
    fn ownership_check_on_result() {
        let ok: StorageResult<TestResource> = Ok(TestResource {
            owner: Some("user_123".to_string()),
        });
        assert!(ok.verify_owner("user_123").is_ok());

        let missing: StorageResult<TestResource> =
            Err(StorageError::NotFound("Pocket p1".to_string()));
        assert!(matches!(
            missing.verify_owner("user_123"),
            Err(StorageError::NotFound(_))
        ));
    }
}
