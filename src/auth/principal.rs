// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session principal and authenticated identity representations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity carried by a session.
///
/// A session holds exactly one principal. There is no role hierarchy: a
/// user principal never satisfies admin-gated endpoints and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    /// A registered end user.
    User { user_id: String },
    /// An administrator.
    Admin { admin_id: String },
}

impl Principal {
    pub fn user(user_id: impl Into<String>) -> Self {
        Principal::User {
            user_id: user_id.into(),
        }
    }

    pub fn admin(admin_id: impl Into<String>) -> Self {
        Principal::Admin {
            admin_id: admin_id.into(),
        }
    }

    /// Short label for logs and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            Principal::User { .. } => "user",
            Principal::Admin { .. } => "admin",
        }
    }

    /// ID of the user or admin behind this principal.
    pub fn subject_id(&self) -> &str {
        match self {
            Principal::User { user_id } => user_id,
            Principal::Admin { admin_id } => admin_id,
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.subject_id())
    }
}

/// Authenticated end user, resolved from a `Principal::User` session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Canonical user ID
    pub user_id: String,
    /// Digest of the session that authenticated this request
    pub session_digest: String,
}

impl AuthenticatedUser {
    /// Audit actor label (`user:<id>`).
    pub fn actor(&self) -> String {
        format!("user:{}", self.user_id)
    }
}

/// Authenticated administrator, resolved from a `Principal::Admin` session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAdmin {
    pub admin_id: String,
    pub username: String,
    /// Whether the admin still has to replace the bootstrap password
    pub must_rotate_password: bool,
}

impl AuthenticatedAdmin {
    /// Audit actor label (`admin:<id>`).
    pub fn actor(&self) -> String {
        format!("admin:{}", self.admin_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_serializes_as_tagged_variant() {
        let json = serde_json::to_value(Principal::user("u-1")).unwrap();
        assert_eq!(json["kind"], "user");
        assert_eq!(json["user_id"], "u-1");

        let back: Principal =
            serde_json::from_str(r#"{"kind":"admin","admin_id":"a-1"}"#).unwrap();
        assert_eq!(back, Principal::admin("a-1"));
    }

    #[test]
    fn display_includes_kind_and_subject() {
        assert_eq!(Principal::admin("a-9").to_string(), "admin:a-9");
        assert_eq!(Principal::user("u-9").subject_id(), "u-9");
    }

    #[test]
    fn actor_labels_match_principal_display() {
        let user = AuthenticatedUser {
            user_id: "u-1".into(),
            session_digest: "d".into(),
        };
        assert_eq!(user.actor(), Principal::user("u-1").to_string());

        let admin = AuthenticatedAdmin {
            admin_id: "a-1".into(),
            username: "root".into(),
            must_rotate_password: false,
        };
        assert_eq!(admin.actor(), Principal::admin("a-1").to_string());
    }
}
