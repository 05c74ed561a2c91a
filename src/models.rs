// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize` or `Deserialize` together with
//! `ToSchema` for JSON handling and OpenAPI documentation.
//!
//! ## Field Naming
//!
//! Activation code bodies use `activation_code`, `activation_password` and
//! `capacity`; every other request field is camelCase (`pocketId`,
//! `packageType`, `fullName`, ...). Record listings keep the stored field
//! names.
//!
//! ## Envelope
//!
//! Every success response carries `"ok": true`; lists are wrapped in a named
//! field (`{"ok": true, "items": [...]}`).
//!
//! Request fields default to empty so that absent fields surface as the
//! `missing`/`invalid` domain errors instead of a deserialization failure.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::storage::{AuditEvent, StoredItem, StoredPocket, StoredPurchase, StoredUser};

// =============================================================================
// Hong Kong Identity Card Number
// =============================================================================

static HKID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,2}[0-9]{6}\([0-9A]\)$").expect("HKID pattern is valid")
});

/// Hong Kong identity card number, e.g. `A123456(7)`.
///
/// Only the format is checked; the check digit is not verified.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
pub struct Hkid(pub String);

impl Hkid {
    pub fn is_valid(&self) -> bool {
        HKID_PATTERN.is_match(&self.0)
    }
}

impl std::fmt::Display for Hkid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Hkid {
    fn from(value: &str) -> Self {
        Hkid(value.to_string())
    }
}

// =============================================================================
// Generic Responses
// =============================================================================

/// Plain success response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Success response carrying the ID of a created record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreatedResponse {
    pub ok: bool,
    pub id: String,
}

/// Success response carrying a pocket's new capacity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CapacityResponse {
    pub ok: bool,
    pub capacity: u32,
}

// =============================================================================
// Account Models
// =============================================================================

/// Registration request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Registration response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub ok: bool,
    pub user_id: String,
}

/// Email verification request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct VerifyEmailRequest {
    pub email: String,
    /// Six-digit code sent by email
    pub code: String,
}

/// User login request. `email` takes precedence over `username`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Current session principal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub ok: bool,
    /// `user` or `admin`
    pub kind: String,
    pub id: String,
    pub username: String,
    /// Users only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Users only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_email: Option<bool>,
    /// Admins only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_rotate_password: Option<bool>,
}

// =============================================================================
// Admin Models
// =============================================================================

/// Admin login request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Admin login response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub ok: bool,
    /// The admin must call `/api/admin/password` before anything else
    pub must_rotate_password: bool,
}

/// Admin password rotation request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RotatePasswordRequest {
    pub current_password: String,
    /// At least 8 characters, different from the current password
    pub new_password: String,
}

/// Activation code creation request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct CreateActivationCodeRequest {
    pub activation_code: String,
    pub activation_password: String,
    /// Initial capacity; absent or zero means 15
    pub capacity: Option<u32>,
}

/// Every pocket, including soft-deleted ones.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivationCodeListResponse {
    pub ok: bool,
    pub codes: Vec<StoredPocket>,
}

/// User as shown to admins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub verified_email: bool,
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for UserSummary {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            verified_email: user.verified_email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub ok: bool,
    pub users: Vec<UserSummary>,
}

/// Pocket with its owner's username.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PocketWithOwner {
    pub id: String,
    pub activation_code: String,
    pub capacity: u32,
    pub assigned_user_id: Option<String>,
    /// `None` when unassigned or the owner no longer exists
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PocketOwnerListResponse {
    pub ok: bool,
    pub pockets: Vec<PocketWithOwner>,
}

/// Query parameters for audit log reads.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
pub struct AuditQueryParams {
    /// Maximum number of events (default 100, max 1000).
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditLogResponse {
    pub ok: bool,
    /// Newest first
    pub events: Vec<AuditEvent>,
}

// =============================================================================
// Pocket Models
// =============================================================================

/// Pocket activation request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct ActivatePocketRequest {
    pub activation_code: String,
    pub activation_password: String,
}

/// Pocket activation response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivatePocketResponse {
    pub ok: bool,
    pub pocket_id: String,
    pub capacity: u32,
}

/// Request naming a pocket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PocketRequest {
    pub pocket_id: String,
}

/// Capacity purchase request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub pocket_id: String,
    /// `"5"`, `"13"` or `"30"`
    pub package_type: String,
}

/// Identity binding request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct BindIdentityRequest {
    pub pocket_id: String,
    pub ip: String,
    pub full_name: String,
    pub hkid: Hkid,
}

/// A pocket assigned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MyPocket {
    pub id: String,
    pub activation_code: String,
    pub capacity: u32,
    pub item_count: u64,
    pub binding_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyPocketsResponse {
    pub ok: bool,
    pub pockets: Vec<MyPocket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseListResponse {
    pub ok: bool,
    pub purchases: Vec<StoredPurchase>,
}

// =============================================================================
// Item Models
// =============================================================================

/// Query parameters for item listing.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[serde(default, rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct ItemsQuery {
    pub pocket_id: String,
}

/// Item creation request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AddItemRequest {
    pub pocket_id: String,
    pub name: String,
}

/// Item retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrieveItemRequest {
    pub pocket_id: String,
    /// Accepted for client compatibility; retrieval acts on capacity only
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub ok: bool,
    pub items: Vec<StoredItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hkid_format() {
        assert!(Hkid::from("A123456(7)").is_valid());
        assert!(Hkid::from("AB123456(A)").is_valid());
        assert!(!Hkid::from("123456(7)").is_valid());
        assert!(!Hkid::from("a123456(7)").is_valid());
        assert!(!Hkid::from("ABC123456(7)").is_valid());
        assert!(!Hkid::from("A123456(B)").is_valid());
        assert!(!Hkid::from("A1234567").is_valid());
        assert!(!Hkid::default().is_valid());
    }

    #[test]
    fn request_field_names_follow_client() {
        let bind: BindIdentityRequest = serde_json::from_value(serde_json::json!({
            "pocketId": "p1",
            "ip": "10.0.0.1",
            "fullName": "Chan Tai Man",
            "hkid": "A123456(7)"
        }))
        .unwrap();
        assert_eq!(bind.pocket_id, "p1");
        assert_eq!(bind.full_name, "Chan Tai Man");
        assert_eq!(bind.hkid, Hkid::from("A123456(7)"));

        let code: CreateActivationCodeRequest = serde_json::from_value(serde_json::json!({
            "activation_code": "C1",
            "activation_password": "PW1",
            "capacity": null
        }))
        .unwrap();
        assert_eq!(code.activation_code, "C1");
        assert!(code.capacity.is_none());
    }

    #[test]
    fn absent_fields_default_to_empty() {
        let register: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(register.username.is_empty());

        let retrieve: RetrieveItemRequest =
            serde_json::from_str(r#"{"pocketId":"p1"}"#).unwrap();
        assert!(retrieve.item_id.is_none());
    }

    #[test]
    fn responses_use_client_field_names() {
        let json = serde_json::to_value(ActivatePocketResponse {
            ok: true,
            pocket_id: "p1".into(),
            capacity: 15,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "ok": true, "pocketId": "p1", "capacity": 15 })
        );

        let json = serde_json::to_value(RegisterResponse {
            ok: true,
            user_id: "u1".into(),
        })
        .unwrap();
        assert_eq!(json["userId"], "u1");
    }
}
