// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! Every endpoint except login and password rotation requires an admin
//! session with no pending password rotation. They provide:
//! - Activation code management
//! - User and pocket overview
//! - Audit log queries

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::auth::session_headers;
use crate::{
    api::extract::{ApiJson, ApiQuery},
    audit_log,
    auth::{
        hash_password, normalize_username, verify_dummy, verify_password, AdminOnly,
        AdminSession, Principal, SessionToken,
    },
    error::ApiError,
    models::{
        ActivationCodeListResponse, AdminLoginRequest, AdminLoginResponse, AuditLogResponse,
        AuditQueryParams, CreateActivationCodeRequest, CreatedResponse, OkResponse,
        PocketOwnerListResponse, PocketWithOwner, RotatePasswordRequest, UserListResponse,
        UserSummary,
    },
    state::AppState,
    storage::{
        AdminRepository, AuditEvent, AuditEventType, AuditRepository, PocketRepository,
        StoredPocket, UserRepository, DEFAULT_POCKET_CAPACITY,
    },
};

/// Minimum length of a rotated admin password, in characters.
pub const MIN_ADMIN_PASSWORD_LEN: usize = 8;

const DEFAULT_AUDIT_LIMIT: usize = 100;
const MAX_AUDIT_LIMIT: usize = 1000;

// ============================================================================
// Session
// ============================================================================

/// Log in as an admin.
///
/// The response tells the client whether the password must be rotated
/// before any other admin endpoint can be used.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = AdminLoginRequest,
    tag = "Admin",
    responses(
        (status = 200, description = "Logged in; session cookie set", body = AdminLoginResponse),
        (status = 400, description = "missing | invalid")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    SessionToken(previous): SessionToken,
    ApiJson(request): ApiJson<AdminLoginRequest>,
) -> Result<(HeaderMap, Json<AdminLoginResponse>), ApiError> {
    let username = normalize_username(&request.username);
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::missing());
    }

    let admin = AdminRepository::new(state.db()).find_by_username(&username)?;
    let verified = match &admin {
        Some(admin) => verify_password(&request.password, &admin.password_hash)?,
        None => verify_dummy(&request.password)?,
    };
    let admin = match admin {
        Some(admin) if verified => admin,
        _ => {
            let event = AuditEvent::new(AuditEventType::AdminLoginFailure)
                .with_details(serde_json::json!({ "username": username }))
                .failed();
            audit_log!(state.db(), event = event);
            tracing::warn!(username = %username, "Admin login failed");
            return Err(ApiError::invalid());
        }
    };

    let token = state.sessions.establish(
        state.db(),
        Principal::admin(admin.id.clone()),
        previous.as_deref(),
    )?;

    audit_log!(
        state.db(),
        AuditEventType::AdminLoginSuccess,
        format!("admin:{}", admin.id)
    );
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok((
        session_headers(&state, &token)?,
        Json(AdminLoginResponse {
            ok: true,
            must_rotate_password: admin.must_rotate_password,
        }),
    ))
}

/// Replace the admin's password.
///
/// Allowed while a rotation is pending; clears the rotation flag.
#[utoipa::path(
    post,
    path = "/api/admin/password",
    request_body = RotatePasswordRequest,
    tag = "Admin",
    responses(
        (status = 200, description = "Password rotated", body = OkResponse),
        (status = 400, description = "invalid"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn rotate_password(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RotatePasswordRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let repo = AdminRepository::new(state.db());
    let stored = repo.get(&admin.admin_id)?;

    if !verify_password(&request.current_password, &stored.password_hash)? {
        return Err(ApiError::invalid());
    }
    if request.new_password.chars().count() < MIN_ADMIN_PASSWORD_LEN
        || request.new_password == request.current_password
    {
        return Err(ApiError::invalid());
    }

    repo.rotate_password(&admin.admin_id, hash_password(&request.new_password)?)?;

    audit_log!(state.db(), AuditEventType::AdminPasswordRotated, admin.actor());
    tracing::info!(admin_id = %admin.admin_id, "Admin password rotated");

    Ok(Json(OkResponse::ok()))
}

// ============================================================================
// Activation Codes
// ============================================================================

/// List every activation code, including revoked ones.
#[utoipa::path(
    get,
    path = "/api/admin/activation-codes",
    tag = "Admin",
    responses(
        (status = 200, description = "All pockets", body = ActivationCodeListResponse),
        (status = 401, description = "unauthorized | rotation_required")
    )
)]
pub async fn list_activation_codes(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<ActivationCodeListResponse>, ApiError> {
    let codes = PocketRepository::new(state.db()).list_all()?;
    Ok(Json(ActivationCodeListResponse { ok: true, codes }))
}

/// Create a pocket with a new activation code.
#[utoipa::path(
    post,
    path = "/api/admin/activation-codes",
    request_body = CreateActivationCodeRequest,
    tag = "Admin",
    responses(
        (status = 200, description = "Pocket created", body = CreatedResponse),
        (status = 400, description = "missing | exists"),
        (status = 401, description = "unauthorized | rotation_required")
    )
)]
pub async fn create_activation_code(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateActivationCodeRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let code = request.activation_code.trim();
    if code.is_empty() || request.activation_password.is_empty() {
        return Err(ApiError::missing());
    }
    let capacity = request
        .capacity
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_POCKET_CAPACITY);

    let pocket = StoredPocket::new(
        code.to_string(),
        request.activation_password.clone(),
        capacity,
    );
    PocketRepository::new(state.db()).create(&pocket)?;

    audit_log!(
        state.db(),
        AuditEventType::ActivationCodeCreated,
        admin.actor(),
        "pocket",
        pocket.id.clone()
    );

    Ok(Json(CreatedResponse {
        ok: true,
        id: pocket.id,
    }))
}

/// Revoke an activation code.
///
/// The pocket stays in listings; it can no longer be activated.
#[utoipa::path(
    delete,
    path = "/api/admin/activation-codes/{id}",
    params(("id" = String, Path, description = "Pocket ID")),
    tag = "Admin",
    responses(
        (status = 200, description = "Code revoked", body = OkResponse),
        (status = 400, description = "invalid"),
        (status = 401, description = "unauthorized | rotation_required")
    )
)]
pub async fn delete_activation_code(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    PocketRepository::new(state.db()).soft_delete(&id)?;

    audit_log!(
        state.db(),
        AuditEventType::ActivationCodeDeleted,
        admin.actor(),
        "pocket",
        id
    );
    Ok(Json(OkResponse::ok()))
}

// ============================================================================
// Overview
// ============================================================================

/// List every user.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users", body = UserListResponse),
        (status = 401, description = "unauthorized | rotation_required")
    )
)]
pub async fn list_users(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = UserRepository::new(state.db())
        .list_all()?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(Json(UserListResponse { ok: true, users }))
}

/// List every pocket with its owner's username.
#[utoipa::path(
    get,
    path = "/api/admin/pockets",
    tag = "Admin",
    responses(
        (status = 200, description = "Pockets with owners", body = PocketOwnerListResponse),
        (status = 401, description = "unauthorized | rotation_required")
    )
)]
pub async fn list_pockets_with_owner(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<PocketOwnerListResponse>, ApiError> {
    let users: std::collections::HashMap<String, String> = UserRepository::new(state.db())
        .list_all()?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let pockets = PocketRepository::new(state.db())
        .list_all()?
        .into_iter()
        .map(|p| {
            let username = p
                .assigned_user_id
                .as_ref()
                .and_then(|id| users.get(id))
                .cloned();
            PocketWithOwner {
                id: p.id,
                activation_code: p.activation_code,
                capacity: p.capacity,
                assigned_user_id: p.assigned_user_id,
                username,
            }
        })
        .collect();

    Ok(Json(PocketOwnerListResponse { ok: true, pockets }))
}

/// Most recent audit events, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/audit",
    params(AuditQueryParams),
    tag = "Admin",
    responses(
        (status = 200, description = "Audit events", body = AuditLogResponse),
        (status = 401, description = "unauthorized | rotation_required")
    )
)]
pub async fn list_audit_events(
    AdminOnly(_admin): AdminOnly,
    ApiQuery(params): ApiQuery<AuditQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);
    let events = AuditRepository::new(state.db()).recent(limit)?;
    Ok(Json(AuditLogResponse { ok: true, events }))
}
