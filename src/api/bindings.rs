// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    api::extract::ApiJson,
    audit_log,
    auth::UserOnly,
    error::ApiError,
    models::{BindIdentityRequest, CreatedResponse},
    state::AppState,
    storage::{AuditEventType, BindingRepository, StoredBinding},
};

/// Record the caller's identity against an owned pocket.
///
/// The HKID format is checked before ownership. Repeated bindings are
/// appended, never deduplicated.
#[utoipa::path(
    post,
    path = "/api/bind-ip",
    request_body = BindIdentityRequest,
    tag = "Pockets",
    responses(
        (status = 200, description = "Binding recorded", body = CreatedResponse),
        (status = 400, description = "invalid_hkid | invalid"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn bind_identity(
    UserOnly(user): UserOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BindIdentityRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    if !request.hkid.is_valid() {
        return Err(ApiError::invalid_hkid());
    }

    let binding = StoredBinding::new(
        user.user_id.clone(),
        request.pocket_id,
        request.ip,
        request.full_name,
        request.hkid.0,
    );
    BindingRepository::new(state.db()).bind(&binding)?;

    audit_log!(
        state.db(),
        AuditEventType::IdentityBound,
        user.actor(),
        "pocket",
        binding.pocket_id.clone()
    );

    Ok(Json(CreatedResponse {
        ok: true,
        id: binding.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{seed_owned_pocket, seed_user};
    use crate::models::Hkid;

    fn request(pocket_id: &str, hkid: &str) -> BindIdentityRequest {
        BindIdentityRequest {
            pocket_id: pocket_id.into(),
            ip: "10.0.0.1".into(),
            full_name: "Chan Tai Man".into(),
            hkid: Hkid::from(hkid),
        }
    }

    #[tokio::test]
    async fn bind_identity_appends_bindings() {
        let state = AppState::default();
        let (u1, pocket) = seed_owned_pocket(&state, "u1", "C1");

        for _ in 0..2 {
            bind_identity(
                UserOnly(u1.clone()),
                State(state.clone()),
                ApiJson(request(&pocket.id, "A123456(7)")),
            )
            .await
            .expect("binding succeeds");
        }

        let bindings = BindingRepository::new(state.db())
            .list_by_pocket(&pocket.id)
            .unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].hkid, "A123456(7)");
        assert_eq!(bindings[0].ip_address, "10.0.0.1");
    }

    #[tokio::test]
    async fn hkid_is_checked_before_ownership() {
        let state = AppState::default();
        let (_, pocket) = seed_owned_pocket(&state, "u1", "C1");
        let stranger = seed_user(&state, "u2");

        let err = bind_identity(
            UserOnly(stranger.clone()),
            State(state.clone()),
            ApiJson(request(&pocket.id, "123")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "invalid_hkid");

        let err = bind_identity(
            UserOnly(stranger),
            State(state.clone()),
            ApiJson(request(&pocket.id, "A123456(7)")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "invalid");
    }
}
