// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pocket endpoints for users: activation, release and capacity purchases.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::extract::ApiJson,
    audit_log,
    auth::UserOnly,
    error::ApiError,
    models::{
        ActivatePocketRequest, ActivatePocketResponse, CapacityResponse, MyPocket,
        MyPocketsResponse, OkResponse, PocketRequest, PurchaseListResponse, PurchaseRequest,
    },
    state::AppState,
    storage::{
        AuditEvent, AuditEventType, BindingRepository, ItemRepository,
        PackageType, PocketRepository, PurchaseRepository,
    },
};

/// Pockets assigned to the caller.
#[utoipa::path(
    get,
    path = "/api/pockets",
    tag = "Pockets",
    responses(
        (status = 200, description = "Caller's pockets", body = MyPocketsResponse),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn list_my_pockets(
    UserOnly(user): UserOnly,
    State(state): State<AppState>,
) -> Result<Json<MyPocketsResponse>, ApiError> {
    let items = ItemRepository::new(state.db());
    let bindings = BindingRepository::new(state.db());

    let pockets = PocketRepository::new(state.db())
        .list_by_owner(&user.user_id)?
        .into_iter()
        .map(|p| {
            Ok(MyPocket {
                item_count: items.count_by_pocket(&p.id)?,
                binding_count: bindings.list_by_pocket(&p.id)?.len(),
                id: p.id,
                activation_code: p.activation_code,
                capacity: p.capacity,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(MyPocketsResponse { ok: true, pockets }))
}

/// Claim a pocket with its activation code and password.
#[utoipa::path(
    post,
    path = "/api/pockets/activate",
    request_body = ActivatePocketRequest,
    tag = "Pockets",
    responses(
        (status = 200, description = "Pocket assigned to caller", body = ActivatePocketResponse),
        (status = 400, description = "invalid | owned"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn activate_pocket(
    UserOnly(user): UserOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ActivatePocketRequest>,
) -> Result<Json<ActivatePocketResponse>, ApiError> {
    let code = request.activation_code.trim();
    if code.is_empty() || request.activation_password.is_empty() {
        return Err(ApiError::invalid());
    }

    let pocket = match PocketRepository::new(state.db()).activate(
        code,
        &request.activation_password,
        &user.user_id,
    ) {
        Ok(pocket) => pocket,
        Err(e) => {
            let event = AuditEvent::new(AuditEventType::PocketActivated)
                .with_actor(user.actor())
                .with_details(serde_json::json!({ "activation_code": code }))
                .failed();
            audit_log!(state.db(), event = event);
            return Err(e.into());
        }
    };

    audit_log!(
        state.db(),
        AuditEventType::PocketActivated,
        user.actor(),
        "pocket",
        pocket.id.clone()
    );
    tracing::info!(pocket_id = %pocket.id, user_id = %user.user_id, "Pocket activated");

    Ok(Json(ActivatePocketResponse {
        ok: true,
        pocket_id: pocket.id,
        capacity: pocket.capacity,
    }))
}

/// Release a pocket owned by the caller.
#[utoipa::path(
    post,
    path = "/api/pockets/unbind",
    request_body = PocketRequest,
    tag = "Pockets",
    responses(
        (status = 200, description = "Pocket released", body = OkResponse),
        (status = 400, description = "invalid"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn unbind_pocket(
    UserOnly(user): UserOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PocketRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    PocketRepository::new(state.db()).unbind(&request.pocket_id, &user.user_id)?;

    audit_log!(
        state.db(),
        AuditEventType::PocketUnbound,
        user.actor(),
        "pocket",
        request.pocket_id
    );
    Ok(Json(OkResponse::ok()))
}

/// Buy extra capacity for an owned pocket.
///
/// Each call is a separate purchase.
#[utoipa::path(
    post,
    path = "/api/pockets/purchase",
    request_body = PurchaseRequest,
    tag = "Pockets",
    responses(
        (status = 200, description = "Capacity granted", body = CapacityResponse),
        (status = 400, description = "invalid"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn purchase(
    UserOnly(user): UserOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PurchaseRequest>,
) -> Result<Json<CapacityResponse>, ApiError> {
    let package: PackageType = request
        .package_type
        .parse()
        .map_err(|_| ApiError::invalid())?;

    let (record, capacity) =
        PurchaseRepository::new(state.db()).purchase(&user.user_id, &request.pocket_id, package)?;

    let event = AuditEvent::new(AuditEventType::CapacityPurchased)
        .with_actor(user.actor())
        .with_resource("pocket", request.pocket_id)
        .with_details(serde_json::json!({
            "purchase_id": record.id,
            "package": package.as_str(),
            "price": record.price,
        }));
    audit_log!(state.db(), event = event);

    Ok(Json(CapacityResponse { ok: true, capacity }))
}

/// Purchase history of an owned pocket.
#[utoipa::path(
    get,
    path = "/api/pockets/{id}/purchases",
    params(("id" = String, Path, description = "Pocket ID")),
    tag = "Pockets",
    responses(
        (status = 200, description = "Purchases, oldest first", body = PurchaseListResponse),
        (status = 400, description = "invalid"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn list_my_purchases(
    UserOnly(user): UserOnly,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PurchaseListResponse>, ApiError> {
    PocketRepository::new(state.db()).get_owned(&id, &user.user_id)?;
    let purchases = PurchaseRepository::new(state.db()).list_by_pocket(&id)?;
    Ok(Json(PurchaseListResponse {
        ok: true,
        purchases,
    }))
}
