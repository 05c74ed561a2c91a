// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    api::extract::{ApiJson, ApiQuery},
    audit_log,
    auth::UserOnly,
    error::ApiError,
    models::{
        AddItemRequest, CapacityResponse, CreatedResponse, ItemListResponse, ItemsQuery,
        RetrieveItemRequest,
    },
    state::AppState,
    storage::{AuditEventType, ItemRepository, PocketRepository, StoredItem},
};

/// Items stored in an owned pocket, in creation order.
#[utoipa::path(
    get,
    path = "/api/items",
    params(ItemsQuery),
    tag = "Items",
    responses(
        (status = 200, description = "Pocket items", body = ItemListResponse),
        (status = 400, description = "invalid"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn list_items(
    UserOnly(user): UserOnly,
    ApiQuery(query): ApiQuery<ItemsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    PocketRepository::new(state.db()).get_owned(&query.pocket_id, &user.user_id)?;
    let items = ItemRepository::new(state.db()).list_by_pocket(&query.pocket_id)?;
    Ok(Json(ItemListResponse { ok: true, items }))
}

/// Store an item in an owned pocket with free capacity.
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = AddItemRequest,
    tag = "Items",
    responses(
        (status = 200, description = "Item stored", body = CreatedResponse),
        (status = 400, description = "invalid | missing | full"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn add_item(
    UserOnly(user): UserOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddItemRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    // Ownership is reported before an empty name.
    PocketRepository::new(state.db()).get_owned(&request.pocket_id, &user.user_id)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::missing());
    }

    let item = StoredItem::new(request.pocket_id, name.to_string());
    ItemRepository::new(state.db()).add_within_capacity(&user.user_id, &item)?;

    audit_log!(
        state.db(),
        AuditEventType::ItemAdded,
        user.actor(),
        "item",
        item.id.clone()
    );

    Ok(Json(CreatedResponse {
        ok: true,
        id: item.id,
    }))
}

/// Give up one slot of an owned pocket.
///
/// Stored items are kept; only the capacity shrinks, and never below the
/// current item count.
#[utoipa::path(
    post,
    path = "/api/items/retrieve",
    request_body = RetrieveItemRequest,
    tag = "Items",
    responses(
        (status = 200, description = "Capacity reduced", body = CapacityResponse),
        (status = 400, description = "invalid | capacity"),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn retrieve_item(
    UserOnly(user): UserOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RetrieveItemRequest>,
) -> Result<Json<CapacityResponse>, ApiError> {
    let capacity = ItemRepository::new(state.db()).retrieve(&user.user_id, &request.pocket_id)?;

    audit_log!(
        state.db(),
        AuditEventType::ItemRetrieved,
        user.actor(),
        "pocket",
        request.pocket_id
    );

    Ok(Json(CapacityResponse { ok: true, capacity }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{seed_owned_pocket, seed_user};

    fn add_request(pocket_id: &str, name: &str) -> AddItemRequest {
        AddItemRequest {
            pocket_id: pocket_id.into(),
            name: name.into(),
        }
    }

    fn retrieve_request(pocket_id: &str) -> RetrieveItemRequest {
        RetrieveItemRequest {
            pocket_id: pocket_id.into(),
            item_id: None,
        }
    }

    #[tokio::test]
    async fn add_item_fills_up_to_capacity() {
        let state = AppState::default();
        let (u1, pocket) = seed_owned_pocket(&state, "u1", "C1");

        for i in 0..15 {
            add_item(
                UserOnly(u1.clone()),
                State(state.clone()),
                ApiJson(add_request(&pocket.id, &format!("item-{i}"))),
            )
            .await
            .expect("item fits");
        }

        let err = add_item(
            UserOnly(u1.clone()),
            State(state.clone()),
            ApiJson(add_request(&pocket.id, "one-too-many")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "full");

        let Json(listing) = list_items(
            UserOnly(u1),
            ApiQuery(ItemsQuery {
                pocket_id: pocket.id.clone(),
            }),
            State(state),
        )
        .await
        .unwrap();
        assert_eq!(listing.items.len(), 15);
        assert_eq!(listing.items[0].name, "item-0");
    }

    #[tokio::test]
    async fn add_item_rejects_foreign_pocket_and_empty_name() {
        let state = AppState::default();
        let (u1, pocket) = seed_owned_pocket(&state, "u1", "C1");
        let stranger = seed_user(&state, "u2");

        let err = add_item(
            UserOnly(stranger.clone()),
            State(state.clone()),
            ApiJson(add_request(&pocket.id, "x")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "invalid");

        let err = add_item(UserOnly(u1), State(state.clone()), ApiJson(add_request(&pocket.id, " ")))
            .await
            .unwrap_err();
        assert_eq!(err.message, "missing");

        let err = list_items(
            UserOnly(stranger),
            ApiQuery(ItemsQuery {
                pocket_id: pocket.id,
            }),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "invalid");
    }

    #[tokio::test]
    async fn retrieve_shrinks_capacity_but_keeps_items() {
        let state = AppState::default();
        let (u1, pocket) = seed_owned_pocket(&state, "u1", "C1");
        for name in ["a", "b"] {
            add_item(
                UserOnly(u1.clone()),
                State(state.clone()),
                ApiJson(add_request(&pocket.id, name)),
            )
            .await
            .unwrap();
        }

        let Json(response) = retrieve_item(
            UserOnly(u1.clone()),
            State(state.clone()),
            ApiJson(retrieve_request(&pocket.id)),
        )
        .await
        .unwrap();
        assert_eq!(response.capacity, 14);
        assert_eq!(
            ItemRepository::new(state.db())
                .count_by_pocket(&pocket.id)
                .unwrap(),
            2
        );

        // Shrink down to the item count, then one more fails.
        for expected in (2..14).rev() {
            let Json(response) = retrieve_item(
                UserOnly(u1.clone()),
                State(state.clone()),
                ApiJson(retrieve_request(&pocket.id)),
            )
            .await
            .unwrap();
            assert_eq!(response.capacity, expected);
        }

        let err = retrieve_item(UserOnly(u1), State(state), ApiJson(retrieve_request(&pocket.id)))
            .await
            .unwrap_err();
        assert_eq!(err.message, "capacity");
    }
}
