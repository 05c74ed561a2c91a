// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{
        header::{InvalidHeaderValue, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Principal,
    models::{
        ActivatePocketRequest, ActivatePocketResponse, ActivationCodeListResponse,
        AddItemRequest, AdminLoginRequest, AdminLoginResponse, AuditLogResponse,
        BindIdentityRequest, CapacityResponse, CreateActivationCodeRequest, CreatedResponse, Hkid,
        ItemListResponse, LoginRequest, MeResponse, MyPocket, MyPocketsResponse, OkResponse,
        PocketOwnerListResponse, PocketRequest, PocketWithOwner, PurchaseListResponse,
        PurchaseRequest, RegisterRequest, RegisterResponse, RetrieveItemRequest,
        RotatePasswordRequest, UserListResponse, UserSummary, VerifyEmailRequest,
    },
    state::AppState,
    storage::{AuditEvent, AuditEventType, PackageType, StoredItem, StoredPocket, StoredPurchase},
};

pub mod admin;
pub mod auth;
pub mod bindings;
pub mod extract;
pub mod health;
pub mod items;
pub mod pockets;

/// Header carrying the per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/admin/login", post(admin::admin_login))
        .route("/admin/password", post(admin::rotate_password))
        .route(
            "/admin/activation-codes",
            get(admin::list_activation_codes).post(admin::create_activation_code),
        )
        .route(
            "/admin/activation-codes/{id}",
            delete(admin::delete_activation_code),
        )
        .route("/admin/users", get(admin::list_users))
        .route("/admin/pockets", get(admin::list_pockets_with_owner))
        .route("/admin/audit", get(admin::list_audit_events))
        .route("/pockets", get(pockets::list_my_pockets))
        .route("/pockets/activate", post(pockets::activate_pocket))
        .route("/pockets/unbind", post(pockets::unbind_pocket))
        .route("/pockets/purchase", post(pockets::purchase))
        .route("/pockets/{id}/purchases", get(pockets::list_my_purchases))
        .route("/bind-ip", post(bindings::bind_identity))
        .route("/items", get(items::list_items).post(items::add_item))
        .route("/items/retrieve", post(items::retrieve_item));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

/// CORS for the single browser client origin, with cookies.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE]))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::verify_email,
        auth::login,
        auth::logout,
        auth::me,
        admin::admin_login,
        admin::rotate_password,
        admin::list_activation_codes,
        admin::create_activation_code,
        admin::delete_activation_code,
        admin::list_users,
        admin::list_pockets_with_owner,
        admin::list_audit_events,
        pockets::list_my_pockets,
        pockets::activate_pocket,
        pockets::unbind_pocket,
        pockets::purchase,
        pockets::list_my_purchases,
        bindings::bind_identity,
        items::list_items,
        items::add_item,
        items::retrieve_item,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            OkResponse,
            CreatedResponse,
            CapacityResponse,
            RegisterRequest,
            RegisterResponse,
            VerifyEmailRequest,
            LoginRequest,
            MeResponse,
            Principal,
            AdminLoginRequest,
            AdminLoginResponse,
            RotatePasswordRequest,
            CreateActivationCodeRequest,
            ActivationCodeListResponse,
            UserSummary,
            UserListResponse,
            PocketWithOwner,
            PocketOwnerListResponse,
            AuditEvent,
            AuditEventType,
            AuditLogResponse,
            ActivatePocketRequest,
            ActivatePocketResponse,
            PocketRequest,
            PurchaseRequest,
            PackageType,
            BindIdentityRequest,
            Hkid,
            MyPocket,
            MyPocketsResponse,
            PurchaseListResponse,
            StoredPocket,
            StoredItem,
            StoredPurchase,
            AddItemRequest,
            RetrieveItemRequest,
            ItemListResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Auth", description = "Registration, email verification and user sessions"),
        (name = "Admin", description = "Activation codes, overview and audit (admin session)"),
        (name = "Pockets", description = "Pocket activation, identity binding and purchases"),
        (name = "Items", description = "Pocket item storage"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
