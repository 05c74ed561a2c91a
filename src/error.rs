// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Error returned by API handlers.
///
/// `message` is the short wire code sent to the client as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    /// Bad input, ownership mismatch or unknown reference.
    pub fn invalid() -> Self {
        Self::bad_request("invalid")
    }

    pub fn invalid_hkid() -> Self {
        Self::bad_request("invalid_hkid")
    }

    pub fn missing() -> Self {
        Self::bad_request("missing")
    }

    pub fn exists() -> Self {
        Self::bad_request("exists")
    }

    pub fn owned() -> Self {
        Self::bad_request("owned")
    }

    pub fn full() -> Self {
        Self::bad_request("full")
    }

    pub fn capacity() -> Self {
        Self::bad_request("capacity")
    }

    pub fn expired() -> Self {
        Self::bad_request("expired")
    }

    /// Unexpected failure. The detail is logged, never sent to the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal")
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::PermissionDenied { .. } => Self::invalid(),
            StorageError::AlreadyExists(_) => Self::exists(),
            StorageError::AlreadyOwned(_) => Self::owned(),
            StorageError::PocketFull { .. } => Self::full(),
            StorageError::CapacityUnderflow { .. } => Self::capacity(),
            StorageError::Expired(_) => Self::expired(),
            other => Self::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(_) => Self::internal(err),
            other => Self::new(other.status_code(), other.error_code()),
        }
    }
}

/// Malformed, mistyped or non-JSON request bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::invalid()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected query string");
        Self::invalid()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
