// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Session authentication error type.
///
/// Returned as the rejection of the session extractors. The wire body only
/// carries a short code so clients cannot tell the failure causes apart.
#[derive(Debug)]
pub enum AuthError {
    /// No session cookie present
    MissingSession,
    /// Session token unknown to the store
    InvalidSession,
    /// Session past its expiry
    SessionExpired,
    /// Session belongs to the wrong kind of principal
    WrongPrincipal,
    /// Session principal no longer exists
    UnknownPrincipal,
    /// Admin must change the bootstrap password first
    RotationRequired,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

impl AuthError {
    /// Get the wire error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSession
            | AuthError::InvalidSession
            | AuthError::SessionExpired
            | AuthError::WrongPrincipal
            | AuthError::UnknownPrincipal => "unauthorized",
            AuthError::RotationRequired => "rotation_required",
            AuthError::InternalError(_) => "internal",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSession => write!(f, "Session cookie is required"),
            AuthError::InvalidSession => write!(f, "Session is not recognized"),
            AuthError::SessionExpired => write!(f, "Session has expired"),
            AuthError::WrongPrincipal => write!(f, "Session principal cannot use this endpoint"),
            AuthError::UnknownPrincipal => write!(f, "Session principal no longer exists"),
            AuthError::RotationRequired => write!(f, "Admin password must be rotated"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AuthError::InternalError(_) => tracing::error!(error = %self, "Authentication failed"),
            _ => tracing::debug!(error = %self, "Request rejected"),
        }
        let body = Json(AuthErrorBody {
            error: self.error_code(),
        });
        (status, body).into_response()
    }
}
