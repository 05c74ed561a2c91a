// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for session-authenticated principals.
//!
//! Use the extractor matching the endpoint's audience:
//!
//! ```rust,ignore
//! async fn add_item(UserOnly(user): UserOnly, ...) -> Result<..., ApiError> {
//!     // user is AuthenticatedUser
//! }
//!
//! async fn list_users(AdminOnly(admin): AdminOnly, ...) -> Result<..., ApiError> {
//!     // admin is AuthenticatedAdmin with no pending password rotation
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedAdmin, AuthenticatedUser, Principal, SessionManager};
use crate::state::AppState;
use crate::storage::{AdminRepository, StorageError, UserRepository};

/// Extractor for any authenticated principal.
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token =
            SessionManager::token_from_headers(&parts.headers).ok_or(AuthError::MissingSession)?;
        let session = state.sessions.resolve(state.db(), &token)?;
        Ok(Auth(session.principal))
    }
}

/// Session token of the request, if it carries one.
///
/// Never rejects; used by login and logout to revoke the current session.
pub struct SessionToken(pub Option<String>);

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(SessionManager::token_from_headers(&parts.headers)))
    }
}

/// Extractor that requires a user session whose user still exists.
pub struct UserOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for UserOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token =
            SessionManager::token_from_headers(&parts.headers).ok_or(AuthError::MissingSession)?;
        let session = state.sessions.resolve(state.db(), &token)?;

        let Principal::User { user_id } = session.principal else {
            return Err(AuthError::WrongPrincipal);
        };
        if !UserRepository::new(state.db()).exists(&user_id)? {
            return Err(AuthError::UnknownPrincipal);
        }

        Ok(UserOnly(AuthenticatedUser {
            user_id,
            session_digest: session.token_digest,
        }))
    }
}

/// Extractor for an admin session, even one with a pending password rotation.
///
/// Only the password rotation endpoint should use this directly.
pub struct AdminSession(pub AuthenticatedAdmin);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token =
            SessionManager::token_from_headers(&parts.headers).ok_or(AuthError::MissingSession)?;
        let session = state.sessions.resolve(state.db(), &token)?;

        let Principal::Admin { admin_id } = session.principal else {
            return Err(AuthError::WrongPrincipal);
        };
        let admin = match AdminRepository::new(state.db()).get(&admin_id) {
            Ok(admin) => admin,
            Err(StorageError::NotFound(_)) => return Err(AuthError::UnknownPrincipal),
            Err(e) => return Err(e.into()),
        };

        Ok(AdminSession(AuthenticatedAdmin {
            admin_id: admin.id,
            username: admin.username,
            must_rotate_password: admin.must_rotate_password,
        }))
    }
}

/// Extractor that requires an admin with no pending password rotation.
pub struct AdminOnly(pub AuthenticatedAdmin);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AdminSession(admin) = AdminSession::from_request_parts(parts, state).await?;

        if admin.must_rotate_password {
            return Err(AuthError::RotationRequired);
        }

        Ok(AdminOnly(admin))
    }
}
