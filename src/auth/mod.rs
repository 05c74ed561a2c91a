// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cookie-session authentication for the Monkey Pocket API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in via `/api/auth/login` or `/api/admin/login`
//! 2. Server sets an opaque `pocket_sid` cookie and stores only its HMAC
//!    digest with the session's [`Principal`]
//! 3. Extractors resolve the cookie on every request:
//!    - [`UserOnly`] → end-user endpoints
//!    - [`AdminOnly`] → admin endpoints (password rotation done)
//!    - [`AdminSession`] → the rotation endpoint itself
//!
//! ## Security
//!
//! - A session carries exactly one principal; there is no role elevation
//! - Passwords are hashed with Argon2id
//! - Sessions expire after 30 days and are swept periodically

pub mod error;
pub mod extractor;
pub mod normalize;
pub mod password;
pub mod principal;
pub mod session;

pub use error::AuthError;
pub use extractor::{AdminOnly, AdminSession, Auth, SessionToken, UserOnly};
pub use normalize::{normalize_email, normalize_username};
pub use password::{hash_password, verify_dummy, verify_password};
pub use principal::{AuthenticatedAdmin, AuthenticatedUser, Principal};
pub use session::{SessionManager, SESSION_COOKIE, SESSION_TTL};
