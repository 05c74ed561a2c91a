// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Monkey Pocket - Membership & Pocket Inventory Service
//!
//! Users register, verify their email and claim pockets with admin-issued
//! activation codes. A pocket stores a bounded number of items; capacity
//! grows through purchases and shrinks through retrievals.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Cookie sessions, password hashing and principal extractors
//! - `bootstrap` - First-admin provisioning
//! - `mailer` - Verification code delivery (SMTP)
//! - `session_sweeper` - Background removal of expired sessions
//! - `storage` - Embedded ACID database (redb) and repositories

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod session_sweeper;
pub mod state;
pub mod storage;
