// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie sessions.
//!
//! ## Flow
//!
//! 1. On login a 32-byte random token is generated and sent to the client in
//!    the `pocket_sid` cookie (`HttpOnly; SameSite=Lax; Path=/`).
//! 2. Only `HMAC-SHA256(secret, token)` is stored, together with the
//!    principal and an expiry 30 days out.
//! 3. Each request recomputes the digest from the cookie and looks the
//!    session up. Expired sessions are rejected and deleted on sight; the
//!    sweeper removes the rest periodically.

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;

use super::{AuthError, Principal};
use crate::storage::{Database, SessionRepository, StorageError, StoredSession};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "pocket_sid";

/// Session lifetime.
pub const SESSION_TTL: Duration = Duration::days(30);

/// Length of session tokens and generated secrets, in bytes.
const TOKEN_BYTES: usize = 32;

type HmacSha256 = Hmac<Sha256>;

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Issues, resolves and revokes cookie sessions.
#[derive(Clone)]
pub struct SessionManager {
    mac: HmacSha256,
    ttl: Duration,
}

impl SessionManager {
    /// Create a manager keyed with the given secret.
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| AuthError::InternalError(format!("invalid session secret: {e}")))?;
        Ok(Self {
            mac,
            ttl: SESSION_TTL,
        })
    }

    /// Override the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a random secret for processes started without one.
    pub fn generate_secret() -> Result<Vec<u8>, AuthError> {
        random_bytes().map(|bytes| bytes.to_vec())
    }

    /// Generate a fresh session token.
    pub fn generate_token() -> Result<String, AuthError> {
        Ok(Base64UrlUnpadded::encode_string(&random_bytes()?))
    }

    /// Digest under which a token's session is stored.
    pub fn digest(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes())
    }

    /// Start a session for `principal`, revoking `previous_token` first.
    ///
    /// Returns the token to hand to the client.
    pub fn establish(
        &self,
        db: &Database,
        principal: Principal,
        previous_token: Option<&str>,
    ) -> Result<String, AuthError> {
        let repo = SessionRepository::new(db);
        if let Some(previous) = previous_token {
            repo.revoke(&self.digest(previous))?;
        }

        let token = Self::generate_token()?;
        let now = Utc::now();
        let session = StoredSession {
            token_digest: self.digest(&token),
            principal,
            created_at: now,
            expires_at: now + self.ttl,
        };
        repo.create(&session)?;

        tracing::debug!(
            principal = %session.principal,
            expires_at = %session.expires_at,
            "Session established"
        );
        Ok(token)
    }

    /// Look up the live session behind a token.
    pub fn resolve(&self, db: &Database, token: &str) -> Result<StoredSession, AuthError> {
        let repo = SessionRepository::new(db);
        let digest = self.digest(token);
        let session = repo.get(&digest)?.ok_or(AuthError::InvalidSession)?;

        if session.is_expired(Utc::now()) {
            repo.revoke(&digest)?;
            return Err(AuthError::SessionExpired);
        }
        Ok(session)
    }

    /// Revoke the session behind a token. Returns whether one existed.
    pub fn revoke(&self, db: &Database, token: &str) -> Result<bool, AuthError> {
        Ok(SessionRepository::new(db).revoke(&self.digest(token))?)
    }

    /// Extract the session token from the request's `Cookie` headers.
    pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    /// `Set-Cookie` value carrying a new session token.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, AuthError> {
        let cookie = format!(
            "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.ttl.num_seconds()
        );
        HeaderValue::from_str(&cookie)
            .map_err(|e| AuthError::InternalError(format!("invalid cookie: {e}")))
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie() -> HeaderValue {
        HeaderValue::from_static("pocket_sid=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
    }
}

fn random_bytes() -> Result<[u8; TOKEN_BYTES], AuthError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AuthError::InternalError("system randomness unavailable".into()))?;
    Ok(bytes)
}
