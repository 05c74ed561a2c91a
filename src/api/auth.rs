// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: registration, email verification and user sessions.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    Json,
};
use chrono::Utc;
use rand::Rng;

use crate::{
    api::extract::ApiJson,
    audit_log,
    auth::{
        hash_password, normalize_email, normalize_username, verify_dummy, verify_password, Auth,
        Principal, SessionManager, SessionToken,
    },
    error::ApiError,
    mailer::send_verification_code,
    models::{LoginRequest, MeResponse, OkResponse, RegisterRequest, RegisterResponse, VerifyEmailRequest},
    state::AppState,
    storage::{
        AdminRepository, AuditEvent, AuditEventType, StorageError,
        StoredUser, StoredVerification, UserRepository, VerificationRepository,
    },
};

/// Six-digit numeric verification code.
fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Headers carrying a `Set-Cookie` for a fresh session.
pub(crate) fn session_headers(state: &AppState, token: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, state.sessions.session_cookie(token)?);
    Ok(headers)
}

/// Register a new user.
///
/// Creates an unverified account and emails a six-digit verification code.
/// Mail delivery is best effort.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "User created", body = RegisterResponse),
        (status = 400, description = "missing | exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let username = normalize_username(&request.username);
    let email = normalize_email(&request.email);
    if username.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::missing());
    }

    let users = UserRepository::new(state.db());
    if users.find_by_username(&username)?.is_some() || users.find_by_email(&email)?.is_some() {
        return Err(ApiError::exists());
    }

    let user = StoredUser::new(username, email, hash_password(&request.password)?);
    let code = generate_verification_code();
    let verification = StoredVerification::new(user.id.clone(), user.email.clone(), code.clone());
    users.create_with_verification(&user, &verification)?;

    audit_log!(
        state.db(),
        AuditEventType::UserRegistered,
        format!("user:{}", user.id),
        "user",
        user.id.clone()
    );
    tracing::info!(user_id = %user.id, "Registered user");

    send_verification_code(state.mailer.as_ref(), &user.email, &code).await;

    Ok(Json(RegisterResponse {
        ok: true,
        user_id: user.id,
    }))
}

/// Verify an email address with the code sent at registration.
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Email verified", body = OkResponse),
        (status = 400, description = "invalid | expired")
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyEmailRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let email = normalize_email(&request.email);
    let code = request.code.trim();
    if email.is_empty() || code.is_empty() {
        return Err(ApiError::invalid());
    }

    let user_id = VerificationRepository::new(state.db()).consume(&email, code, Utc::now())?;

    audit_log!(
        state.db(),
        AuditEventType::EmailVerified,
        format!("user:{user_id}"),
        "user",
        user_id.clone()
    );
    Ok(Json(OkResponse::ok()))
}

/// Log in as a user. Email takes precedence over username.
///
/// Any session already carried by the request is revoked.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Logged in; session cookie set", body = OkResponse),
        (status = 400, description = "missing | invalid")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    SessionToken(previous): SessionToken,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(HeaderMap, Json<OkResponse>), ApiError> {
    let email = request
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty());
    let username = request
        .username
        .as_deref()
        .map(normalize_username)
        .filter(|u| !u.is_empty());
    if request.password.is_empty() || (email.is_none() && username.is_none()) {
        return Err(ApiError::missing());
    }

    let users = UserRepository::new(state.db());
    let (identity, user) = match (email, username) {
        (Some(email), _) => {
            let user = users.find_by_email(&email)?;
            (email, user)
        }
        (None, Some(username)) => {
            let user = users.find_by_username(&username)?;
            (username, user)
        }
        (None, None) => return Err(ApiError::missing()),
    };

    let verified = match &user {
        Some(user) => verify_password(&request.password, &user.password_hash)?,
        None => verify_dummy(&request.password)?,
    };
    let user = match user {
        Some(user) if verified => user,
        _ => {
            let event = AuditEvent::new(AuditEventType::LoginFailure)
                .with_details(serde_json::json!({ "identity": identity }))
                .failed();
            audit_log!(state.db(), event = event);
            tracing::debug!("User login failed");
            return Err(ApiError::invalid());
        }
    };

    let token = state.sessions.establish(
        state.db(),
        Principal::user(user.id.clone()),
        previous.as_deref(),
    )?;

    audit_log!(
        state.db(),
        AuditEventType::LoginSuccess,
        format!("user:{}", user.id),
        "user",
        user.id.clone()
    );
    Ok((session_headers(&state, &token)?, Json(OkResponse::ok())))
}

/// Revoke the current session, if any, and clear the cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logged out", body = OkResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<(HeaderMap, Json<OkResponse>), ApiError> {
    if let Some(token) = token {
        if let Ok(session) = state.sessions.resolve(state.db(), &token) {
            audit_log!(state.db(), AuditEventType::Logout, session.principal.to_string());
        }
        state.sessions.revoke(state.db(), &token)?;
    }

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, SessionManager::clear_cookie());
    Ok((headers, Json(OkResponse::ok())))
}

/// Current session principal.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "unauthorized")
    )
)]
pub async fn me(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, ApiError> {
    let response = match principal {
        Principal::User { user_id } => {
            let user = match UserRepository::new(state.db()).get(&user_id) {
                Ok(user) => user,
                Err(StorageError::NotFound(_)) => return Err(ApiError::unauthorized()),
                Err(e) => return Err(e.into()),
            };
            MeResponse {
                ok: true,
                kind: "user".to_string(),
                id: user.id,
                username: user.username,
                email: Some(user.email),
                verified_email: Some(user.verified_email),
                must_rotate_password: None,
            }
        }
        Principal::Admin { admin_id } => {
            let admin = match AdminRepository::new(state.db()).get(&admin_id) {
                Ok(admin) => admin,
                Err(StorageError::NotFound(_)) => return Err(ApiError::unauthorized()),
                Err(e) => return Err(e.into()),
            };
            MeResponse {
                ok: true,
                kind: "admin".to_string(),
                id: admin.id,
                username: admin.username,
                email: None,
                verified_email: None,
                must_rotate_password: Some(admin.must_rotate_password),
            }
        }
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::RecordingMailer;
    use crate::storage::AuditRepository;
    use axum::http::StatusCode;
    use std::sync::Arc;

    fn state_with_mailer() -> (AppState, Arc<RecordingMailer>) {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::default().with_mailer(mailer.clone());
        (state, mailer)
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: "p1-password".into(),
            email: email.into(),
        }
    }

    fn token_from(headers: &HeaderMap) -> String {
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        cookie
            .strip_prefix("pocket_sid=")
            .and_then(|rest| rest.split(';').next())
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn register_creates_unverified_user_and_sends_code() {
        let (state, mailer) = state_with_mailer();

        let Json(response) = register(
            State(state.clone()),
            ApiJson(register_request(" u1 ", "E1@Example.com")),
        )
        .await
        .expect("registration succeeds");
        assert!(response.ok);

        let user = UserRepository::new(state.db()).get(&response.user_id).unwrap();
        assert_eq!(user.username, "u1");
        assert_eq!(user.email, "e1@example.com");
        assert!(!user.verified_email);
        assert_ne!(user.password_hash, "p1-password");

        let code = mailer.last_body_for("e1@example.com").unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn register_rejects_missing_and_duplicate_fields() {
        let (state, _) = state_with_mailer();

        let err = register(State(state.clone()), ApiJson(register_request("", "e1@example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.message, "missing");

        register(State(state.clone()), ApiJson(register_request("u1", "e1@example.com")))
            .await
            .unwrap();

        let err = register(State(state.clone()), ApiJson(register_request("u1", "e2@example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.message, "exists");

        let err = register(State(state.clone()), ApiJson(register_request("u2", "E1@example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.message, "exists");
    }

    #[tokio::test]
    async fn register_succeeds_when_mail_delivery_fails() {
        let state = AppState::default().with_mailer(Arc::new(RecordingMailer::failing()));
        let result = register(State(state), ApiJson(register_request("u1", "e1@example.com"))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn verify_email_is_single_use() {
        let (state, mailer) = state_with_mailer();
        let Json(registered) = register(
            State(state.clone()),
            ApiJson(register_request("u1", "e1@example.com")),
        )
        .await
        .unwrap();
        let code = mailer.last_body_for("e1@example.com").unwrap();

        let err = verify_email(
            State(state.clone()),
            ApiJson(VerifyEmailRequest {
                email: "e1@example.com".into(),
                code: "000000".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "invalid");

        let request = VerifyEmailRequest {
            email: "e1@example.com".into(),
            code,
        };
        verify_email(State(state.clone()), ApiJson(request.clone()))
            .await
            .expect("first verification succeeds");
        assert!(
            UserRepository::new(state.db())
                .get(&registered.user_id)
                .unwrap()
                .verified_email
        );

        let err = verify_email(State(state.clone()), ApiJson(request))
            .await
            .unwrap_err();
        assert_eq!(err.message, "invalid");
    }

    #[tokio::test]
    async fn verify_email_rejects_expired_code() {
        let state = AppState::default();
        let user = StoredUser::new("u1".into(), "e1@example.com".into(), "hash".into());
        let mut verification =
            StoredVerification::new(user.id.clone(), user.email.clone(), "123456".into());
        verification.expires_at = Utc::now() - chrono::Duration::minutes(1);
        UserRepository::new(state.db())
            .create_with_verification(&user, &verification)
            .unwrap();

        let err = verify_email(
            State(state.clone()),
            ApiJson(VerifyEmailRequest {
                email: "e1@example.com".into(),
                code: "123456".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "expired");
    }

    #[tokio::test]
    async fn login_sets_session_cookie_and_revokes_previous() {
        let (state, _) = state_with_mailer();
        register(State(state.clone()), ApiJson(register_request("u1", "e1@example.com")))
            .await
            .unwrap();

        let request = LoginRequest {
            username: Some("u1".into()),
            email: None,
            password: "p1-password".into(),
        };
        let (headers, Json(response)) = login(
            State(state.clone()),
            SessionToken(None),
            ApiJson(request.clone()),
        )
        .await
        .expect("login succeeds");
        assert!(response.ok);
        let first = token_from(&headers);
        assert!(state.sessions.resolve(state.db(), &first).is_ok());

        let (headers, _) = login(
            State(state.clone()),
            SessionToken(Some(first.clone())),
            ApiJson(request),
        )
        .await
        .unwrap();
        let second = token_from(&headers);
        assert_ne!(first, second);
        assert!(state.sessions.resolve(state.db(), &first).is_err());
        assert!(state.sessions.resolve(state.db(), &second).is_ok());
    }

    #[tokio::test]
    async fn login_prefers_email_and_rejects_bad_credentials() {
        let (state, _) = state_with_mailer();
        register(State(state.clone()), ApiJson(register_request("u1", "e1@example.com")))
            .await
            .unwrap();

        // Email wins even when the username is wrong.
        let result = login(
            State(state.clone()),
            SessionToken(None),
            ApiJson(LoginRequest {
                username: Some("nobody".into()),
                email: Some("E1@example.com".into()),
                password: "p1-password".into(),
            }),
        )
        .await;
        assert!(result.is_ok());

        let err = login(
            State(state.clone()),
            SessionToken(None),
            ApiJson(LoginRequest {
                username: Some("u1".into()),
                email: None,
                password: "wrong".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "invalid");

        let err = login(
            State(state.clone()),
            SessionToken(None),
            ApiJson(LoginRequest {
                username: Some("ghost".into()),
                email: None,
                password: "p1-password".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "invalid");

        let err = login(
            State(state.clone()),
            SessionToken(None),
            ApiJson(LoginRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "missing");

        let events = AuditRepository::new(state.db()).recent(10).unwrap();
        assert!(events
            .iter()
            .any(|e| e.event_type == AuditEventType::LoginFailure && !e.success));
    }

    #[tokio::test]
    async fn logout_always_succeeds_and_revokes() {
        let state = AppState::default();
        let (headers, Json(response)) = logout(State(state.clone()), SessionToken(None))
            .await
            .unwrap();
        assert!(response.ok);
        assert!(headers
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        let token = state
            .sessions
            .establish(state.db(), Principal::user("u1"), None)
            .unwrap();
        logout(State(state.clone()), SessionToken(Some(token.clone())))
            .await
            .unwrap();
        assert!(state.sessions.resolve(state.db(), &token).is_err());
    }

    #[tokio::test]
    async fn me_describes_user_and_admin() {
        let (state, _) = state_with_mailer();
        let Json(registered) = register(
            State(state.clone()),
            ApiJson(register_request("u1", "e1@example.com")),
        )
        .await
        .unwrap();

        let Json(user_me) = me(Auth(Principal::user(registered.user_id.clone())), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(user_me.kind, "user");
        assert_eq!(user_me.username, "u1");
        assert_eq!(user_me.verified_email, Some(false));
        assert!(user_me.must_rotate_password.is_none());

        let admin = crate::storage::StoredAdmin::new("root".into(), "hash".into(), true);
        AdminRepository::new(state.db()).create(&admin).unwrap();
        let Json(admin_me) = me(Auth(Principal::admin(admin.id.clone())), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(admin_me.kind, "admin");
        assert_eq!(admin_me.must_rotate_password, Some(true));
        assert!(admin_me.email.is_none());

        let err = me(Auth(Principal::user("ghost")), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
