// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into [`ServerConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding `pocket.redb` | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `4000` |
//! | `CORS_ORIGIN` | Single origin allowed to send credentialed requests | `http://localhost:5173` |
//! | `SESSION_SECRET` | HMAC key for session digests | random per process |
//! | `SESSION_SWEEP_INTERVAL_SECS` | Expired session sweep interval | `3600` |
//! | `ADMIN_BOOTSTRAP_USERNAME` | First admin's username | unset |
//! | `ADMIN_BOOTSTRAP_PASSWORD` | First admin's temporary password | unset |
//! | `SMTP_HOST` | SMTP relay for verification mail | unset (log only) |
//! | `SMTP_PORT` | SMTP port (plain, no TLS) when set | unset |
//! | `SMTP_USERNAME` / `SMTP_PASSWORD` | SMTP credentials | unset |
//! | `MAIL_FROM` | Sender address | `no-reply@monkey-pocket.local` |
//! | `CLIENT_DIR` | Prebuilt client bundle to serve | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable name for the data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const HOST_ENV: &str = "HOST";
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 4000;

/// Environment variable name for the allowed CORS origin.
///
/// Cookies are sent cross-origin, so exactly one origin is allowed.
pub const CORS_ORIGIN_ENV: &str = "CORS_ORIGIN";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Environment variable name for the session HMAC secret.
///
/// When unset a random secret is generated, so sessions do not survive a
/// restart.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

pub const SESSION_SWEEP_INTERVAL_ENV: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const DEFAULT_SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

pub const ADMIN_BOOTSTRAP_USERNAME_ENV: &str = "ADMIN_BOOTSTRAP_USERNAME";
pub const ADMIN_BOOTSTRAP_PASSWORD_ENV: &str = "ADMIN_BOOTSTRAP_PASSWORD";

pub const SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const SMTP_USERNAME_ENV: &str = "SMTP_USERNAME";
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

pub const MAIL_FROM_ENV: &str = "MAIL_FROM";
pub const DEFAULT_MAIL_FROM: &str = "no-reply@monkey-pocket.local";

/// Environment variable name for the static client directory.
pub const CLIENT_DIR_ENV: &str = "CLIENT_DIR";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Bootstrap credential for the first admin.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Explicit port; when set the connection is made without TLS
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// `None` means a per-process random secret
    pub session_secret: Option<Vec<u8>>,
    pub session_sweep_interval: Duration,
    pub admin_bootstrap: Option<AdminBootstrap>,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub client_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var(PORT_ENV)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let session_sweep_interval = var(SESSION_SWEEP_INTERVAL_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_SWEEP_INTERVAL);

        let admin_bootstrap = match (
            var(ADMIN_BOOTSTRAP_USERNAME_ENV),
            var(ADMIN_BOOTSTRAP_PASSWORD_ENV),
        ) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            _ => None,
        };

        let smtp = var(SMTP_HOST_ENV).map(|host| SmtpConfig {
            host,
            port: var(SMTP_PORT_ENV).and_then(|v| v.parse().ok()),
            username: var(SMTP_USERNAME_ENV),
            password: var(SMTP_PASSWORD_ENV),
        });

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            cors_origin: var(CORS_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into()),
            session_secret: var(SESSION_SECRET_ENV).map(String::into_bytes),
            session_sweep_interval,
            admin_bootstrap,
            smtp,
            mail_from: var(MAIL_FROM_ENV).unwrap_or_else(|| DEFAULT_MAIL_FROM.into()),
            client_dir: var(CLIENT_DIR_ENV).map(PathBuf::from),
            log_format,
        }
    }

    /// Path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(crate::storage::DATABASE_FILE)
    }

    /// `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
