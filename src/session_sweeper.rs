// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Sweeper
//!
//! Background task that periodically deletes expired sessions. Lookups
//! already reject expired sessions, so the sweeper only bounds the size of
//! the sessions table for clients that never come back.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_SESSION_SWEEP_INTERVAL;
use crate::storage::{Database, SessionRepository};

/// Background sweeper for expired sessions.
pub struct SessionSweeper {
    db: Arc<Database>,
    interval: Duration,
}

impl SessionSweeper {
    /// Create a new sweeper over the given database.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            interval: DEFAULT_SESSION_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Session sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Session sweeper shutting down");
                return;
            }

            self.sweep_step();

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep. Returns the number of sessions removed.
    fn sweep_step(&self) -> usize {
        match SessionRepository::new(&self.db).sweep_expired(Utc::now()) {
            Ok(0) => 0,
            Ok(removed) => {
                debug!(removed, "Session sweeper: removed expired sessions");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Session sweeper: sweep failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::storage::StoredSession;

    fn insert_session(db: &Database, digest: &str, expires_in: chrono::Duration) {
        let now = Utc::now();
        SessionRepository::new(db)
            .create(&StoredSession {
                token_digest: digest.to_string(),
                principal: Principal::user("u1"),
                created_at: now,
                expires_at: now + expires_in,
            })
            .unwrap();
    }

    #[test]
    fn sweep_step_removes_expired_sessions() {
        let db = Arc::new(Database::in_memory().unwrap());
        insert_session(&db, "old", -chrono::Duration::minutes(1));
        insert_session(&db, "fresh", chrono::Duration::days(1));

        let sweeper = SessionSweeper::new(db.clone());
        assert_eq!(sweeper.sweep_step(), 1);
        assert_eq!(sweeper.sweep_step(), 0);
        assert_eq!(SessionRepository::new(&db).count().unwrap(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let db = Arc::new(Database::in_memory().unwrap());
        insert_session(&db, "old", -chrono::Duration::minutes(1));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            SessionSweeper::new(db.clone())
                .with_interval(Duration::from_millis(10))
                .run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper exits after cancellation")
            .unwrap();

        assert_eq!(SessionRepository::new(&db).count().unwrap(), 0);
    }
}
