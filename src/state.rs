// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::SessionManager;
use crate::mailer::Mailer;
use crate::storage::Database;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: Arc<SessionManager>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: Database, sessions: SessionManager, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db: Arc::new(db),
            sessions: Arc::new(sessions),
            mailer,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Replace the mailer.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}

#[cfg(test)]
impl Default for AppState {
    /// In-memory database, fixed session secret, recording mailer.
    fn default() -> Self {
        Self::new(
            Database::in_memory().expect("in-memory database"),
            SessionManager::new(b"test-session-secret").expect("session manager"),
            Arc::new(crate::mailer::RecordingMailer::default()),
        )
    }
}
