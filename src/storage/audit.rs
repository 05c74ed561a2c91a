// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for security-sensitive operations.
//!
//! Authentication events, pocket operations and administrative actions are
//! appended to the `audit_events` table, keyed by timestamp so the most
//! recent events can be read with a reverse range scan.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{Database, AUDIT_EVENTS};
use super::StorageResult;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Account events
    UserRegistered,
    EmailVerified,

    // Auth events
    LoginSuccess,
    LoginFailure,
    AdminLoginSuccess,
    AdminLoginFailure,
    AdminPasswordRotated,
    Logout,

    // Activation code events
    ActivationCodeCreated,
    ActivationCodeDeleted,

    // Pocket events
    PocketActivated,
    PocketUnbound,
    IdentityBound,
    ItemAdded,
    ItemRetrieved,
    CapacityPurchased,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Principal who triggered the event (`user:<id>` / `admin:<id>`), if known.
    pub actor: Option<String>,
    /// Resource affected (pocket_id, item_id, etc.).
    pub resource_id: Option<String>,
    /// Resource type (pocket, item, etc.).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            actor: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
        }
    }

    /// Set the actor.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed.
    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}

fn make_event_key(event: &AuditEvent) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + event.event_id.len());
    key.extend_from_slice(&(event.timestamp.timestamp_millis() as u64).to_be_bytes());
    key.extend_from_slice(event.event_id.as_bytes());
    key
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    db: &'a Database,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append an audit event.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let key = make_event_key(event);
        let json = serde_json::to_vec(event)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUDIT_EVENTS)?;
            table.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read the most recent events, newest first.
    pub fn recent(&self, limit: usize) -> StorageResult<Vec<AuditEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_EVENTS)?;

        let mut events = Vec::with_capacity(limit.min(256));
        for entry in table.iter()?.rev() {
            if events.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }
}

/// Helper macro for logging audit events. Failures are ignored.
///
/// The `event = ...` form logs a prebuilt event, for failures or events
/// carrying details. The short forms build the event from a type, an actor
/// and optionally a resource.
#[macro_export]
macro_rules! audit_log {
    ($db:expr, event = $event:expr) => {{
        let repo = $crate::storage::AuditRepository::new($db);
        let _ = repo.log(&$event);
    }};
    ($db:expr, $event_type:expr, $actor:expr) => {
        $crate::audit_log!(
            $db,
            event = $crate::storage::AuditEvent::new($event_type).with_actor($actor)
        )
    };
    ($db:expr, $event_type:expr, $actor:expr, $resource_type:expr, $resource_id:expr) => {
        $crate::audit_log!(
            $db,
            event = $crate::storage::AuditEvent::new($event_type)
                .with_actor($actor)
                .with_resource($resource_type, $resource_id)
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditEventType::PocketActivated)
            .with_actor("user:u1")
            .with_resource("pocket", "p1");

        assert_eq!(event.event_type, AuditEventType::PocketActivated);
        assert_eq!(event.actor.as_deref(), Some("user:u1"));
        assert_eq!(event.resource_type.as_deref(), Some("pocket"));
        assert_eq!(event.resource_id.as_deref(), Some("p1"));
        assert!(event.success);
    }

    #[test]
    fn failed_event() {
        let event = AuditEvent::new(AuditEventType::LoginFailure)
            .with_details(serde_json::json!({ "identity": "nobody" }))
            .failed();
        assert!(!event.success);
        assert!(event.details.is_some());
    }

    #[test]
    fn recent_returns_newest_first() {
        let db = Database::in_memory().unwrap();
        let repo = AuditRepository::new(&db);

        let mut first = AuditEvent::new(AuditEventType::UserRegistered).with_actor("user:u1");
        first.timestamp = Utc::now() - chrono::Duration::seconds(10);
        let second = AuditEvent::new(AuditEventType::LoginSuccess).with_actor("user:u1");

        repo.log(&first).unwrap();
        repo.log(&second).unwrap();

        let events = repo.recent(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::LoginSuccess);
        assert_eq!(events[1].event_type, AuditEventType::UserRegistered);

        let limited = repo.recent(1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn audit_macro_writes_event() {
        let db = Database::in_memory().unwrap();
        audit_log!(&db, AuditEventType::ItemAdded, "user:u2", "item", "i1");

        let events = AuditRepository::new(&db).recent(5).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].resource_id.as_deref(), Some("i1"));
    }

    #[test]
    fn audit_macro_writes_prebuilt_failed_event() {
        let db = Database::in_memory().unwrap();
        audit_log!(
            &db,
            event = AuditEvent::new(AuditEventType::LoginFailure)
                .with_details(serde_json::json!({ "identity": "nobody" }))
                .failed()
        );

        let events = AuditRepository::new(&db).recent(5).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::LoginFailure);
        assert!(!events[0].success);
        assert_eq!(
            events[0].details,
            Some(serde_json::json!({ "identity": "nobody" }))
        );
    }
}
