// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Outgoing Mail
//!
//! Verification codes are delivered through a [`Mailer`]. Delivery is best
//! effort: failures are logged and never fail the request that triggered
//! them.
//!
//! - [`SmtpMailer`]: lettre SMTP transport (relay with credentials, or a
//!   plain connection to a local catcher such as Mailpit when a port is set)
//! - [`LogMailer`]: logs the message instead of sending it, used when SMTP
//!   is not configured

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    message::header::ContentType, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// Sends plain-text email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// SMTP mailer backed by lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Build a mailer from SMTP settings.
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, String> {
        let transport = match config.port {
            Some(port) => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(port),
            None => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| e.to_string())?,
        };
        let transport = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                transport.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => transport,
        };

        Ok(Self {
            transport: transport.build(),
            from: from.to_string(),
        })
    }
}

/// Build the message, validating both addresses.
fn build_message(from: &str, to: &str, subject: &str, body: &str) -> Result<Message, String> {
    Message::builder()
        .from(from.parse().map_err(|e| format!("invalid from address: {e}"))?)
        .to(to.parse().map_err(|e| format!("invalid to address: {e}"))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| e.to_string())
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let message = build_message(&self.from, to, subject, body)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Mailer that only logs outgoing messages.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        tracing::info!(to = %to, subject = %subject, body = %body, "Mail delivery not configured; logging message");
        Ok(())
    }
}

/// Send a verification code. Failures are logged at `warn` and swallowed.
pub async fn send_verification_code(mailer: &dyn Mailer, to: &str, code: &str) {
    if let Err(e) = mailer.send(to, "Verification Code", code).await {
        tracing::warn!(to = %to, error = %e, "Failed to deliver verification code");
    }
}

/// Mailer that records every message, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<SentMail>>,
    fail: bool,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
impl RecordingMailer {
    /// A mailer whose sends always fail.
    pub fn failing() -> Self {
        Self {
            sent: Default::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Body of the last message sent to `to`.
    pub fn last_body_for(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == to)
            .map(|m| m.body)
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.fail {
            return Err("connection refused".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_message_rejects_invalid_addresses() {
        assert!(build_message("no-reply@monkey-pocket.local", "e1@example.com", "s", "b").is_ok());

        let bad_to = build_message("no-reply@monkey-pocket.local", "not-an-email", "s", "b");
        assert!(bad_to.unwrap_err().contains("invalid to address"));

        let bad_from = build_message("bad-from", "e1@example.com", "s", "b");
        assert!(bad_from.unwrap_err().contains("invalid from address"));
    }

    #[tokio::test]
    async fn smtp_mailer_builds_for_local_catcher() {
        let config = SmtpConfig {
            host: "localhost".into(),
            port: Some(1025),
            username: None,
            password: None,
        };
        assert!(SmtpMailer::new(&config, "no-reply@monkey-pocket.local").is_ok());
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_invalid_recipient_before_sending() {
        let config = SmtpConfig {
            host: "localhost".into(),
            port: Some(1025),
            username: None,
            password: None,
        };
        let mailer = SmtpMailer::new(&config, "no-reply@monkey-pocket.local").unwrap();
        let result = mailer.send("not-an-email", "Subject", "Body").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        assert!(LogMailer.send("e1@example.com", "s", "b").await.is_ok());
    }

    #[tokio::test]
    async fn verification_send_failure_is_swallowed() {
        let mailer = RecordingMailer::failing();
        send_verification_code(&mailer, "e1@example.com", "123456").await;
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].subject, "Verification Code");
    }

    #[tokio::test]
    async fn recording_mailer_keeps_last_body() {
        let mailer = RecordingMailer::default();
        send_verification_code(&mailer, "e1@example.com", "111111").await;
        send_verification_code(&mailer, "e1@example.com", "222222").await;
        assert_eq!(
            mailer.last_body_for("e1@example.com").as_deref(),
            Some("222222")
        );
    }
}
