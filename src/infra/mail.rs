//! Outgoing mail transports.
//!
//! [`MailTransport`] is the seam between notification logic and delivery:
//! SMTP through `lettre` in production, a logging transport for local
//! development and an in-memory outbox for tests.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// A rendered two-part email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub subject: String,
    pub from: String,
    pub to: Vec<String>,
    pub text_body: String,
    /// Attached as a `text/html` alternative when present.
    pub html_body: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("invalid address {0}")]
    InvalidAddress(String),

    #[error("could not build message: {0}")]
    Build(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress(format!("{address}: {e}")))
}

/// Convert into a MIME message (`multipart/alternative` when HTML is present).
pub fn build_message(message: &EmailMessage) -> Result<Message, MailError> {
    if message.to.is_empty() {
        return Err(MailError::Build("message has no recipients".to_string()));
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(&message.from)?)
        .subject(message.subject.as_str());
    for to in &message.to {
        builder = builder.to(parse_mailbox(to)?);
    }

    let built = match &message.html_body {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            message.text_body.clone(),
            html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(message.text_body.clone()),
    };
    built.map_err(|e| MailError::Build(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

/// SMTP delivery over a single pooled connection.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder
            .port(config.port)
            .pool_config(PoolConfig::new().max_size(1));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default)]
pub struct ConsoleMailTransport;

#[async_trait]
impl MailTransport for ConsoleMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        build_message(message)?;
        info!(
            to = ?message.to,
            subject = %message.subject,
            has_html = message.html_body.is_some(),
            "email (console backend)"
        );
        debug!(body = %message.text_body, "email text body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Collects messages in memory; used by tests and `MAIL_BACKEND=memory`.
#[derive(Debug, Default)]
pub struct MemoryMailTransport {
    outbox: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far.
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages_to(&self, address: &str) -> Vec<EmailMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.to.iter().any(|to| to == address))
            .collect()
    }

    pub fn clear(&self) {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Make every later send to `address` fail with a transport error.
    pub fn fail_for(&self, address: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into());
    }
}

#[async_trait]
impl MailTransport for MemoryMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        build_message(message)?;
        {
            let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(address) = message.to.iter().find(|to| failing.contains(*to)) {
                return Err(MailError::Transport(format!(
                    "recipient {address} refused"
                )));
            }
        }
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            subject: "Temat".to_string(),
            from: "noreply@zobaczyc.morze".to_string(),
            to: vec![to.to_string()],
            text_body: "treść".to_string(),
            html_body: Some("<p>treść</p>".to_string()),
        }
    }

    #[test]
    fn builds_multipart_alternative() {
        let built = build_message(&message("jan@example.com")).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn rejects_bad_address_and_empty_recipients() {
        assert!(matches!(
            build_message(&message("not an address")),
            Err(MailError::InvalidAddress(_))
        ));
        let mut empty = message("jan@example.com");
        empty.to.clear();
        assert!(matches!(build_message(&empty), Err(MailError::Build(_))));
    }

    #[tokio::test]
    async fn memory_outbox_records_and_fails_on_demand() {
        let transport = MemoryMailTransport::new();
        transport.send(&message("a@example.com")).await.unwrap();

        transport.fail_for("b@example.com");
        assert!(transport.send(&message("b@example.com")).await.is_err());

        assert_eq!(transport.messages().len(), 1);
        assert_eq!(transport.messages_to("a@example.com").len(), 1);
        transport.clear();
        assert!(transport.messages().is_empty());
    }
}
