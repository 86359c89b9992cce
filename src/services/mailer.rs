//! Templated email sending over a [`MailTransport`].

use std::sync::Arc;

use serde::Serialize;
use tera::Context;
use tracing::{debug, error, info, warn};

use crate::infra::{EmailMessage, MailTransport, Result};
use crate::templates::Templates;

/// Result of [`Mailer::send_templated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Neither template part exists; nothing was sent.
    Skipped,
}

/// Totals of a [`Mailer::send_mass`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub sent: usize,
    /// Recipients of each failed message with the failure reason.
    pub failed: Vec<(Vec<String>, String)>,
}

#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    templates: Arc<Templates>,
    from: String,
}

impl Mailer {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        templates: Arc<Templates>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            templates,
            from: from.into(),
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// Render `<base>.txt` and `<base>.html` into a message.
    ///
    /// A missing part is skipped with a warning; `Ok(None)` when both are
    /// missing. Other render errors propagate.
    pub fn render(
        &self,
        subject: &str,
        to: Vec<String>,
        template_base: &str,
        context: &Context,
    ) -> Result<Option<EmailMessage>> {
        let text = self.render_part(template_base, "txt", context)?;
        let html = self.render_part(template_base, "html", context)?;

        if text.is_none() && html.is_none() {
            error!(template = template_base, "no email templates found, email will not be sent");
            return Ok(None);
        }

        Ok(Some(EmailMessage {
            subject: subject.to_string(),
            from: self.from.clone(),
            to,
            text_body: text.unwrap_or_default(),
            html_body: html,
        }))
    }

    fn render_part(&self, base: &str, ext: &str, context: &Context) -> Result<Option<String>> {
        let name = format!("{base}.{ext}");
        let rendered = self.templates.render_optional(&name, context)?;
        if rendered.is_none() {
            warn!(template = %name, "email template not found");
        }
        Ok(rendered)
    }

    /// Render and send one message; transport failures propagate.
    pub async fn send_templated(
        &self,
        subject: &str,
        to: &str,
        template_base: &str,
        context: &Context,
    ) -> Result<SendOutcome> {
        let Some(message) = self.render(subject, vec![to.to_string()], template_base, context)?
        else {
            return Ok(SendOutcome::Skipped);
        };

        debug!(to, subject, "sending email");
        match self.transport.send(&message).await {
            Ok(()) => {
                info!(to, subject, backend = self.transport.name(), "email sent");
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                error!(to, error = %e, "failed to send email");
                Err(e.into())
            }
        }
    }

    /// Send independent messages, continuing past individual failures.
    pub async fn send_mass(&self, messages: &[EmailMessage]) -> BatchReport {
        let mut report = BatchReport::default();

        for message in messages {
            match self.transport.send(message).await {
                Ok(()) => {
                    report.sent += 1;
                    debug!(to = ?message.to, subject = %message.subject, "email sent");
                }
                Err(e) => {
                    error!(to = ?message.to, error = %e, "batch email failed");
                    report.failed.push((message.to.clone(), e.to_string()));
                }
            }
        }

        if report.sent > 0 {
            info!(sent = report.sent, "batch emails sent");
        }
        if !report.failed.is_empty() {
            warn!(failed = report.failed.len(), "some batch emails were not sent");
        }
        report
    }
}
