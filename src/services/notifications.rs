//! Lifecycle emails sent to participants.

use tera::Context;
use tracing::info;

use super::mailer::{BatchReport, Mailer, SendOutcome};
use crate::domain::{
    Announcement, Payment, PaymentKind, Registration, RegistrationStatus, Trip, Watch,
};
use crate::infra::{EmailMessage, Result};

/// Events that notify the registrant by email.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    RegistrationCreated {
        trip: &'a Trip,
        registration: &'a Registration,
    },
    StatusChanged {
        trip: &'a Trip,
        registration: &'a Registration,
        status: RegistrationStatus,
    },
    WatchAssigned {
        trip: &'a Trip,
        watch: &'a Watch,
        registration: &'a Registration,
    },
    PaymentRecorded {
        trip: &'a Trip,
        registration: &'a Registration,
        payment: &'a Payment,
    },
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Mailer,
    site_url: String,
}

impl Notifier {
    pub fn new(mailer: Mailer, site_url: impl Into<String>) -> Self {
        Self {
            mailer,
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    fn details_url(&self, registration: &Registration) -> String {
        format!("{}/zgloszenie/{}", self.site_url, registration.token)
    }

    fn base_context(&self, trip: &Trip, registration: &Registration) -> Context {
        let mut ctx = Context::new();
        ctx.insert("trip", trip);
        ctx.insert("registration", registration);
        ctx.insert("full_name", &registration.full_name());
        ctx.insert("details_url", &self.details_url(registration));
        ctx
    }

    /// `Ok(None)` when the event sends nothing (status back to unqualified).
    pub async fn notify(&self, event: LifecycleEvent<'_>) -> Result<Option<SendOutcome>> {
        let (subject, template, ctx, to) = match event {
            LifecycleEvent::RegistrationCreated { trip, registration } => (
                format!("Potwierdzenie zgłoszenia na rejs {}", trip.name),
                "emails/registration_created",
                self.base_context(trip, registration),
                &registration.email,
            ),
            LifecycleEvent::StatusChanged {
                trip,
                registration,
                status,
            } => {
                let (subject, template) = match status {
                    RegistrationStatus::Qualified => (
                        format!(
                            "Potwierdzenie zakwalifikowania - zakwalifikowanie na rejs {}",
                            trip.name
                        ),
                        "emails/registration_qualified",
                    ),
                    RegistrationStatus::Rejected => (
                        format!("Odrzucone zgłoszenie na rejs {}", trip.name),
                        "emails/registration_rejected",
                    ),
                    RegistrationStatus::Unqualified => return Ok(None),
                };
                (
                    subject,
                    template,
                    self.base_context(trip, registration),
                    &registration.email,
                )
            }
            LifecycleEvent::WatchAssigned {
                trip,
                watch,
                registration,
            } => {
                let mut ctx = self.base_context(trip, registration);
                ctx.insert("watch", watch);
                (
                    format!("Przydział do wachty {}", watch.name),
                    "emails/watch_assigned",
                    ctx,
                    &registration.email,
                )
            }
            LifecycleEvent::PaymentRecorded {
                trip,
                registration,
                payment,
            } => {
                let mut ctx = self.base_context(trip, registration);
                ctx.insert("payment", payment);
                ctx.insert("amount", &format!("{:.2}", payment.amount));
                match payment.kind {
                    PaymentKind::Payment => (
                        "Potwierdzenie otrzymania wpłaty - dziękujemy za wpłatę".to_string(),
                        "emails/payment",
                        ctx,
                        &registration.email,
                    ),
                    PaymentKind::Refund => (
                        "Zwrot wpłaty".to_string(),
                        "emails/refund",
                        ctx,
                        &registration.email,
                    ),
                }
            }
        };

        self.mailer
            .send_templated(&subject, to, template, &ctx)
            .await
            .map(Some)
    }

    /// One message per registrant of the trip; failures do not stop the batch.
    pub async fn broadcast_announcement(
        &self,
        trip: &Trip,
        announcement: &Announcement,
        recipients: &[Registration],
    ) -> Result<BatchReport> {
        let subject = format!("{}: {}", trip.name, announcement.title);
        let mut messages: Vec<EmailMessage> = Vec::with_capacity(recipients.len());

        for registration in recipients {
            let mut ctx = self.base_context(trip, registration);
            ctx.insert("announcement", announcement);
            if let Some(message) = self.mailer.render(
                &subject,
                vec![registration.email.clone()],
                "emails/announcement",
                &ctx,
            )? {
                messages.push(message);
            }
        }

        let report = self.mailer.send_mass(&messages).await;
        info!(
            trip_id = %trip.id,
            announcement_id = %announcement.id,
            sent = report.sent,
            failed = report.failed.len(),
            "announcement broadcast"
        );
        Ok(report)
    }
}
