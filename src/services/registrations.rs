//! Registration rules and the write paths that notify participants.
//!
//! Each mutating operation runs in one transaction that commits only after
//! its notification was sent, so a failed send leaves nothing behind.

use chrono::NaiveDate;
use uuid::Uuid;

use super::mailer::BatchReport;
use super::notifications::{LifecycleEvent, Notifier};
use crate::domain::{
    Announcement, AnnouncementInput, NewRegistration, Payment, PaymentInput, Registration,
    RegistrationId, RegistrationUpdate, Trip, TripId,
};
use crate::infra::sqlite::{Announcements, Payments, Registrations, SensitiveDataStore, Trips, Watches};
use crate::infra::{Database, FieldEncryption, RejsError, Result};
use crate::validation::FieldErrors;

pub const DUPLICATE_REGISTRATION: &str = "Na ten rejs istnieje już zgłoszenie dla tej osoby.";
pub const RECRUITMENT_CLOSED: &str = "Rekrutacja na ten rejs jest zamknięta.";
pub const WATCH_FROM_OTHER_TRIP: &str = "Wachta musi należeć do tego samego rejsu co zgłoszenie.";

#[derive(Clone)]
pub struct RegistrationService {
    db: Database,
    encryption: FieldEncryption,
    notifier: Notifier,
}

impl RegistrationService {
    pub fn new(db: Database, encryption: FieldEncryption, notifier: Notifier) -> Self {
        Self {
            db,
            encryption,
            notifier,
        }
    }

    /// Store a participant's registration and send the confirmation.
    pub async fn register(&self, new: NewRegistration, today: NaiveDate) -> Result<Registration> {
        let mut tx = self.db.begin().await?;

        let trip = Trips::new(&mut tx).get(new.trip_id).await?;
        if !trip.accepts_registrations(today) {
            return Err(RejsError::Conflict(RECRUITMENT_CLOSED.to_string()));
        }

        if Registrations::new(&mut tx)
            .exists_for_person(trip.id, &new.first_name, &new.last_name, &new.email)
            .await?
        {
            let mut errors = FieldErrors::new();
            errors.add_non_field(DUPLICATE_REGISTRATION);
            return Err(errors.into());
        }

        let registration = Registrations::new(&mut tx).insert(&new).await?;
        self.notifier
            .notify(LifecycleEvent::RegistrationCreated {
                trip: &trip,
                registration: &registration,
            })
            .await?;

        tx.commit().await?;
        tracing::info!(
            registration_id = %registration.id,
            trip_id = %trip.id,
            "registration created"
        );
        Ok(registration)
    }

    /// Staff change of status and/or watch.
    pub async fn update(&self, id: RegistrationId, update: RegistrationUpdate) -> Result<Registration> {
        let mut tx = self.db.begin().await?;

        let before = Registrations::new(&mut tx).get(id).await?;
        let trip = Trips::new(&mut tx).get(before.trip_id).await?;

        let mut new_watch = None;
        if let Some(watch_id) = update.watch_id {
            if let Some(watch_id) = watch_id {
                let watch = Watches::new(&mut tx).get(watch_id).await?;
                if watch.trip_id != before.trip_id {
                    return Err(FieldErrors::single("watch_id", WATCH_FROM_OTHER_TRIP).into());
                }
                if before.watch_id != Some(watch_id) {
                    new_watch = Some(watch);
                }
            }
            if before.watch_id != watch_id {
                Registrations::new(&mut tx).set_watch(id, watch_id).await?;
            }
        }

        let status_changed = matches!(update.status, Some(status) if status != before.status);
        if let (true, Some(status)) = (status_changed, update.status) {
            Registrations::new(&mut tx).set_status(id, status).await?;
        }

        let after = Registrations::new(&mut tx).get(id).await?;

        if status_changed {
            self.notifier
                .notify(LifecycleEvent::StatusChanged {
                    trip: &trip,
                    registration: &after,
                    status: after.status,
                })
                .await?;
        }
        if let Some(watch) = &new_watch {
            self.notifier
                .notify(LifecycleEvent::WatchAssigned {
                    trip: &trip,
                    watch,
                    registration: &after,
                })
                .await?;
        }

        tx.commit().await?;
        Ok(after)
    }

    pub async fn find_by_token(&self, token: Uuid) -> Result<Option<(Registration, Trip, bool)>> {
        let mut conn = self.db.acquire().await?;
        let Some(registration) = Registrations::new(&mut conn).find_by_token(token).await? else {
            return Ok(None);
        };
        let trip = Trips::new(&mut conn).get(registration.trip_id).await?;
        let has_sensitive = SensitiveDataStore::new(&mut conn, &self.encryption)
            .exists(registration.id)
            .await?;
        Ok(Some((registration, trip, has_sensitive)))
    }

    pub async fn record_payment(&self, registration_id: RegistrationId, input: PaymentInput) -> Result<Payment> {
        let input = input.validate()?;
        let mut tx = self.db.begin().await?;

        let registration = Registrations::new(&mut tx).get(registration_id).await?;
        let trip = Trips::new(&mut tx).get(registration.trip_id).await?;
        let payment = Payments::new(&mut tx).insert(registration_id, &input).await?;

        self.notifier
            .notify(LifecycleEvent::PaymentRecorded {
                trip: &trip,
                registration: &registration,
                payment: &payment,
            })
            .await?;

        tx.commit().await?;
        tracing::info!(
            payment_id = %payment.id,
            registration_id = %registration_id,
            kind = ?payment.kind,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Store the announcement, then email every registrant of the trip.
    pub async fn post_announcement(
        &self,
        trip_id: TripId,
        input: AnnouncementInput,
    ) -> Result<(Announcement, BatchReport)> {
        let input = input.validate()?;
        let mut tx = self.db.begin().await?;

        let trip = Trips::new(&mut tx).get(trip_id).await?;
        let announcement = Announcements::new(&mut tx).insert(trip_id, &input).await?;
        let recipients = Registrations::new(&mut tx).list_for_trip(trip_id).await?;
        tx.commit().await?;

        let report = self
            .notifier
            .broadcast_announcement(&trip, &announcement, &recipients)
            .await?;
        Ok((announcement, report))
    }
}
