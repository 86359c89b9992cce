//! Audited access to participants' supplementary data.
//!
//! Every read, write, delete and export goes through here so the audit row
//! is written in the same transaction as the data change.

use chrono::{Duration, NaiveDate};

use crate::domain::{NewSensitiveData, Registration, RegistrationId, SensitiveData, TripId};
use crate::infra::sqlite::{
    ReencryptReport, Registrations, SavedSensitiveData, SensitiveDataStore, Trips,
};
use crate::infra::{
    AuditAction, AuditLog, AuditLogBuilder, Database, FieldEncryption, RequestMeta, Result,
};

/// Audit model name of supplementary data rows.
pub const SENSITIVE_DATA_MODEL: &str = "SensitiveData";
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Who is touching the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accessor<'a> {
    /// Staff username; `None` for the participant or the system.
    pub actor: Option<&'a str>,
    pub request: Option<&'a RequestMeta>,
}

impl<'a> Accessor<'a> {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn staff(username: &'a str, request: &'a RequestMeta) -> Self {
        Self {
            actor: Some(username),
            request: Some(request),
        }
    }

    pub fn participant(request: &'a RequestMeta) -> Self {
        Self {
            actor: None,
            request: Some(request),
        }
    }

    fn entry(&self, action: AuditAction) -> AuditLogBuilder {
        AuditLogBuilder::new(action, SENSITIVE_DATA_MODEL)
            .actor(self.actor)
            .request(self.request)
    }
}

/// Outcome of [`SensitiveDataService::purge_expired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub cutoff: NaiveDate,
    pub purged: Vec<RegistrationId>,
    pub dry_run: bool,
}

#[derive(Clone)]
pub struct SensitiveDataService {
    db: Database,
    encryption: FieldEncryption,
}

impl SensitiveDataService {
    pub fn new(db: Database, encryption: FieldEncryption) -> Self {
        Self { db, encryption }
    }

    /// Create or replace; audited as `create` or `update` accordingly.
    pub async fn save(
        &self,
        registration_id: RegistrationId,
        data: NewSensitiveData,
        who: Accessor<'_>,
    ) -> Result<SavedSensitiveData> {
        let mut tx = self.db.begin().await?;

        let registration = Registrations::new(&mut tx).get(registration_id).await?;
        let saved = SensitiveDataStore::new(&mut tx, &self.encryption)
            .upsert(registration_id, &data)
            .await?;

        let action = if saved.replaced {
            AuditAction::Update
        } else {
            AuditAction::Create
        };
        AuditLog::new(&mut tx)
            .record(
                who.entry(action)
                    .object(registration_id.0, saved.data.audit_repr(&registration))
                    .build(),
            )
            .await?;

        tx.commit().await?;
        Ok(saved)
    }

    /// Decrypt and audit a `read`; unaudited when there is nothing to read.
    pub async fn read(
        &self,
        registration_id: RegistrationId,
        who: Accessor<'_>,
    ) -> Result<Option<SensitiveData>> {
        let mut tx = self.db.begin().await?;

        let registration = Registrations::new(&mut tx).get(registration_id).await?;
        let data = SensitiveDataStore::new(&mut tx, &self.encryption)
            .find(registration_id)
            .await?;

        if let Some(data) = &data {
            AuditLog::new(&mut tx)
                .record(
                    who.entry(AuditAction::Read)
                        .object(registration_id.0, data.audit_repr(&registration))
                        .build(),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(data)
    }

    /// Existence check; neither decrypts nor audits.
    pub async fn exists(&self, registration_id: RegistrationId) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        SensitiveDataStore::new(&mut conn, &self.encryption)
            .exists(registration_id)
            .await
    }

    /// Returns whether anything was deleted.
    pub async fn delete(&self, registration_id: RegistrationId, who: Accessor<'_>) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let registration = Registrations::new(&mut tx).get(registration_id).await?;
        let deleted = self
            .delete_in(&mut tx, &registration, who, String::new())
            .await?;
        tx.commit().await?;
        Ok(deleted)
    }

    /// Delete a trip with everything under it. Supplementary data of its
    /// registrations is removed first, one audited `delete` per row.
    pub async fn delete_trip(&self, trip_id: TripId, who: Accessor<'_>) -> Result<usize> {
        let mut tx = self.db.begin().await?;

        let trip = Trips::new(&mut tx).get(trip_id).await?;
        let registrations = Registrations::new(&mut tx).list_for_trip(trip_id).await?;
        let details = format!("Usunięcie rejsu {trip}");

        let mut purged = 0;
        for registration in &registrations {
            if self
                .delete_in(&mut tx, registration, who, details.clone())
                .await?
            {
                purged += 1;
            }
        }

        Trips::new(&mut tx).delete(trip_id).await?;
        tx.commit().await?;
        Ok(purged)
    }

    async fn delete_in(
        &self,
        conn: &mut sqlx::SqliteConnection,
        registration: &Registration,
        who: Accessor<'_>,
        details: String,
    ) -> Result<bool> {
        let deleted = SensitiveDataStore::new(conn, &self.encryption)
            .delete(registration.id)
            .await?;
        if deleted {
            AuditLog::new(conn)
                .record(
                    who.entry(AuditAction::Delete)
                        .object(registration.id.0, format!("Dane dodatkowe: {registration}"))
                        .details(details)
                        .build(),
                )
                .await?;
        }
        Ok(deleted)
    }

    /// All supplementary data of a trip, paired with its registrations.
    ///
    /// Audited once as an `export` of the trip.
    pub async fn export_trip(
        &self,
        trip_id: TripId,
        who: Accessor<'_>,
    ) -> Result<Vec<(Registration, SensitiveData)>> {
        let mut tx = self.db.begin().await?;

        let trip = Trips::new(&mut tx).get(trip_id).await?;
        let registrations = Registrations::new(&mut tx).list_for_trip(trip_id).await?;
        let data = SensitiveDataStore::new(&mut tx, &self.encryption)
            .list_for_trip(trip_id)
            .await?;

        let rows: Vec<(Registration, SensitiveData)> = data
            .into_iter()
            .filter_map(|d| {
                registrations
                    .iter()
                    .find(|r| r.id == d.registration_id)
                    .map(|r| (r.clone(), d))
            })
            .collect();

        AuditLog::new(&mut tx)
            .record(
                AuditLogBuilder::new(AuditAction::Export, "Trip")
                    .actor(who.actor)
                    .request(who.request)
                    .object(trip.id.0, trip.name.clone())
                    .details(format!("Eksport danych dodatkowych: {} rekordów", rows.len()))
                    .build(),
            )
            .await?;

        tx.commit().await?;
        Ok(rows)
    }

    /// Delete data of registrations whose trip ended more than
    /// `retention_days` before `today`. Each deletion is audited as a system
    /// action.
    pub async fn purge_expired(
        &self,
        today: NaiveDate,
        retention_days: i64,
        dry_run: bool,
    ) -> Result<PurgeReport> {
        let cutoff = today - Duration::days(retention_days);
        let mut tx = self.db.begin().await?;

        let ids = SensitiveDataStore::new(&mut tx, &self.encryption)
            .ids_for_trips_ended_before(cutoff)
            .await?;

        if !dry_run {
            let details = format!("Automatyczne usunięcie po {retention_days} dniach");
            for id in &ids {
                let registration = Registrations::new(&mut tx).get(*id).await?;
                self.delete_in(&mut tx, &registration, Accessor::system(), details.clone())
                    .await?;
            }
        }

        tx.commit().await?;
        tracing::info!(
            %cutoff,
            count = ids.len(),
            dry_run,
            "expired sensitive data purged"
        );
        Ok(PurgeReport {
            cutoff,
            purged: ids,
            dry_run,
        })
    }

    /// Re-encrypt rows not readable with the current key.
    pub async fn reencrypt_all(&self, dry_run: bool) -> Result<ReencryptReport> {
        let mut tx = self.db.begin().await?;
        let report = SensitiveDataStore::new(&mut tx, &self.encryption)
            .reencrypt_all(dry_run)
            .await?;
        if dry_run {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }
        Ok(report)
    }
}
