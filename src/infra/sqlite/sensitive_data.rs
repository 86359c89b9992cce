use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection};

use super::parse_choice;
use crate::domain::{Choice, NewSensitiveData, RegistrationId, SensitiveData, TripId};
use crate::infra::{FieldEncryption, Result};

/// AAD table name; ciphertexts are bound to it together with the row id.
pub const SENSITIVE_DATA_TABLE: &str = "sensitive_data";

const PESEL: &str = "pesel";
const DOCUMENT_TYPE: &str = "document_type";
const DOCUMENT_NUMBER: &str = "document_number";

#[derive(Debug, FromRow)]
struct SensitiveDataRow {
    registration_id: i64,
    pesel_encrypted: Vec<u8>,
    document_type_encrypted: Vec<u8>,
    document_number_encrypted: Vec<u8>,
    consent: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Outcome of [`SensitiveDataStore::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSensitiveData {
    pub data: SensitiveData,
    /// `true` when an existing record was replaced.
    pub replaced: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReencryptReport {
    pub scanned: u64,
    pub updated: u64,
    pub skipped_current_key: u64,
}

/// Encrypted-at-rest storage of supplementary participant data.
pub struct SensitiveDataStore<'c> {
    conn: &'c mut SqliteConnection,
    encryption: &'c FieldEncryption,
}

impl<'c> SensitiveDataStore<'c> {
    pub fn new(conn: &'c mut SqliteConnection, encryption: &'c FieldEncryption) -> Self {
        Self { conn, encryption }
    }

    fn encrypt(&self, id: RegistrationId, column: &str, value: &str) -> Result<Vec<u8>> {
        self.encryption
            .encrypt_str(SENSITIVE_DATA_TABLE, id.0, column, value)
    }

    fn decrypt(&self, id: RegistrationId, column: &str, value: &[u8]) -> Result<String> {
        self.encryption
            .decrypt_str(SENSITIVE_DATA_TABLE, id.0, column, value)
    }

    fn decode(&self, row: SensitiveDataRow) -> Result<SensitiveData> {
        let id = RegistrationId(row.registration_id);
        let document_type = self.decrypt(id, DOCUMENT_TYPE, &row.document_type_encrypted)?;
        Ok(SensitiveData {
            registration_id: id,
            pesel: self.decrypt(id, PESEL, &row.pesel_encrypted)?,
            document_type: parse_choice(SENSITIVE_DATA_TABLE, &document_type)?,
            document_number: self.decrypt(id, DOCUMENT_NUMBER, &row.document_number_encrypted)?,
            consent: row.consent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Create or replace the record of `registration_id`.
    pub async fn upsert(
        &mut self,
        registration_id: RegistrationId,
        new: &NewSensitiveData,
    ) -> Result<SavedSensitiveData> {
        let replaced = self.exists(registration_id).await?;
        let now = Utc::now();

        let pesel = self.encrypt(registration_id, PESEL, &new.pesel)?;
        let document_type = self.encrypt(registration_id, DOCUMENT_TYPE, new.document_type.code())?;
        let document_number = self.encrypt(registration_id, DOCUMENT_NUMBER, &new.document_number)?;

        sqlx::query(
            r#"
            INSERT INTO sensitive_data (
                registration_id, pesel_encrypted, document_type_encrypted,
                document_number_encrypted, consent, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (registration_id) DO UPDATE SET
                pesel_encrypted = excluded.pesel_encrypted,
                document_type_encrypted = excluded.document_type_encrypted,
                document_number_encrypted = excluded.document_number_encrypted,
                consent = excluded.consent,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(registration_id.0)
        .bind(pesel)
        .bind(document_type)
        .bind(document_number)
        .bind(new.consent)
        .bind(now)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        let data = self
            .find(registration_id)
            .await?
            .ok_or_else(|| crate::infra::RejsError::not_found("sensitive data", registration_id))?;
        Ok(SavedSensitiveData { data, replaced })
    }

    pub async fn find(&mut self, registration_id: RegistrationId) -> Result<Option<SensitiveData>> {
        let row: Option<SensitiveDataRow> = sqlx::query_as(
            r#"
            SELECT registration_id, pesel_encrypted, document_type_encrypted,
                   document_number_encrypted, consent, created_at, updated_at
            FROM sensitive_data WHERE registration_id = ?
            "#,
        )
        .bind(registration_id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        row.map(|r| self.decode(r)).transpose()
    }

    pub async fn exists(&mut self, registration_id: RegistrationId) -> Result<bool> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sensitive_data WHERE registration_id = ?")
                .bind(registration_id.0)
                .fetch_one(&mut *self.conn)
                .await?;
        Ok(count > 0)
    }

    /// Returns whether a record was deleted.
    pub async fn delete(&mut self, registration_id: RegistrationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sensitive_data WHERE registration_id = ?")
            .bind(registration_id.0)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Decrypted records of every registration of the trip.
    pub async fn list_for_trip(&mut self, trip_id: TripId) -> Result<Vec<SensitiveData>> {
        let rows: Vec<SensitiveDataRow> = sqlx::query_as(
            r#"
            SELECT s.registration_id, s.pesel_encrypted, s.document_type_encrypted,
                   s.document_number_encrypted, s.consent, s.created_at, s.updated_at
            FROM sensitive_data s
            JOIN registrations r ON r.id = s.registration_id
            WHERE r.trip_id = ?
            ORDER BY r.last_name, r.first_name, r.id
            "#,
        )
        .bind(trip_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(|r| self.decode(r)).collect()
    }

    /// Registrations holding data whose trip ended before `cutoff`.
    pub async fn ids_for_trips_ended_before(
        &mut self,
        cutoff: NaiveDate,
    ) -> Result<Vec<RegistrationId>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT s.registration_id
            FROM sensitive_data s
            JOIN registrations r ON r.id = s.registration_id
            JOIN trips t ON t.id = r.trip_id
            WHERE t.end_date < ?
            ORDER BY s.registration_id
            "#,
        )
        .bind(cutoff)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(ids.into_iter().map(|(id,)| RegistrationId(id)).collect())
    }

    /// Re-encrypt every record not already readable with the current key.
    pub async fn reencrypt_all(&mut self, dry_run: bool) -> Result<ReencryptReport> {
        let rows: Vec<SensitiveDataRow> = sqlx::query_as(
            r#"
            SELECT registration_id, pesel_encrypted, document_type_encrypted,
                   document_number_encrypted, consent, created_at, updated_at
            FROM sensitive_data ORDER BY registration_id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let mut report = ReencryptReport::default();
        for row in rows {
            report.scanned += 1;
            let id = RegistrationId(row.registration_id);
            let current = [
                (PESEL, &row.pesel_encrypted),
                (DOCUMENT_TYPE, &row.document_type_encrypted),
                (DOCUMENT_NUMBER, &row.document_number_encrypted),
            ]
            .iter()
            .all(|(column, value)| {
                self.encryption
                    .is_current(SENSITIVE_DATA_TABLE, id.0, column, value)
            });
            if current {
                report.skipped_current_key += 1;
                continue;
            }

            let pesel = self.decrypt(id, PESEL, &row.pesel_encrypted)?;
            let document_type = self.decrypt(id, DOCUMENT_TYPE, &row.document_type_encrypted)?;
            let document_number = self.decrypt(id, DOCUMENT_NUMBER, &row.document_number_encrypted)?;

            report.updated += 1;
            if dry_run {
                continue;
            }

            sqlx::query(
                r#"
                UPDATE sensitive_data SET
                    pesel_encrypted = ?, document_type_encrypted = ?,
                    document_number_encrypted = ?
                WHERE registration_id = ?
                "#,
            )
            .bind(self.encrypt(id, PESEL, &pesel)?)
            .bind(self.encrypt(id, DOCUMENT_TYPE, &document_type)?)
            .bind(self.encrypt(id, DOCUMENT_NUMBER, &document_number)?)
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        }

        Ok(report)
    }
}
