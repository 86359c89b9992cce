use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use super::parse_choice;
use crate::domain::{
    Choice, NewRegistration, Registration, RegistrationId, RegistrationStatus, TripId, WatchId,
};
use crate::infra::{RejsError, Result};

const COLUMNS: &str = "id, trip_id, watch_id, token, first_name, last_name, email, phone, \
                       birth_date, address, postal_code, city, vision, prior_participation, \
                       gdpr_consent, status, created_at";

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: i64,
    trip_id: i64,
    watch_id: Option<i64>,
    token: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    birth_date: NaiveDate,
    address: String,
    postal_code: String,
    city: String,
    vision: String,
    prior_participation: String,
    gdpr_consent: bool,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = RejsError;

    fn try_from(row: RegistrationRow) -> Result<Self> {
        let token = Uuid::parse_str(&row.token)
            .map_err(|e| RejsError::corrupt("registrations", format!("token: {e}")))?;

        Ok(Self {
            id: RegistrationId(row.id),
            trip_id: TripId(row.trip_id),
            watch_id: row.watch_id.map(WatchId),
            token,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            birth_date: row.birth_date,
            address: row.address,
            postal_code: row.postal_code,
            city: row.city,
            vision: parse_choice("registrations", &row.vision)?,
            prior_participation: parse_choice("registrations", &row.prior_participation)?,
            gdpr_consent: row.gdpr_consent,
            status: parse_choice("registrations", &row.status)?,
            created_at: row.created_at,
        })
    }
}

pub struct Registrations<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> Registrations<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Store a new registration with a fresh access token and default status.
    pub async fn insert(&mut self, new: &NewRegistration) -> Result<Registration> {
        let token = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO registrations (
                trip_id, token, first_name, last_name, email, phone, birth_date,
                address, postal_code, city, vision, prior_participation,
                gdpr_consent, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.trip_id.0)
        .bind(token.to_string())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.birth_date)
        .bind(&new.address)
        .bind(&new.postal_code)
        .bind(&new.city)
        .bind(new.vision.code())
        .bind(new.prior_participation.code())
        .bind(new.gdpr_consent)
        .bind(RegistrationStatus::default().code())
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        self.get(RegistrationId(result.last_insert_rowid())).await
    }

    pub async fn find(&mut self, id: RegistrationId) -> Result<Option<Registration>> {
        let row: Option<RegistrationRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM registrations WHERE id = ?"))
                .bind(id.0)
                .fetch_optional(&mut *self.conn)
                .await?;
        row.map(Registration::try_from).transpose()
    }

    pub async fn get(&mut self, id: RegistrationId) -> Result<Registration> {
        self.find(id)
            .await?
            .ok_or_else(|| RejsError::not_found("registration", id))
    }

    pub async fn find_by_token(&mut self, token: Uuid) -> Result<Option<Registration>> {
        let row: Option<RegistrationRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM registrations WHERE token = ?"))
                .bind(token.to_string())
                .fetch_optional(&mut *self.conn)
                .await?;
        row.map(Registration::try_from).transpose()
    }

    pub async fn set_status(&mut self, id: RegistrationId, status: RegistrationStatus) -> Result<()> {
        let result = sqlx::query("UPDATE registrations SET status = ? WHERE id = ?")
            .bind(status.code())
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("registration", id));
        }
        Ok(())
    }

    pub async fn set_watch(&mut self, id: RegistrationId, watch_id: Option<WatchId>) -> Result<()> {
        let result = sqlx::query("UPDATE registrations SET watch_id = ? WHERE id = ?")
            .bind(watch_id.map(|w| w.0))
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("registration", id));
        }
        Ok(())
    }

    /// One UPDATE for the whole set; returns the number of rows changed.
    pub async fn set_watch_many(
        &mut self,
        ids: &[RegistrationId],
        watch_id: Option<WatchId>,
    ) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE registrations SET watch_id = ");
        builder.push_bind(watch_id.map(|w| w.0));
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.0);
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&mut *self.conn).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&mut self, id: RegistrationId) -> Result<()> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = ?")
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("registration", id));
        }
        Ok(())
    }

    pub async fn list(&mut self) -> Result<Vec<Registration>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM registrations ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Registration::try_from).collect()
    }

    pub async fn list_for_trip(&mut self, trip_id: TripId) -> Result<Vec<Registration>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM registrations WHERE trip_id = ? ORDER BY last_name, first_name, id"
        ))
        .bind(trip_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Registration::try_from).collect()
    }

    pub async fn list_for_watch(&mut self, watch_id: WatchId) -> Result<Vec<Registration>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM registrations WHERE watch_id = ? ORDER BY last_name, first_name, id"
        ))
        .bind(watch_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Registration::try_from).collect()
    }

    /// Registrations of the trip not yet assigned to any watch.
    pub async fn list_unassigned(&mut self, trip_id: TripId) -> Result<Vec<Registration>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM registrations \
             WHERE trip_id = ? AND watch_id IS NULL \
             ORDER BY last_name, first_name, id"
        ))
        .bind(trip_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Registration::try_from).collect()
    }

    /// Trip of each existing registration among `ids`; unknown ids are absent.
    pub async fn trip_ids_of(
        &mut self,
        ids: &[RegistrationId],
    ) -> Result<Vec<(RegistrationId, TripId)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, trip_id FROM registrations WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.0);
        }
        separated.push_unseparated(")");

        let rows: Vec<(i64, i64)> = builder.build_query_as().fetch_all(&mut *self.conn).await?;
        Ok(rows
            .into_iter()
            .map(|(id, trip)| (RegistrationId(id), TripId(trip)))
            .collect())
    }

    /// Same person already registered for the trip.
    ///
    /// Compared in Rust because SQLite's `lower()` only folds ASCII.
    pub async fn exists_for_person(
        &mut self,
        trip_id: TripId,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<bool> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT first_name, last_name, email FROM registrations WHERE trip_id = ?",
        )
        .bind(trip_id.0)
        .fetch_all(&mut *self.conn)
        .await?;

        let key = (
            first_name.trim().to_lowercase(),
            last_name.trim().to_lowercase(),
            email.trim().to_lowercase(),
        );
        Ok(rows.iter().any(|(f, l, e)| {
            f.to_lowercase() == key.0 && l.to_lowercase() == key.1 && e.to_lowercase() == key.2
        }))
    }
}
