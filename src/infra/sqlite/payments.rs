use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use super::{money, parse_choice, parse_decimal};
use crate::domain::{Choice, Payment, PaymentId, PaymentInput, RegistrationId, TripId};
use crate::infra::{RejsError, Result};

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: i64,
    registration_id: i64,
    amount: String,
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RejsError;

    fn try_from(row: PaymentRow) -> Result<Self> {
        Ok(Self {
            id: PaymentId(row.id),
            registration_id: RegistrationId(row.registration_id),
            amount: parse_decimal("payments", &row.amount)?,
            kind: parse_choice("payments", &row.kind)?,
            created_at: row.created_at,
        })
    }
}

pub struct Payments<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> Payments<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &mut self,
        registration_id: RegistrationId,
        input: &PaymentInput,
    ) -> Result<Payment> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO payments (registration_id, amount, kind, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(registration_id.0)
        .bind(money(input.amount))
        .bind(input.kind.code())
        .bind(created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(Payment {
            id: PaymentId(result.last_insert_rowid()),
            registration_id,
            amount: input.amount,
            kind: input.kind,
            created_at,
        })
    }

    pub async fn get(&mut self, id: PaymentId) -> Result<Payment> {
        let row: Option<PaymentRow> = sqlx::query_as(
            "SELECT id, registration_id, amount, kind, created_at FROM payments WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        row.map(Payment::try_from)
            .transpose()?
            .ok_or_else(|| RejsError::not_found("payment", id))
    }

    /// Oldest first.
    pub async fn list_for_registration(
        &mut self,
        registration_id: RegistrationId,
    ) -> Result<Vec<Payment>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            "SELECT id, registration_id, amount, kind, created_at FROM payments \
             WHERE registration_id = ? ORDER BY created_at, id",
        )
        .bind(registration_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Payment::try_from).collect()
    }

    pub async fn list_for_trip(&mut self, trip_id: TripId) -> Result<Vec<Payment>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            "SELECT p.id, p.registration_id, p.amount, p.kind, p.created_at \
             FROM payments p JOIN registrations r ON r.id = p.registration_id \
             WHERE r.trip_id = ? ORDER BY p.created_at, p.id",
        )
        .bind(trip_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Payment::try_from).collect()
    }

    pub async fn delete(&mut self, id: PaymentId) -> Result<()> {
        let result = sqlx::query("DELETE FROM payments WHERE id = ?")
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("payment", id));
        }
        Ok(())
    }
}
