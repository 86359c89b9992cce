use chrono::NaiveDate;
use sqlx::{FromRow, SqliteConnection};

use super::{money, parse_decimal};
use crate::domain::{Trip, TripId, TripInput, Watch, WatchId, WatchInput};
use crate::infra::{RejsError, Result};

const TRIP_COLUMNS: &str = "id, name, start_date, end_date, departure_port, arrival_port, \
                            price, deposit, description, recruitment_open";

#[derive(Debug, FromRow)]
struct TripRow {
    id: i64,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    departure_port: String,
    arrival_port: String,
    price: String,
    deposit: String,
    description: String,
    recruitment_open: bool,
}

impl TryFrom<TripRow> for Trip {
    type Error = RejsError;

    fn try_from(row: TripRow) -> Result<Self> {
        Ok(Self {
            id: TripId(row.id),
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            departure_port: row.departure_port,
            arrival_port: row.arrival_port,
            price: parse_decimal("trips", &row.price)?,
            deposit: parse_decimal("trips", &row.deposit)?,
            description: row.description,
            recruitment_open: row.recruitment_open,
        })
    }
}

pub struct Trips<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> Trips<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, input: &TripInput) -> Result<Trip> {
        let result = sqlx::query(
            r#"
            INSERT INTO trips (
                name, start_date, end_date, departure_port, arrival_port,
                price, deposit, description, recruitment_open
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.departure_port)
        .bind(&input.arrival_port)
        .bind(money(input.price))
        .bind(money(input.deposit))
        .bind(&input.description)
        .bind(input.recruitment_open)
        .execute(&mut *self.conn)
        .await?;

        self.get(TripId(result.last_insert_rowid())).await
    }

    pub async fn find(&mut self, id: TripId) -> Result<Option<Trip>> {
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?"))
                .bind(id.0)
                .fetch_optional(&mut *self.conn)
                .await?;
        row.map(Trip::try_from).transpose()
    }

    pub async fn get(&mut self, id: TripId) -> Result<Trip> {
        self.find(id)
            .await?
            .ok_or_else(|| RejsError::not_found("trip", id))
    }

    pub async fn update(&mut self, id: TripId, input: &TripInput) -> Result<Trip> {
        let result = sqlx::query(
            r#"
            UPDATE trips SET
                name = ?, start_date = ?, end_date = ?, departure_port = ?,
                arrival_port = ?, price = ?, deposit = ?, description = ?,
                recruitment_open = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.departure_port)
        .bind(&input.arrival_port)
        .bind(money(input.price))
        .bind(money(input.deposit))
        .bind(&input.description)
        .bind(input.recruitment_open)
        .bind(id.0)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("trip", id));
        }
        self.get(id).await
    }

    /// Cascades to watches, registrations, payments and announcements.
    pub async fn delete(&mut self, id: TripId) -> Result<()> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("trip", id));
        }
        Ok(())
    }

    pub async fn list(&mut self) -> Result<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips ORDER BY start_date, id"
        ))
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Trip::try_from).collect()
    }

    /// Trips open for recruitment that start on or after `today`, soonest first.
    pub async fn list_open(&mut self, today: NaiveDate) -> Result<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips \
             WHERE recruitment_open = 1 AND start_date >= ? \
             ORDER BY start_date, id"
        ))
        .bind(today)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Trip::try_from).collect()
    }

    /// Trips whose end date is strictly before `date`.
    pub async fn list_ended_before(&mut self, date: NaiveDate) -> Result<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE end_date < ? ORDER BY end_date, id"
        ))
        .bind(date)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(Trip::try_from).collect()
    }
}

#[derive(Debug, FromRow)]
struct WatchRow {
    id: i64,
    trip_id: i64,
    name: String,
}

impl From<WatchRow> for Watch {
    fn from(row: WatchRow) -> Self {
        Self {
            id: WatchId(row.id),
            trip_id: TripId(row.trip_id),
            name: row.name,
        }
    }
}

pub struct Watches<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> Watches<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, trip_id: TripId, input: &WatchInput) -> Result<Watch> {
        let result = sqlx::query("INSERT INTO watches (trip_id, name) VALUES (?, ?)")
            .bind(trip_id.0)
            .bind(&input.name)
            .execute(&mut *self.conn)
            .await?;

        Ok(Watch {
            id: WatchId(result.last_insert_rowid()),
            trip_id,
            name: input.name.clone(),
        })
    }

    pub async fn find(&mut self, id: WatchId) -> Result<Option<Watch>> {
        let row: Option<WatchRow> =
            sqlx::query_as("SELECT id, trip_id, name FROM watches WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&mut *self.conn)
                .await?;
        Ok(row.map(Watch::from))
    }

    pub async fn get(&mut self, id: WatchId) -> Result<Watch> {
        self.find(id)
            .await?
            .ok_or_else(|| RejsError::not_found("watch", id))
    }

    pub async fn rename(&mut self, id: WatchId, input: &WatchInput) -> Result<Watch> {
        let result = sqlx::query("UPDATE watches SET name = ? WHERE id = ?")
            .bind(&input.name)
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("watch", id));
        }
        self.get(id).await
    }

    /// Members are unassigned, not deleted.
    pub async fn delete(&mut self, id: WatchId) -> Result<()> {
        let result = sqlx::query("DELETE FROM watches WHERE id = ?")
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("watch", id));
        }
        Ok(())
    }

    pub async fn list_for_trip(&mut self, trip_id: TripId) -> Result<Vec<Watch>> {
        let rows: Vec<WatchRow> =
            sqlx::query_as("SELECT id, trip_id, name FROM watches WHERE trip_id = ? ORDER BY id")
                .bind(trip_id.0)
                .fetch_all(&mut *self.conn)
                .await?;
        Ok(rows.into_iter().map(Watch::from).collect())
    }
}
