use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::domain::{Announcement, AnnouncementId, AnnouncementInput, TripId};
use crate::infra::{RejsError, Result};

#[derive(Debug, FromRow)]
struct AnnouncementRow {
    id: i64,
    trip_id: i64,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<AnnouncementRow> for Announcement {
    fn from(row: AnnouncementRow) -> Self {
        Self {
            id: AnnouncementId(row.id),
            trip_id: TripId(row.trip_id),
            title: row.title,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

pub struct Announcements<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> Announcements<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &mut self,
        trip_id: TripId,
        input: &AnnouncementInput,
    ) -> Result<Announcement> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO announcements (trip_id, title, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(trip_id.0)
        .bind(&input.title)
        .bind(&input.body)
        .bind(created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(Announcement {
            id: AnnouncementId(result.last_insert_rowid()),
            trip_id,
            title: input.title.clone(),
            body: input.body.clone(),
            created_at,
        })
    }

    pub async fn get(&mut self, id: AnnouncementId) -> Result<Announcement> {
        let row: Option<AnnouncementRow> = sqlx::query_as(
            "SELECT id, trip_id, title, body, created_at FROM announcements WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&mut *self.conn)
        .await?;
        row.map(Announcement::from)
            .ok_or_else(|| RejsError::not_found("announcement", id))
    }

    /// Newest first.
    pub async fn list_for_trip(&mut self, trip_id: TripId) -> Result<Vec<Announcement>> {
        let rows: Vec<AnnouncementRow> = sqlx::query_as(
            "SELECT id, trip_id, title, body, created_at FROM announcements \
             WHERE trip_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(trip_id.0)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.into_iter().map(Announcement::from).collect())
    }

    pub async fn delete(&mut self, id: AnnouncementId) -> Result<()> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id.0)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RejsError::not_found("announcement", id));
        }
        Ok(())
    }
}
