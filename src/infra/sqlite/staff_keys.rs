use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use super::Database;
use crate::auth::{ApiKeyStore, AuthError, StaffKeyRecord};
use crate::infra::Result;

#[derive(Debug, FromRow)]
struct StaffKeyRow {
    key_hash: String,
    username: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<StaffKeyRow> for StaffKeyRecord {
    fn from(row: StaffKeyRow) -> Self {
        Self {
            key_hash: row.key_hash,
            username: row.username,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

pub struct StaffKeys<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> StaffKeys<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, record: &StaffKeyRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO staff_api_keys (key_hash, username, active, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.key_hash)
        .bind(&record.username)
        .bind(record.active)
        .bind(record.created_at)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn find_by_hash(&mut self, key_hash: &str) -> Result<Option<StaffKeyRecord>> {
        let row: Option<StaffKeyRow> = sqlx::query_as(
            "SELECT key_hash, username, active, created_at FROM staff_api_keys WHERE key_hash = ?",
        )
        .bind(key_hash)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.map(StaffKeyRecord::from))
    }

    pub async fn revoke(&mut self, key_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE staff_api_keys SET active = 0 WHERE key_hash = ?")
            .bind(key_hash)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// [`ApiKeyStore`] over the `staff_api_keys` table.
#[derive(Clone)]
pub struct SqliteStaffKeyStore {
    db: Database,
}

impl SqliteStaffKeyStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApiKeyStore for SqliteStaffKeyStore {
    async fn get_by_hash(&self, key_hash: &str) -> std::result::Result<Option<StaffKeyRecord>, AuthError> {
        let mut conn = self
            .db
            .acquire()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        StaffKeys::new(&mut conn)
            .find_by_hash(key_hash)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    async fn store(&self, record: &StaffKeyRecord) -> std::result::Result<(), AuthError> {
        let mut conn = self
            .db
            .acquire()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        StaffKeys::new(&mut conn)
            .insert(record)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    async fn revoke(&self, key_hash: &str) -> std::result::Result<(), AuthError> {
        let mut conn = self
            .db
            .acquire()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        StaffKeys::new(&mut conn)
            .revoke(key_hash)
            .await
            .map(|_| ())
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}
