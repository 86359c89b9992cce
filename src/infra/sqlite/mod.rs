//! SQLite storage
//!
//! Repositories borrow a single connection (`&mut SqliteConnection`), so the
//! same code runs on a pooled connection or inside a transaction:
//!
//! ```ignore
//! let mut tx = db.begin().await?;
//! let trip = Trips::new(&mut tx).get(trip_id).await?;
//! tx.commit().await?;
//! ```

mod announcements;
mod payments;
mod registrations;
mod sensitive_data;
mod staff_keys;
mod trips;

pub use announcements::*;
pub use payments::*;
pub use registrations::*;
pub use sensitive_data::*;
pub use staff_keys::*;
pub use trips::*;

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::infra::{RejsError, Result};

#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url`, creating the file if missing.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory database with migrations applied.
    ///
    /// Limited to one connection that is never recycled; each connection to
    /// `:memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        crate::migrations::run_sqlite(&self.pool)
            .await
            .map_err(|e| RejsError::Internal(format!("migration failed: {e}")))
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Money columns are TEXT; SQLite has no decimal type.
pub(crate) fn parse_decimal(table: &'static str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| RejsError::corrupt(table, format!("amount {raw:?}: {e}")))
}

pub(crate) fn parse_choice<T: crate::domain::Choice>(table: &'static str, raw: &str) -> Result<T> {
    T::parse(raw).ok_or_else(|| RejsError::corrupt(table, format!("unknown code {raw:?}")))
}

/// Format a decimal amount with two places for storage.
pub(crate) fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}
