//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `users.rs` - User lookup-or-create
//! - `circles.rs` - Circle creation, listing, sells and deletion

mod circles;
mod users;

use crate::domain::{Circle, CircleId, Currency, Decimal, Sell, SellId, SellRejection, UserId};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Result of attempting to record a sell inside the circle's transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellOutcome {
    /// The sell was stored; carries the updated circle.
    Recorded(Circle),
    NotFound,
    Rejected(SellRejection),
}

/// Repository for database operations.
///
/// Owns the connection pool; every method acquires a connection (or a
/// transaction) for its own duration only.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Round-trip a trivial query to check the store is reachable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn get_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn circle_from_row(row: &SqliteRow) -> Result<Circle, sqlx::Error> {
    Ok(Circle {
        id: CircleId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        currency: Currency::new(row.try_get("currency")?),
        buy_rub: get_decimal(row, "buy_rub")?,
        buy_price: get_decimal(row, "buy_price")?,
        buy_qty: get_decimal(row, "buy_qty")?,
        remaining_qty: get_decimal(row, "remaining_qty")?,
        sell_qty: get_decimal(row, "sell_qty")?,
        sell_rub: get_decimal(row, "sell_rub")?,
        closed: row.try_get::<i64, _>("closed")? != 0,
        created_at: row.try_get("created_at")?,
    })
}

fn sell_from_row(row: &SqliteRow) -> Result<Sell, sqlx::Error> {
    Ok(Sell {
        id: SellId(row.try_get("id")?),
        circle_id: CircleId(row.try_get("circle_id")?),
        qty: get_decimal(row, "qty")?,
        price: get_decimal(row, "price")?,
        rub: get_decimal(row, "rub")?,
        note: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
    })
}
