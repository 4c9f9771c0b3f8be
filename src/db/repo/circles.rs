//! Circle and sell operations for the repository.

use crate::domain::{Circle, CircleId, NewCircle, Sell, SellInput, UserId};
use sqlx::Row;
use tracing::{debug, info};

use super::{circle_from_row, now_ms, sell_from_row, Repository, SellOutcome};

const SELECT_CIRCLE_BY_ID: &str = "SELECT id, user_id, currency, buy_rub, buy_price, buy_qty, \
     remaining_qty, sell_qty, sell_rub, closed, created_at FROM circles WHERE id = ?";

const SELECT_CIRCLES_BY_USER: &str = "SELECT id, user_id, currency, buy_rub, buy_price, buy_qty, \
     remaining_qty, sell_qty, sell_rub, closed, created_at FROM circles WHERE user_id = ? \
     ORDER BY created_at DESC, id DESC";

impl Repository {
    /// Insert a new circle with nothing sold and return the stored row.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including a foreign key
    /// violation when `user_id` does not exist.
    pub async fn insert_circle(&self, new: NewCircle) -> Result<Circle, sqlx::Error> {
        let created_at = now_ms();
        let result = sqlx::query(
            r#"
            INSERT INTO circles (
                user_id, currency, buy_rub, buy_price, buy_qty,
                remaining_qty, sell_qty, sell_rub, closed, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, '0', '0', 0, ?)
            "#,
        )
        .bind(new.user_id.as_i64())
        .bind(new.currency.as_str())
        .bind(new.buy_rub.to_canonical_string())
        .bind(new.buy_price.to_canonical_string())
        .bind(new.buy_qty.to_canonical_string())
        .bind(new.buy_qty.to_canonical_string())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let circle = Circle::from_new(CircleId(result.last_insert_rowid()), new, created_at);
        info!(
            circle_id = circle.id.as_i64(),
            user_id = circle.user_id.as_i64(),
            currency = %circle.currency,
            buy_qty = %circle.buy_qty,
            "Created circle"
        );
        Ok(circle)
    }

    /// Get a single circle by id.
    pub async fn get_circle(&self, circle_id: CircleId) -> Result<Option<Circle>, sqlx::Error> {
        let row = sqlx::query(SELECT_CIRCLE_BY_ID)
            .bind(circle_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(circle_from_row).transpose()
    }

    /// List a user's circles, most recent first.
    ///
    /// An unknown user simply has no circles.
    pub async fn list_circles(&self, user_id: UserId) -> Result<Vec<Circle>, sqlx::Error> {
        let rows = sqlx::query(SELECT_CIRCLES_BY_USER)
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(circle_from_row).collect()
    }

    /// List the sells recorded against a circle, oldest first.
    pub async fn list_sells(&self, circle_id: CircleId) -> Result<Vec<Sell>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, circle_id, qty, price, rub, note, created_at
            FROM sells
            WHERE circle_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(circle_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(sell_from_row).collect()
    }

    /// Record a sell against a circle in a single transaction.
    ///
    /// The circle row is write-locked before it is read, so concurrent sells
    /// on one circle are serialized and can never oversell it. Nothing is
    /// written when the circle is missing or the sell is rejected.
    ///
    /// # Errors
    /// Returns an error if any statement or the commit fails.
    pub async fn record_sell(
        &self,
        circle_id: CircleId,
        sell: &SellInput,
    ) -> Result<SellOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // A no-op write takes SQLite's write lock up front, like SELECT ... FOR UPDATE.
        let locked = sqlx::query("UPDATE circles SET id = id WHERE id = ?")
            .bind(circle_id.as_i64())
            .execute(&mut *tx)
            .await?;
        if locked.rows_affected() == 0 {
            return Ok(SellOutcome::NotFound);
        }

        let row = sqlx::query(SELECT_CIRCLE_BY_ID)
            .bind(circle_id.as_i64())
            .fetch_one(&mut *tx)
            .await?;
        let mut circle = circle_from_row(&row)?;

        if let Err(rejection) = circle.apply_sell(sell) {
            debug!(circle_id = circle_id.as_i64(), %rejection, "Sell rejected");
            return Ok(SellOutcome::Rejected(rejection));
        }

        sqlx::query(
            r#"
            INSERT INTO sells (circle_id, qty, price, rub, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(circle_id.as_i64())
        .bind(sell.qty.to_canonical_string())
        .bind(sell.price.to_canonical_string())
        .bind(sell.rub.to_canonical_string())
        .bind(sell.note.as_str())
        .bind(now_ms())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE circles
            SET remaining_qty = ?, sell_qty = ?, sell_rub = ?, closed = ?
            WHERE id = ?
            "#,
        )
        .bind(circle.remaining_qty.to_canonical_string())
        .bind(circle.sell_qty.to_canonical_string())
        .bind(circle.sell_rub.to_canonical_string())
        .bind(circle.closed as i64)
        .bind(circle_id.as_i64())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            circle_id = circle_id.as_i64(),
            qty = %sell.qty,
            remaining_qty = %circle.remaining_qty,
            closed = circle.closed,
            "Recorded sell"
        );
        Ok(SellOutcome::Recorded(circle))
    }

    /// Delete a circle together with its sells in one transaction.
    ///
    /// Returns whether a circle row was removed.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn delete_circle(&self, circle_id: CircleId) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let sells = sqlx::query("DELETE FROM sells WHERE circle_id = ?")
            .bind(circle_id.as_i64())
            .execute(&mut *tx)
            .await?;
        let circles = sqlx::query("DELETE FROM circles WHERE id = ?")
            .bind(circle_id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = circles.rows_affected() > 0;
        if deleted {
            info!(
                circle_id = circle_id.as_i64(),
                sells = sells.rows_affected(),
                "Deleted circle"
            );
        }
        Ok(deleted)
    }

    /// Count sells stored for a circle.
    pub async fn count_sells(&self, circle_id: CircleId) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sells WHERE circle_id = ?")
            .bind(circle_id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}
