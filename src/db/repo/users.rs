//! User operations for the repository.

use crate::domain::{TelegramId, UserId};
use sqlx::Row;
use tracing::info;

use super::{now_ms, Repository};

impl Repository {
    /// Find the user for `telegram_id`, inserting one if absent.
    ///
    /// Returns the user id and whether this call created the row. Two callers
    /// racing on the same new id both end up with the same row: the UNIQUE
    /// constraint turns the losing insert into a no-op.
    ///
    /// # Errors
    /// Returns an error if any query fails.
    pub async fn get_or_create_user(
        &self,
        telegram_id: &TelegramId,
    ) -> Result<(UserId, bool), sqlx::Error> {
        if let Some(id) = self.find_user(telegram_id).await? {
            return Ok((id, false));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (telegram_id, created_at)
            VALUES (?, ?)
            ON CONFLICT(telegram_id) DO NOTHING
            "#,
        )
        .bind(telegram_id.as_str())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        let created = result.rows_affected() > 0;

        let id = self
            .find_user(telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        if created {
            info!(telegram_id = %telegram_id, user_id = id.as_i64(), "Created user");
        }
        Ok((id, created))
    }

    async fn find_user(&self, telegram_id: &TelegramId) -> Result<Option<UserId>, sqlx::Error> {
        let row = sqlx::query("SELECT id FROM users WHERE telegram_id = ?")
            .bind(telegram_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserId(r.get::<i64, _>("id"))))
    }

    /// Count users with the given external id. Exactly 0 or 1.
    pub async fn count_users(&self, telegram_id: &TelegramId) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE telegram_id = ?")
            .bind(telegram_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}
