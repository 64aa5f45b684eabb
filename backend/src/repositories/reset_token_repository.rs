//! Database repository for short-lived password-reset token records.
//!
//! The signed JWT string itself is the primary key; a row is single-use
//! and expires independently of the token's own `exp` claim so that a
//! consumed token cannot be replayed within its signature lifetime.

use crate::database::models::PasswordResetToken;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for password reset token operations.
pub struct ResetTokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> ResetTokenRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a freshly issued reset token.
    pub async fn create_token(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken> {
        let record = sqlx::query_as::<_, PasswordResetToken>(
            "INSERT INTO password_reset_tokens (token, user_id, expires_at, used, created_at) \
             VALUES (?, ?, ?, 0, ?) \
             RETURNING token, user_id, expires_at, used, created_at",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(record)
    }

    /// Retrieves a token row that is unused and not yet expired.
    pub async fn get_valid_token(&self, token: &str) -> Result<Option<PasswordResetToken>> {
        let record = sqlx::query_as::<_, PasswordResetToken>(
            "SELECT token, user_id, expires_at, used, created_at \
             FROM password_reset_tokens \
             WHERE token = ? AND used = 0 AND expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Marks a token as consumed. Returns false when it was already used
    /// or never existed.
    pub async fn mark_used(&self, token: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE token = ? AND used = 0")
                .bind(token)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes rows whose expiry is in the past.
    pub async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
