//! Database repository for per-SuperAdmin SMS provider settings.
//!
//! Credentials arrive here already encrypted; this module only moves
//! ciphertext in and out of the `provider_settings` table.

use crate::database::models::ProviderSettings;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const SETTINGS_COLUMNS: &str =
    "id, user_id, api_key, api_secret, base_url, created_at, updated_at";

/// Repository for provider settings operations.
pub struct SettingsRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Retrieves the settings row owned by a user.
    pub async fn get_by_user_id(&self, user_id: &str) -> Result<Option<ProviderSettings>> {
        let settings = sqlx::query_as::<_, ProviderSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM provider_settings WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(settings)
    }

    /// Creates or replaces the settings row for a user.
    pub async fn upsert(
        &self,
        user_id: &str,
        api_key_encrypted: &str,
        api_secret_encrypted: &str,
        base_url: Option<&str>,
    ) -> Result<ProviderSettings> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        let settings = sqlx::query_as::<_, ProviderSettings>(&format!(
            "INSERT INTO provider_settings \
             (id, user_id, api_key, api_secret, base_url, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET \
             api_key = excluded.api_key, \
             api_secret = excluded.api_secret, \
             base_url = excluded.base_url, \
             updated_at = excluded.updated_at \
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(&id)
        .bind(user_id)
        .bind(api_key_encrypted)
        .bind(api_secret_encrypted)
        .bind(base_url)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(settings)
    }
}
