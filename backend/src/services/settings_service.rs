//! SMS provider settings service.
//!
//! Each SuperAdmin stores one set of provider credentials; the key and
//! secret are AES-GCM encrypted before they reach the repository and are
//! only decrypted when an outbound provider call needs them.

use crate::config::Config;
use crate::database::models::{ProviderSettings, UpdateProviderSettings};
use crate::errors::{ServiceError, ServiceResult, validation_message};
use crate::repositories::settings_repository::SettingsRepository;
use crate::repositories::tenant_repository::TenantRepository;
use crate::utils::crypto::StringCrypto;
use crate::utils::jwt::Claims;
use sqlx::SqlitePool;
use validator::Validate;

/// Decrypted credentials ready for an outbound provider call.
pub struct ProviderCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: Option<String>,
}

pub struct SettingsService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> SettingsService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Retrieves the actor's settings row (ciphertext fields are never
    /// serialized back to the client).
    pub async fn get_settings(&self, actor: &Claims) -> ServiceResult<ProviderSettings> {
        let repo = SettingsRepository::new(self.pool);
        repo.get_by_user_id(actor.user_id())
            .await?
            .ok_or_else(|| ServiceError::not_found("Provider settings", actor.user_id()))
    }

    /// Creates or replaces the actor's provider credentials.
    pub async fn update_settings(
        &self,
        request: UpdateProviderSettings,
        actor: &Claims,
    ) -> ServiceResult<ProviderSettings> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let crypto = self.crypto()?;
        let api_key = crypto
            .encrypt(&request.api_key)
            .map_err(|e| ServiceError::internal_error(format!("Credential encryption failed: {e}")))?;
        let api_secret = crypto
            .encrypt(&request.api_secret)
            .map_err(|e| ServiceError::internal_error(format!("Credential encryption failed: {e}")))?;

        let repo = SettingsRepository::new(self.pool);
        let settings = repo
            .upsert(
                actor.user_id(),
                &api_key,
                &api_secret,
                request.base_url.as_deref(),
            )
            .await?;

        Ok(settings)
    }

    /// Resolves the decrypted credentials to use for a caller.
    ///
    /// SuperAdmins use their own settings; tenant users resolve through
    /// the SuperAdmin who created their tenant.
    pub async fn resolve_credentials(&self, actor: &Claims) -> ServiceResult<ProviderCredentials> {
        let owner_id = match actor.tenant_id() {
            None => actor.user_id().to_string(),
            Some(tenant_id) => {
                let tenant_repo = TenantRepository::new(self.pool);
                let tenant = tenant_repo
                    .get_tenant_by_id(tenant_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Tenant", tenant_id))?;
                tenant.created_by
            }
        };

        let repo = SettingsRepository::new(self.pool);
        let settings = repo.get_by_user_id(&owner_id).await?.ok_or_else(|| {
            ServiceError::invalid_operation("SMS provider credentials are not configured")
        })?;

        let crypto = self.crypto()?;
        let api_key = crypto
            .decrypt(&settings.api_key)
            .map_err(|e| ServiceError::internal_error(format!("Credential decryption failed: {e}")))?;
        let api_secret = crypto
            .decrypt(&settings.api_secret)
            .map_err(|e| ServiceError::internal_error(format!("Credential decryption failed: {e}")))?;

        Ok(ProviderCredentials {
            api_key,
            api_secret,
            base_url: settings.base_url,
        })
    }

    fn crypto(&self) -> ServiceResult<StringCrypto> {
        let config = Config::from_env()
            .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?;
        StringCrypto::new(&config.encryption_key)
            .map_err(|e| ServiceError::internal_error(format!("Invalid encryption key: {e}")))
    }
}
