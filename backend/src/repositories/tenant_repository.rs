//! Database repository for tenant management operations.
//!
//! Tenants are exclusively owned by the SuperAdmin who created them
//! (`created_by`); reads through a `Creator` scope filter on that column,
//! reads through a `Tenant` scope can only ever see the caller's own
//! tenant row.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::database::models::{CreateTenant, Tenant, UpdateTenant};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const TENANT_COLUMNS: &str = "id, name, contact_email, contact_phone, address, \
    messages_enabled, contacts_enabled, voicemail_enabled, phone_enabled, \
    retention_years, created_by, created_at, updated_at, is_deleted, deleted_at";

/// Repository for tenant database operations.
pub struct TenantRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> TenantRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new tenant owned by `created_by`.
    pub async fn create_tenant(&self, tenant: CreateTenant, created_by: &str) -> Result<Tenant> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "INSERT INTO tenants (id, name, contact_email, contact_phone, address, \
             messages_enabled, contacts_enabled, voicemail_enabled, phone_enabled, \
             retention_years, created_by, created_at, updated_at, is_deleted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0) \
             RETURNING {TENANT_COLUMNS}"
        ))
        .bind(&id)
        .bind(&tenant.name)
        .bind(&tenant.contact_email)
        .bind(&tenant.contact_phone)
        .bind(&tenant.address)
        .bind(tenant.messages_enabled.unwrap_or(true))
        .bind(tenant.contacts_enabled.unwrap_or(true))
        .bind(tenant.voicemail_enabled.unwrap_or(false))
        .bind(tenant.phone_enabled.unwrap_or(false))
        .bind(tenant.retention_years.unwrap_or(1))
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(tenant)
    }

    /// Retrieves a live tenant by id without scope filtering.
    ///
    /// Used where the tenant's existence is a precondition (login, the
    /// assignment workflow) rather than a caller-visible listing.
    pub async fn get_tenant_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(tenant)
    }

    /// Retrieves a live tenant visible to the given scope.
    pub async fn get_tenant_scoped(&self, id: &str, scope: &AccessScope) -> Result<Option<Tenant>> {
        let tenant = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_as::<_, Tenant>(&format!(
                    "SELECT {TENANT_COLUMNS} FROM tenants \
                     WHERE id = ? AND created_by = ? AND is_deleted = 0"
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_as::<_, Tenant>(&format!(
                    "SELECT {TENANT_COLUMNS} FROM tenants \
                     WHERE id = ? AND id = ? AND is_deleted = 0"
                ))
                .bind(id)
                .bind(tenant_id)
                .fetch_optional(self.pool)
                .await?
            }
        };

        Ok(tenant)
    }

    /// Lists the live tenants created by the given SuperAdmin.
    pub async fn get_tenants_by_creator(
        &self,
        created_by: &str,
        pagination: &PaginationFilter,
    ) -> Result<Vec<Tenant>> {
        let limit = pagination.limit() as i64;
        let offset = pagination.offset() as i64;

        let tenants = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants \
             WHERE created_by = ? AND is_deleted = 0 \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(created_by)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(tenants)
    }

    /// Get total count of live tenants for a creator
    pub async fn get_tenants_count_by_creator(&self, created_by: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tenants WHERE created_by = ? AND is_deleted = 0",
        )
        .bind(created_by)
        .fetch_one(self.pool)
        .await?;

        Ok(count as u64)
    }

    /// Applies a partial update; only present fields are written.
    pub async fn update_tenant(&self, id: &str, update: &UpdateTenant) -> Result<Option<Tenant>> {
        let now = Utc::now();

        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "UPDATE tenants SET \
             name = COALESCE(?, name), \
             contact_email = COALESCE(?, contact_email), \
             contact_phone = COALESCE(?, contact_phone), \
             address = COALESCE(?, address), \
             messages_enabled = COALESCE(?, messages_enabled), \
             contacts_enabled = COALESCE(?, contacts_enabled), \
             voicemail_enabled = COALESCE(?, voicemail_enabled), \
             phone_enabled = COALESCE(?, phone_enabled), \
             retention_years = COALESCE(?, retention_years), \
             updated_at = ? \
             WHERE id = ? AND is_deleted = 0 \
             RETURNING {TENANT_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.contact_email)
        .bind(&update.contact_phone)
        .bind(&update.address)
        .bind(update.messages_enabled)
        .bind(update.contacts_enabled)
        .bind(update.voicemail_enabled)
        .bind(update.phone_enabled)
        .bind(update.retention_years)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(tenant)
    }

    /// Soft-deletes a tenant. The row stays for retention purposes.
    pub async fn soft_delete_tenant(&self, id: &str) -> Result<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE tenants SET is_deleted = 1, deleted_at = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
