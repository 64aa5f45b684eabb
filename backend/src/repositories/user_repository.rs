//! Database repository for user management operations.
//!
//! Provides CRUD operations for system users. Tenant-scoped callers only
//! ever see users of their own tenant; SuperAdmins see users across the
//! tenants they created. Emails are stored lowercased so the system-wide
//! uniqueness check is case-insensitive.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::database::models::{Role, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, tenant_id, name, email, password_hash, role, \
    phone_number, is_first_login, temp_password_expires_at, \
    created_at, updated_at, is_deleted, deleted_at";

/// Fully-resolved insert row for a user.
pub struct NewUserRow {
    pub tenant_id: Option<String>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub is_first_login: bool,
    pub temp_password_expires_at: Option<DateTime<Utc>>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    pub async fn create_user(&self, row: NewUserRow) -> Result<User> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();
        let email = row.email.to_lowercase();

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, tenant_id, name, email, password_hash, role, \
             phone_number, is_first_login, temp_password_expires_at, \
             created_at, updated_at, is_deleted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&id)
        .bind(&row.tenant_id)
        .bind(&row.name)
        .bind(&email)
        .bind(&row.password_hash)
        .bind(row.role)
        .bind(&row.phone_number)
        .bind(row.is_first_login)
        .bind(row.temp_password_expires_at)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a live user by id without scope filtering.
    ///
    /// For internal flows (login, token refresh); API reads go through
    /// [`Self::get_user_scoped`].
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a live user by email (case-insensitive).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND is_deleted = 0"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a live user visible to the given scope.
    pub async fn get_user_scoped(&self, id: &str, scope: &AccessScope) -> Result<Option<User>> {
        let user = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users u \
                     WHERE u.id = ? AND u.is_deleted = 0 AND EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = u.tenant_id AND t.created_by = ? AND t.is_deleted = 0)"
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE id = ? AND tenant_id = ? AND is_deleted = 0"
                ))
                .bind(id)
                .bind(tenant_id)
                .fetch_optional(self.pool)
                .await?
            }
        };

        Ok(user)
    }

    /// Lists live users visible to the given scope, newest first.
    pub async fn get_users_scoped(
        &self,
        scope: &AccessScope,
        pagination: &PaginationFilter,
    ) -> Result<Vec<User>> {
        let limit = pagination.limit() as i64;
        let offset = pagination.offset() as i64;

        let users = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users u \
                     WHERE u.is_deleted = 0 AND EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = u.tenant_id AND t.created_by = ? AND t.is_deleted = 0) \
                     ORDER BY u.created_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE tenant_id = ? AND is_deleted = 0 \
                     ORDER BY created_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(tenant_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(users)
    }

    /// Get total count of live users visible to the scope
    pub async fn get_users_count_scoped(&self, scope: &AccessScope) -> Result<u64> {
        let count: i64 = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users u \
                     WHERE u.is_deleted = 0 AND EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = u.tenant_id AND t.created_by = ? AND t.is_deleted = 0)",
                )
                .bind(user_id)
                .fetch_one(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users WHERE tenant_id = ? AND is_deleted = 0",
                )
                .bind(tenant_id)
                .fetch_one(self.pool)
                .await?
            }
        };

        Ok(count as u64)
    }

    /// Checks if an email already exists in the system (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND is_deleted = 0")
                .bind(email.to_lowercase())
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Checks if email exists excluding a specific user.
    pub async fn email_exists_excluding(&self, email: &str, exclude_user_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? AND id != ? AND is_deleted = 0",
        )
        .bind(email.to_lowercase())
        .bind(exclude_user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Applies a partial profile update (name/email only). Role and tenant
    /// moves go through [`Self::update_role_and_tenant`] after the service
    /// has checked privileges.
    pub async fn update_profile(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        let now = Utc::now();
        let email = email.map(|e| e.to_lowercase());

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
             name = COALESCE(?, name), \
             email = COALESCE(?, email), \
             updated_at = ? \
             WHERE id = ? AND is_deleted = 0 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// SuperAdmin-only mutation of role and tenant membership.
    pub async fn update_role_and_tenant(
        &self,
        id: &str,
        role: Option<Role>,
        tenant_id: Option<&str>,
    ) -> Result<Option<User>> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
             role = COALESCE(?, role), \
             tenant_id = COALESCE(?, tenant_id), \
             updated_at = ? \
             WHERE id = ? AND is_deleted = 0 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(role)
        .bind(tenant_id)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Replaces the password hash and clears first-login state.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, is_first_login = 0, \
             temp_password_expires_at = NULL, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-deletes a user.
    pub async fn soft_delete_user(&self, id: &str) -> Result<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET is_deleted = 1, deleted_at = ?, updated_at = ? \
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
