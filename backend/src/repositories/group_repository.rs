//! Database repository for tenant group management.
//!
//! Group names are unique within their tenant (among live rows). Member
//! rows live in the `group_members` join table; the service layer checks
//! that members belong to the group's tenant before they are written.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::database::models::Group;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const GROUP_COLUMNS: &str = "id, tenant_id, name, description, phone_number, \
    is_active, created_at, updated_at, is_deleted, deleted_at";

/// Repository for group database operations.
pub struct GroupRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> GroupRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new group in the given tenant.
    pub async fn create_group(
        &self,
        tenant_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Group> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        let group = sqlx::query_as::<_, Group>(&format!(
            "INSERT INTO tenant_groups (id, tenant_id, name, description, \
             is_active, created_at, updated_at, is_deleted) \
             VALUES (?, ?, ?, ?, 1, ?, ?, 0) \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(&id)
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(group)
    }

    /// Retrieves a live group by id without scope filtering (workflow use).
    pub async fn get_group_by_id(&self, id: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM tenant_groups WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(group)
    }

    /// Retrieves a live group visible to the given scope.
    pub async fn get_group_scoped(&self, id: &str, scope: &AccessScope) -> Result<Option<Group>> {
        let group = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_as::<_, Group>(&format!(
                    "SELECT {GROUP_COLUMNS} FROM tenant_groups g \
                     WHERE g.id = ? AND g.is_deleted = 0 AND EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = g.tenant_id AND t.created_by = ? AND t.is_deleted = 0)"
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_as::<_, Group>(&format!(
                    "SELECT {GROUP_COLUMNS} FROM tenant_groups \
                     WHERE id = ? AND tenant_id = ? AND is_deleted = 0"
                ))
                .bind(id)
                .bind(tenant_id)
                .fetch_optional(self.pool)
                .await?
            }
        };

        Ok(group)
    }

    /// Lists live groups visible to the given scope, newest first.
    pub async fn get_groups_scoped(
        &self,
        scope: &AccessScope,
        pagination: &PaginationFilter,
    ) -> Result<Vec<Group>> {
        let limit = pagination.limit() as i64;
        let offset = pagination.offset() as i64;

        let groups = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_as::<_, Group>(&format!(
                    "SELECT {GROUP_COLUMNS} FROM tenant_groups g \
                     WHERE g.is_deleted = 0 AND EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = g.tenant_id AND t.created_by = ? AND t.is_deleted = 0) \
                     ORDER BY g.created_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_as::<_, Group>(&format!(
                    "SELECT {GROUP_COLUMNS} FROM tenant_groups \
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

        Ok(groups)
    }

    /// Get total count of live groups visible to the scope
    pub async fn get_groups_count_scoped(&self, scope: &AccessScope) -> Result<u64> {
        let count: i64 = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM tenant_groups g \
                     WHERE g.is_deleted = 0 AND EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = g.tenant_id AND t.created_by = ? AND t.is_deleted = 0)",
                )
                .bind(user_id)
                .fetch_one(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM tenant_groups WHERE tenant_id = ? AND is_deleted = 0",
                )
                .bind(tenant_id)
                .fetch_one(self.pool)
                .await?
            }
        };

        Ok(count as u64)
    }

    /// Checks if a group name is already taken within a tenant.
    pub async fn group_name_exists(&self, tenant_id: &str, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tenant_groups \
             WHERE tenant_id = ? AND name = ? AND is_deleted = 0",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Checks if a group name is taken within a tenant by another group.
    pub async fn group_name_exists_excluding(
        &self,
        tenant_id: &str,
        name: &str,
        exclude_group_id: &str,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tenant_groups \
             WHERE tenant_id = ? AND name = ? AND id != ? AND is_deleted = 0",
        )
        .bind(tenant_id)
        .bind(name)
        .bind(exclude_group_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Applies a partial update; only present fields are written.
    pub async fn update_group(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<Group>> {
        let now = Utc::now();

        let group = sqlx::query_as::<_, Group>(&format!(
            "UPDATE tenant_groups SET \
             name = COALESCE(?, name), \
             description = COALESCE(?, description), \
             is_active = COALESCE(?, is_active), \
             updated_at = ? \
             WHERE id = ? AND is_deleted = 0 \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .bind(is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(group)
    }

    /// Soft-deletes a group and drops its membership rows.
    pub async fn soft_delete_group(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE tenant_groups SET is_deleted = 1, deleted_at = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM group_members WHERE group_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the member user ids of a group.
    pub async fn get_member_ids(&self, group_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT user_id FROM group_members WHERE group_id = ? ORDER BY added_at",
        )
        .bind(group_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Replaces the full member set of a group in one transaction.
    pub async fn replace_members(&self, group_id: &str, member_ids: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM group_members WHERE group_id = ?")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        for user_id in member_ids {
            sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES (?, ?)")
                .bind(group_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Counts how many of the given users belong to the given tenant and
    /// are live. Used to validate member sets in one query.
    pub async fn count_users_in_tenant(&self, tenant_id: &str, user_ids: &[String]) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "SELECT COUNT(*) FROM users \
             WHERE tenant_id = ? AND is_deleted = 0 AND id IN ({placeholders})"
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(tenant_id);
        for user_id in user_ids {
            query = query.bind(user_id);
        }

        let count = query.fetch_one(self.pool).await?;
        Ok(count as u64)
    }
}
