//! Database repository for phone-number assignment records.
//!
//! Assignment rows are never hard-deleted: unassignment deactivates the row
//! and stamps who did it and when, so the table doubles as an audit trail.
//! A row counts as holding its number until it is unassigned, whether it is
//! currently active or suspended; a partial unique index over unreleased
//! rows guarantees at most one holder per number. The transactional writes
//! that pair an assignment row with the owner's denormalized `phone_number`
//! field live in the workflow service.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::database::models::PhoneAssignment;
use anyhow::Result;
use sqlx::SqlitePool;

const ASSIGNMENT_COLUMNS: &str = "id, phone_number, tenant_id, owner_type, owner_id, \
    assigned_by, assigned_at, unassigned_at, unassigned_by, is_active";

/// Repository for phone assignment database operations.
pub struct PhoneAssignmentRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> PhoneAssignmentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Retrieves an assignment by id, active or not.
    pub async fn get_assignment_by_id(&self, id: &str) -> Result<Option<PhoneAssignment>> {
        let assignment = sqlx::query_as::<_, PhoneAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM phone_assignments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(assignment)
    }

    /// Retrieves the unreleased assignment holding a number, if any.
    /// Suspended assignments still hold their number.
    pub async fn get_held_by_number(&self, phone_number: &str) -> Result<Option<PhoneAssignment>> {
        let assignment = sqlx::query_as::<_, PhoneAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM phone_assignments \
             WHERE phone_number = ? AND unassigned_at IS NULL"
        ))
        .bind(phone_number)
        .fetch_optional(self.pool)
        .await?;

        Ok(assignment)
    }

    /// Lists assignments visible to the given scope, newest first.
    pub async fn get_assignments_scoped(
        &self,
        scope: &AccessScope,
        pagination: &PaginationFilter,
    ) -> Result<Vec<PhoneAssignment>> {
        let limit = pagination.limit() as i64;
        let offset = pagination.offset() as i64;

        let assignments = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_as::<_, PhoneAssignment>(&format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM phone_assignments a \
                     WHERE EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = a.tenant_id AND t.created_by = ? AND t.is_deleted = 0) \
                     ORDER BY a.assigned_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_as::<_, PhoneAssignment>(&format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM phone_assignments \
                     WHERE tenant_id = ? \
                     ORDER BY assigned_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(tenant_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(assignments)
    }

    /// Get total count of assignments visible to the scope
    pub async fn get_assignments_count_scoped(&self, scope: &AccessScope) -> Result<u64> {
        let count: i64 = match scope {
            AccessScope::Creator { user_id } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM phone_assignments a \
                     WHERE EXISTS ( \
                         SELECT 1 FROM tenants t \
                         WHERE t.id = a.tenant_id AND t.created_by = ? AND t.is_deleted = 0)",
                )
                .bind(user_id)
                .fetch_one(self.pool)
                .await?
            }
            AccessScope::Tenant { tenant_id } => {
                sqlx::query_scalar("SELECT COUNT(*) FROM phone_assignments WHERE tenant_id = ?")
                    .bind(tenant_id)
                    .fetch_one(self.pool)
                    .await?
            }
        };

        Ok(count as u64)
    }
}
