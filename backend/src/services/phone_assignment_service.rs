//! Phone assignment workflow service.
//!
//! Binds a phone number to exactly one owner (a user or a group) within a
//! tenant. The owner's denormalized `phone_number` column and the
//! assignment record are written in one transaction, so the two can never
//! diverge: either both writes land or neither does.
//!
//! A number stays held until its assignment is unassigned: suspending an
//! assignment (`set_active(false)`) keeps the hold and the owner's number,
//! so a suspended number can never be handed to a second owner. The
//! partial unique index over unreleased assignments makes the workflow
//! lose cleanly when two concurrent assigns race for the same number.
//!
//! Assignments are deactivated, never hard-deleted. `assign` is not
//! idempotent by design: a second call for the same number fails with a
//! conflict, which is the desired behavior.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::database::models::{CreatePhoneAssignment, OwnerType, PhoneAssignment};
use crate::errors::{ServiceError, ServiceResult, validation_message};
use crate::repositories::group_repository::GroupRepository;
use crate::repositories::phone_assignment_repository::PhoneAssignmentRepository;
use crate::repositories::tenant_repository::TenantRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::jwt::Claims;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const ASSIGNMENT_COLUMNS: &str = "id, phone_number, tenant_id, owner_type, owner_id, \
    assigned_by, assigned_at, unassigned_at, unassigned_by, is_active";

pub struct PhoneAssignmentService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> PhoneAssignmentService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Assigns a phone number to a user or group within a tenant.
    ///
    /// # Errors
    /// - `Validation` for malformed input
    /// - `NotFound` when the tenant is absent, deleted, or outside the
    ///   actor's scope, or when the owner is absent from the tenant
    /// - `InvalidOperation` when the owner already holds a number
    /// - `AlreadyExists` when the number is already held (actively or by
    ///   a suspended assignment)
    pub async fn assign(
        &self,
        request: CreatePhoneAssignment,
        actor: &Claims,
    ) -> ServiceResult<PhoneAssignment> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let scope = AccessScope::from_claims(actor)?;

        // Tenant must exist, be live, and be visible to the actor.
        let tenant_repo = TenantRepository::new(self.pool);
        tenant_repo
            .get_tenant_scoped(&request.tenant_id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", &request.tenant_id))?;

        // Owner must exist in that tenant and be live.
        if !self
            .owner_exists(&request.tenant_id, request.owner_type, &request.owner_id)
            .await?
        {
            return Err(ServiceError::not_found(
                match request.owner_type {
                    OwnerType::User => "User",
                    OwnerType::Group => "Group",
                },
                &request.owner_id,
            ));
        }

        // Suspended assignments still hold their number; only unassign
        // releases it. The partial unique index is the backstop for the
        // race between two concurrent assigns.
        let assignment_repo = PhoneAssignmentRepository::new(self.pool);
        if assignment_repo
            .get_held_by_number(&request.phone_number)
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "Phone assignment",
                &request.phone_number,
            ));
        }

        // Both writes inside one transaction: owner field + assignment row.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Database { source: e.into() })?;

        let owner_table = owner_table(request.owner_type);
        let rows_affected = sqlx::query(&format!(
            "UPDATE {owner_table} SET phone_number = ?, updated_at = ? \
             WHERE id = ? AND tenant_id = ? AND is_deleted = 0 AND phone_number IS NULL"
        ))
        .bind(&request.phone_number)
        .bind(Utc::now())
        .bind(&request.owner_id)
        .bind(&request.tenant_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?
        .rows_affected();

        // The guard condition (`phone_number IS NULL`) is what rejects an
        // owner that already holds a number, including one who gained it
        // after the checks above. Dropping the tx rolls back.
        if rows_affected == 0 {
            return Err(ServiceError::invalid_operation(
                "owner already holds a phone number; unassign it first",
            ));
        }

        let id = Uuid::now_v7().to_string();
        let assignment = sqlx::query_as::<_, PhoneAssignment>(&format!(
            "INSERT INTO phone_assignments \
             (id, phone_number, tenant_id, owner_type, owner_id, assigned_by, assigned_at, is_active) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 1) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(&id)
        .bind(&request.phone_number)
        .bind(&request.tenant_id)
        .bind(request.owner_type)
        .bind(&request.owner_id)
        .bind(actor.user_id())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                ServiceError::already_exists("Phone assignment", &request.phone_number)
            } else {
                ServiceError::Database { source: e.into() }
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| ServiceError::Database { source: e.into() })?;

        tracing::info!(
            phone_number = %assignment.phone_number,
            owner_type = %assignment.owner_type,
            owner_id = %assignment.owner_id,
            "phone number assigned"
        );

        Ok(assignment)
    }

    /// Releases an assignment: clears the owner's number and deactivates
    /// the record, atomically. Works on suspended assignments too, since
    /// they still hold their number.
    pub async fn unassign(
        &self,
        assignment_id: &str,
        actor: &Claims,
    ) -> ServiceResult<PhoneAssignment> {
        let assignment = self.get_held_scoped(assignment_id, actor).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Database { source: e.into() })?;

        let owner_table = owner_table(assignment.owner_type);
        sqlx::query(&format!(
            "UPDATE {owner_table} SET phone_number = NULL, updated_at = ? \
             WHERE id = ? AND phone_number = ?"
        ))
        .bind(Utc::now())
        .bind(&assignment.owner_id)
        .bind(&assignment.phone_number)
        .execute(&mut *tx)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?;

        let released = sqlx::query_as::<_, PhoneAssignment>(&format!(
            "UPDATE phone_assignments \
             SET is_active = 0, unassigned_at = ?, unassigned_by = ? \
             WHERE id = ? AND unassigned_at IS NULL \
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(actor.user_id())
        .bind(assignment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?
        .ok_or_else(|| ServiceError::not_found("Phone assignment", assignment_id))?;

        tx.commit()
            .await
            .map_err(|e| ServiceError::Database { source: e.into() })?;

        tracing::info!(
            phone_number = %released.phone_number,
            "phone number unassigned"
        );

        Ok(released)
    }

    /// Toggles the active flag without touching the owner's denormalized
    /// field or the number's hold. Used for temporary suspension; a
    /// suspended owner keeps the number and can be reactivated any time.
    /// Released assignments are history and cannot be toggled.
    pub async fn set_active(
        &self,
        assignment_id: &str,
        is_active: bool,
        actor: &Claims,
    ) -> ServiceResult<PhoneAssignment> {
        let assignment = self.get_held_scoped(assignment_id, actor).await?;

        let updated = sqlx::query_as::<_, PhoneAssignment>(&format!(
            "UPDATE phone_assignments SET is_active = ? \
             WHERE id = ? AND unassigned_at IS NULL \
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(is_active)
        .bind(&assignment.id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?
        .ok_or_else(|| ServiceError::not_found("Phone assignment", assignment_id))?;

        Ok(updated)
    }

    /// Lists assignments visible to the actor with a total count.
    pub async fn list_assignments(
        &self,
        actor: &Claims,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<PhoneAssignment>, u64)> {
        let scope = AccessScope::from_claims(actor)?;
        let repo = PhoneAssignmentRepository::new(self.pool);
        let assignments = repo.get_assignments_scoped(&scope, pagination).await?;
        let total = repo.get_assignments_count_scoped(&scope).await?;
        Ok((assignments, total))
    }

    /// Loads an unreleased assignment (active or suspended) that is
    /// visible to the actor's scope.
    async fn get_held_scoped(
        &self,
        assignment_id: &str,
        actor: &Claims,
    ) -> ServiceResult<PhoneAssignment> {
        let scope = AccessScope::from_claims(actor)?;

        let repo = PhoneAssignmentRepository::new(self.pool);
        let assignment = repo
            .get_assignment_by_id(assignment_id)
            .await?
            .filter(|a| a.unassigned_at.is_none())
            .ok_or_else(|| ServiceError::not_found("Phone assignment", assignment_id))?;

        let tenant_repo = TenantRepository::new(self.pool);
        tenant_repo
            .get_tenant_scoped(&assignment.tenant_id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("Phone assignment", assignment_id))?;

        Ok(assignment)
    }

    /// Checks that the owner exists in the tenant as a live record.
    async fn owner_exists(
        &self,
        tenant_id: &str,
        owner_type: OwnerType,
        owner_id: &str,
    ) -> ServiceResult<bool> {
        let scope = AccessScope::Tenant {
            tenant_id: tenant_id.to_string(),
        };
        match owner_type {
            OwnerType::User => {
                let user_repo = UserRepository::new(self.pool);
                Ok(user_repo.get_user_scoped(owner_id, &scope).await?.is_some())
            }
            OwnerType::Group => {
                let group_repo = GroupRepository::new(self.pool);
                Ok(group_repo
                    .get_group_scoped(owner_id, &scope)
                    .await?
                    .is_some())
            }
        }
    }
}

fn owner_table(owner_type: OwnerType) -> &'static str {
    match owner_type {
        OwnerType::User => "users",
        OwnerType::Group => "tenant_groups",
    }
}
