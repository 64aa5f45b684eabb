//! Group business logic service.
//!
//! Groups live inside exactly one tenant; names are unique per tenant and
//! every member must belong to that same tenant. Member sets are replaced
//! wholesale on update.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::database::models::{CreateGroup, Group, GroupWithMembers, UpdateGroup};
use crate::errors::{ServiceError, ServiceResult, validation_message};
use crate::repositories::group_repository::GroupRepository;
use crate::repositories::tenant_repository::TenantRepository;
use crate::utils::jwt::Claims;
use sqlx::SqlitePool;
use validator::Validate;

pub struct GroupService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> GroupService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a group, optionally with an initial member set.
    pub async fn create_group(
        &self,
        request: CreateGroup,
        actor: &Claims,
    ) -> ServiceResult<GroupWithMembers> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let scope = AccessScope::from_claims(actor)?;

        // SuperAdmins must name a tenant; tenant roles are pinned to theirs.
        let tenant_id = match &scope {
            AccessScope::Creator { .. } => request.tenant_id.clone().ok_or_else(|| {
                ServiceError::validation("tenant_id is required when creating as SuperAdmin")
            })?,
            AccessScope::Tenant { tenant_id } => tenant_id.clone(),
        };

        let tenant_repo = TenantRepository::new(self.pool);
        tenant_repo
            .get_tenant_scoped(&tenant_id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", &tenant_id))?;

        let repo = GroupRepository::new(self.pool);
        if repo.group_name_exists(&tenant_id, &request.name).await? {
            return Err(ServiceError::already_exists("Group", &request.name));
        }

        self.validate_members(&tenant_id, &request.member_ids).await?;

        let group = repo
            .create_group(&tenant_id, &request.name, request.description.as_deref())
            .await?;

        if !request.member_ids.is_empty() {
            repo.replace_members(&group.id, &request.member_ids).await?;
        }

        Ok(GroupWithMembers {
            group,
            member_ids: request.member_ids,
        })
    }

    /// Retrieves a group with its members, within the actor's scope.
    pub async fn get_group_required(
        &self,
        id: &str,
        actor: &Claims,
    ) -> ServiceResult<GroupWithMembers> {
        let scope = AccessScope::from_claims(actor)?;
        let repo = GroupRepository::new(self.pool);
        let group = repo
            .get_group_scoped(id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("Group", id))?;
        let member_ids = repo.get_member_ids(id).await?;
        Ok(GroupWithMembers { group, member_ids })
    }

    /// Lists groups visible to the actor with a total count.
    pub async fn list_groups(
        &self,
        actor: &Claims,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Group>, u64)> {
        let scope = AccessScope::from_claims(actor)?;
        let repo = GroupRepository::new(self.pool);
        let groups = repo.get_groups_scoped(&scope, pagination).await?;
        let total = repo.get_groups_count_scoped(&scope).await?;
        Ok((groups, total))
    }

    /// Applies a partial update; a present `member_ids` replaces the set.
    pub async fn update_group(
        &self,
        id: &str,
        update: UpdateGroup,
        actor: &Claims,
    ) -> ServiceResult<GroupWithMembers> {
        if let Err(validation_errors) = update.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let scope = AccessScope::from_claims(actor)?;
        let repo = GroupRepository::new(self.pool);
        let existing = repo
            .get_group_scoped(id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("Group", id))?;

        if let Some(name) = &update.name {
            if repo
                .group_name_exists_excluding(&existing.tenant_id, name, id)
                .await?
            {
                return Err(ServiceError::already_exists("Group", name));
            }
        }

        if let Some(member_ids) = &update.member_ids {
            self.validate_members(&existing.tenant_id, member_ids).await?;
        }

        let group = repo
            .update_group(
                id,
                update.name.as_deref(),
                update.description.as_deref(),
                update.is_active,
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("Group", id))?;

        if let Some(member_ids) = &update.member_ids {
            repo.replace_members(id, member_ids).await?;
        }

        let member_ids = repo.get_member_ids(id).await?;
        Ok(GroupWithMembers { group, member_ids })
    }

    /// Soft-deletes a group in the actor's scope.
    pub async fn delete_group(&self, id: &str, actor: &Claims) -> ServiceResult<()> {
        let scope = AccessScope::from_claims(actor)?;
        let repo = GroupRepository::new(self.pool);
        repo.get_group_scoped(id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("Group", id))?;

        repo.soft_delete_group(id).await?;
        Ok(())
    }

    /// Every proposed member must be a live user of the group's tenant.
    async fn validate_members(&self, tenant_id: &str, member_ids: &[String]) -> ServiceResult<()> {
        if member_ids.is_empty() {
            return Ok(());
        }

        let repo = GroupRepository::new(self.pool);
        let found = repo.count_users_in_tenant(tenant_id, member_ids).await?;
        if found != member_ids.len() as u64 {
            return Err(ServiceError::validation(
                "all group members must be existing users of the group's tenant",
            ));
        }

        Ok(())
    }
}
