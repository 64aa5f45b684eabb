//! Tenant business logic service.
//!
//! Tenants are created and managed exclusively by SuperAdmins; every
//! operation here runs against the creator's scope, so one SuperAdmin can
//! never see or touch another SuperAdmin's tenants.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::database::models::{CreateTenant, Tenant, UpdateTenant};
use crate::errors::{ServiceError, ServiceResult, validation_message};
use crate::repositories::tenant_repository::TenantRepository;
use crate::utils::jwt::Claims;
use sqlx::SqlitePool;
use validator::Validate;

pub struct TenantService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> TenantService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new tenant owned by the acting SuperAdmin.
    pub async fn create_tenant(
        &self,
        request: CreateTenant,
        actor: &Claims,
    ) -> ServiceResult<Tenant> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let repo = TenantRepository::new(self.pool);
        let tenant = repo.create_tenant(request, actor.user_id()).await?;

        tracing::info!(tenant_id = %tenant.id, name = %tenant.name, "tenant created");
        Ok(tenant)
    }

    /// Retrieves a tenant visible to the actor's scope.
    pub async fn get_tenant_required(&self, id: &str, actor: &Claims) -> ServiceResult<Tenant> {
        let scope = AccessScope::from_claims(actor)?;
        let repo = TenantRepository::new(self.pool);
        let tenant = repo
            .get_tenant_scoped(id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", id))?;
        Ok(tenant)
    }

    /// Lists the actor's tenants with a total count for pagination.
    pub async fn list_tenants(
        &self,
        actor: &Claims,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Tenant>, u64)> {
        let repo = TenantRepository::new(self.pool);
        let tenants = repo
            .get_tenants_by_creator(actor.user_id(), pagination)
            .await?;
        let total = repo.get_tenants_count_by_creator(actor.user_id()).await?;
        Ok((tenants, total))
    }

    /// Applies a partial update to a tenant in the actor's scope.
    pub async fn update_tenant(
        &self,
        id: &str,
        update: UpdateTenant,
        actor: &Claims,
    ) -> ServiceResult<Tenant> {
        if let Err(validation_errors) = update.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        // Scope check before any write.
        self.get_tenant_required(id, actor).await?;

        let repo = TenantRepository::new(self.pool);
        let tenant = repo
            .update_tenant(id, &update)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", id))?;
        Ok(tenant)
    }

    /// Soft-deletes a tenant in the actor's scope.
    pub async fn delete_tenant(&self, id: &str, actor: &Claims) -> ServiceResult<()> {
        self.get_tenant_required(id, actor).await?;

        let repo = TenantRepository::new(self.pool);
        repo.soft_delete_tenant(id).await?;

        tracing::info!(tenant_id = %id, "tenant soft-deleted");
        Ok(())
    }
}
