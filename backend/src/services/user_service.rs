//! User business logic service.
//!
//! Handles user CRUD with tenant scoping and privilege checks. Admin-created
//! users without a supplied password get a temporary one, emailed to them,
//! that expires and forces a change on first login.

use crate::api::common::PaginationFilter;
use crate::auth::policy::AccessScope;
use crate::config::Config;
use crate::database::models::{CreateUser, Role, UpdateUser, User};
use crate::errors::{ServiceError, ServiceResult, validation_message};
use crate::repositories::tenant_repository::TenantRepository;
use crate::repositories::user_repository::{NewUserRow, UserRepository};
use crate::services::email_service::EmailService;
use crate::utils::generate_random_string;
use crate::utils::jwt::Claims;
use bcrypt::{DEFAULT_COST, hash};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;
use validator::Validate;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user on behalf of an admin or SuperAdmin.
    ///
    /// SuperAdmins must name a tenant they created (except when creating
    /// another SuperAdmin, which carries no tenant); tenant Admins always
    /// create into their own tenant, whatever the payload says.
    ///
    /// # Errors
    /// Returns `ServiceError` for validation failures, unknown tenants,
    /// privilege violations, and duplicate emails.
    pub async fn create_user(&self, request: CreateUser, actor: &Claims) -> ServiceResult<User> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        self.validate_business_rules(&request)?;

        let actor_role = Role::from_str(actor.role())
            .map_err(|e| ServiceError::permission_denied(format!("unresolvable role: {e}")))?;
        let scope = AccessScope::from_claims(actor)?;

        // Resolve the tenant the new user will live in.
        let tenant_id = match (actor_role, request.role) {
            (Role::SuperAdmin, Role::SuperAdmin) => None,
            (Role::SuperAdmin, _) => {
                let tenant_id = request.tenant_id.clone().ok_or_else(|| {
                    ServiceError::validation("tenant_id is required for tenant roles")
                })?;
                let tenant_repo = TenantRepository::new(self.pool);
                tenant_repo
                    .get_tenant_scoped(&tenant_id, &scope)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Tenant", &tenant_id))?;
                Some(tenant_id)
            }
            (Role::Admin, Role::SuperAdmin) => {
                return Err(ServiceError::permission_denied(
                    "only a SuperAdmin can create SuperAdmin users",
                ));
            }
            (Role::Admin, _) => {
                // Forced to the admin's own tenant.
                Some(
                    actor
                        .tenant_id()
                        .ok_or_else(|| {
                            ServiceError::unauthenticated("token has no tenant for an Admin role")
                        })?
                        .to_string(),
                )
            }
            _ => {
                return Err(ServiceError::permission_denied(
                    "only SuperAdmin or Admin may create users",
                ));
            }
        };

        let repo = UserRepository::new(self.pool);
        if repo.email_exists(&request.email).await? {
            return Err(ServiceError::already_exists("User", &request.email));
        }

        // Supplied password, or a temporary one that expires.
        let (password, is_temp) = match &request.password {
            Some(password) => (password.clone(), false),
            None => (generate_random_string(16), true),
        };
        let password_hash = Self::hash_password(&password)?;

        let temp_password_expires_at = if is_temp {
            let config = Config::from_env()
                .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?;
            Some(Utc::now() + Duration::hours(config.temp_password_ttl_hours as i64))
        } else {
            None
        };

        let user = repo
            .create_user(NewUserRow {
                tenant_id,
                name: request.name,
                email: request.email,
                password_hash,
                role: request.role,
                phone_number: request.phone_number,
                is_first_login: is_temp,
                temp_password_expires_at,
            })
            .await?;

        if is_temp {
            self.send_temp_password_email(&user, &password).await;
        }

        Ok(user)
    }

    /// Retrieves a user visible to the actor's scope.
    pub async fn get_user_required(&self, id: &str, actor: &Claims) -> ServiceResult<User> {
        let scope = AccessScope::from_claims(actor)?;
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_scoped(id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        Ok(user)
    }

    /// Lists users visible to the actor with a total count.
    pub async fn list_users(
        &self,
        actor: &Claims,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<User>, u64)> {
        let scope = AccessScope::from_claims(actor)?;
        let repo = UserRepository::new(self.pool);
        let users = repo.get_users_scoped(&scope, pagination).await?;
        let total = repo.get_users_count_scoped(&scope).await?;
        Ok((users, total))
    }

    /// Applies a partial update. Role or tenant mutations require
    /// SuperAdmin privilege and are rejected before any write otherwise.
    pub async fn update_user(
        &self,
        id: &str,
        update: UpdateUser,
        actor: &Claims,
    ) -> ServiceResult<User> {
        if let Err(validation_errors) = update.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let actor_role = Role::from_str(actor.role())
            .map_err(|e| ServiceError::permission_denied(format!("unresolvable role: {e}")))?;
        let scope = AccessScope::from_claims(actor)?;

        let repo = UserRepository::new(self.pool);
        repo.get_user_scoped(id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        let wants_privileged_change = update.role.is_some() || update.tenant_id.is_some();
        if wants_privileged_change && !actor_role.is_super_admin() {
            return Err(ServiceError::permission_denied(
                "changing role or tenant requires SuperAdmin privilege",
            ));
        }

        if let Some(email) = &update.email {
            if repo.email_exists_excluding(email, id).await? {
                return Err(ServiceError::already_exists("User", email));
            }
        }

        // Moving a user to another tenant: the target must be in scope.
        if let Some(tenant_id) = &update.tenant_id {
            let tenant_repo = TenantRepository::new(self.pool);
            tenant_repo
                .get_tenant_scoped(tenant_id, &scope)
                .await?
                .ok_or_else(|| ServiceError::not_found("Tenant", tenant_id))?;
        }

        let user = repo
            .update_profile(id, update.name.as_deref(), update.email.as_deref())
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        let user = if wants_privileged_change {
            repo.update_role_and_tenant(id, update.role, update.tenant_id.as_deref())
                .await?
                .ok_or_else(|| ServiceError::not_found("User", id))?
        } else {
            user
        };

        Ok(user)
    }

    /// Soft-deletes a user visible to the actor's scope.
    pub async fn delete_user(&self, id: &str, actor: &Claims) -> ServiceResult<()> {
        if actor.user_id() == id {
            return Err(ServiceError::invalid_operation(
                "cannot delete your own account",
            ));
        }

        let scope = AccessScope::from_claims(actor)?;
        let repo = UserRepository::new(self.pool);
        repo.get_user_scoped(id, &scope)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        repo.soft_delete_user(id).await?;
        Ok(())
    }

    /// Function to hash a password before storing in database
    pub fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {e}")))
    }

    /// Business validation rules.
    fn validate_business_rules(&self, request: &CreateUser) -> ServiceResult<()> {
        // Validate name doesn't start with numbers or special characters
        if request
            .name
            .chars()
            .next()
            .is_some_and(|c| c.is_numeric() || !c.is_alphanumeric())
        {
            return Err(ServiceError::validation(
                "User name must start with a letter",
            ));
        }

        Ok(())
    }

    /// Best-effort delivery of the temporary password; failure is logged
    /// and does not roll back the created user.
    async fn send_temp_password_email(&self, user: &User, password: &str) {
        let result = async {
            let config = Config::from_env()
                .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?;
            let email_service = EmailService::new(config.email)?;
            email_service
                .send_temp_password_email(&user.email, &user.name, password)
                .await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id = %user.id, "failed to send temp password email: {e}");
        }
    }
}
