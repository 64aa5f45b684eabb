//! Core authentication business logic.
//!
//! Login, self-service registration, password reset and change. Login
//! failures never distinguish "no such user" from "wrong password", and
//! forgot-password answers identically whether or not the address exists.

use crate::auth::models::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest, TenantFeatures, UserInfo,
};
use crate::config::Config;
use crate::database::models::{Role, Tenant, User};
use crate::errors::{ServiceError, ServiceResult, validation_message};
use crate::repositories::reset_token_repository::ResetTokenRepository;
use crate::repositories::tenant_repository::TenantRepository;
use crate::repositories::user_repository::{NewUserRow, UserRepository};
use crate::services::email_service::EmailService;
use crate::services::user_service::UserService;
use crate::utils::jwt::{Claims, JwtUtils, TokenTtl};
use bcrypt::verify;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use validator::Validate;

pub struct AuthService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    jwt: JwtUtils,
}

impl<'a> AuthService<'a> {
    /// Creates a new AuthService around the process-wide signing keys.
    pub fn new(pool: &'a SqlitePool, jwt: JwtUtils) -> Self {
        Self { pool, jwt }
    }

    /// Authenticates a user and issues a session token.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let user_repo = UserRepository::new(self.pool);
        let user = user_repo
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| ServiceError::unauthenticated("invalid email or password"))?;

        // A temporary password that sat unused too long is dead.
        if user.is_first_login {
            if let Some(expires_at) = user.temp_password_expires_at {
                if expires_at <= Utc::now() {
                    return Err(ServiceError::unauthenticated(
                        "temporary password expired; ask an administrator to recreate it",
                    ));
                }
            }
        }

        let matches = verify(&request.password, &user.password_hash)
            .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {e}")))?;
        if !matches {
            return Err(ServiceError::unauthenticated("invalid email or password"));
        }

        let tenant = self.load_login_tenant(&user).await?;

        let access_token = self.jwt.generate_token(
            user.id.clone(),
            user.email.clone(),
            user.role.to_string(),
            user.tenant_id.clone(),
            TokenTtl::Session,
        )?;

        Ok(LoginResponse {
            access_token,
            expires_in: self.jwt.ttl_seconds(TokenTtl::Session),
            must_change_password: user.is_first_login,
            user: build_user_info(user, tenant),
        })
    }

    /// Self-service registration into an existing tenant.
    ///
    /// SuperAdmin accounts cannot be created through this endpoint.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<User> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let role = request.role.unwrap_or(Role::OrgUser);
        if role.is_super_admin() {
            return Err(ServiceError::permission_denied(
                "SuperAdmin accounts cannot be self-registered",
            ));
        }

        let tenant_repo = TenantRepository::new(self.pool);
        tenant_repo
            .get_tenant_by_id(&request.tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", &request.tenant_id))?;

        let user_repo = UserRepository::new(self.pool);
        if user_repo.email_exists(&request.email).await? {
            return Err(ServiceError::already_exists("User", &request.email));
        }

        let password_hash = UserService::hash_password(&request.password)?;

        let user = user_repo
            .create_user(NewUserRow {
                tenant_id: Some(request.tenant_id),
                name: request.name,
                email: request.email,
                password_hash,
                role,
                phone_number: request.phone_number,
                is_first_login: false,
                temp_password_expires_at: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Returns the current user's info from verified claims.
    pub async fn me(&self, claims: &Claims) -> ServiceResult<UserInfo> {
        let user_repo = UserRepository::new(self.pool);
        let user = user_repo
            .get_user_by_id(claims.user_id())
            .await?
            .ok_or_else(|| ServiceError::not_found("User", claims.user_id()))?;

        let tenant = match &user.tenant_id {
            Some(tenant_id) => {
                let tenant_repo = TenantRepository::new(self.pool);
                tenant_repo.get_tenant_by_id(tenant_id).await?
            }
            None => None,
        };

        Ok(build_user_info(user, tenant))
    }

    /// Issues a single-use, 15-minute reset token and emails the link.
    ///
    /// Responds identically whether or not the address exists.
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> ServiceResult<()> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let user_repo = UserRepository::new(self.pool);
        let Some(user) = user_repo.get_user_by_email(&request.email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let token = self.jwt.generate_token(
            user.id.clone(),
            user.email.clone(),
            user.role.to_string(),
            user.tenant_id.clone(),
            TokenTtl::PasswordReset,
        )?;

        let expires_at =
            Utc::now() + Duration::seconds(self.jwt.ttl_seconds(TokenTtl::PasswordReset) as i64);

        let token_repo = ResetTokenRepository::new(self.pool);
        token_repo.create_token(&token, &user.id, expires_at).await?;

        self.send_reset_email(&user, &token).await;
        Ok(())
    }

    /// Consumes a reset token and sets the new password.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> ServiceResult<()> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        // Signature and expiry first, then the single-use record.
        let claims = self.jwt.validate_token(&request.token)?;

        let token_repo = ResetTokenRepository::new(self.pool);
        let record = token_repo
            .get_valid_token(&request.token)
            .await?
            .ok_or_else(|| {
                ServiceError::unauthenticated("reset token is invalid, used, or expired")
            })?;

        if record.user_id != claims.user_id() {
            return Err(ServiceError::unauthenticated("reset token is invalid"));
        }

        let password_hash = UserService::hash_password(&request.new_password)?;

        let user_repo = UserRepository::new(self.pool);
        if !user_repo
            .update_password(&record.user_id, &password_hash)
            .await?
        {
            return Err(ServiceError::not_found("User", &record.user_id));
        }

        token_repo.mark_used(&request.token).await?;

        tracing::info!(user_id = %record.user_id, "password reset completed");
        Ok(())
    }

    /// Changes the password of the authenticated user.
    pub async fn change_password(
        &self,
        claims: &Claims,
        request: ChangePasswordRequest,
    ) -> ServiceResult<()> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_message(
                validation_errors,
            )));
        }

        let user_repo = UserRepository::new(self.pool);
        let user = user_repo
            .get_user_by_id(claims.user_id())
            .await?
            .ok_or_else(|| ServiceError::not_found("User", claims.user_id()))?;

        let matches = verify(&request.current_password, &user.password_hash)
            .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {e}")))?;
        if !matches {
            return Err(ServiceError::unauthenticated("current password is wrong"));
        }

        let password_hash = UserService::hash_password(&request.new_password)?;
        user_repo.update_password(&user.id, &password_hash).await?;

        Ok(())
    }

    /// Login requires the user's tenant (when they have one) to be live.
    async fn load_login_tenant(&self, user: &User) -> ServiceResult<Option<Tenant>> {
        let Some(tenant_id) = &user.tenant_id else {
            return Ok(None);
        };

        let tenant_repo = TenantRepository::new(self.pool);
        let tenant = tenant_repo
            .get_tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| ServiceError::permission_denied("tenant is deactivated"))?;

        Ok(Some(tenant))
    }

    /// Best-effort reset mail; failure is logged, the token stays valid.
    async fn send_reset_email(&self, user: &User, token: &str) {
        let result = async {
            let config = Config::from_env()
                .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?;
            let email_service = EmailService::new(config.email)?;
            email_service
                .send_password_reset_email(&user.email, &user.name, token)
                .await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id = %user.id, "failed to send reset email: {e}");
        }
    }
}

fn build_user_info(user: User, tenant: Option<Tenant>) -> UserInfo {
    let features = tenant.as_ref().map(|t| TenantFeatures {
        messages: t.messages_enabled,
        contacts: t.contacts_enabled,
        voicemail: t.voicemail_enabled,
        phone: t.phone_enabled,
    });

    UserInfo {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        tenant_id: user.tenant_id,
        tenant_name: tenant.map(|t| t.name),
        phone_number: user.phone_number,
        features,
    }
}
