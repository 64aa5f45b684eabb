//! Data structures for authentication-related entities.
//!
//! This module defines request/response models for login, registration,
//! password reset, and the UI route-check endpoint.

use crate::database::models::Role;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response containing the token and user info
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserInfo,
    /// Token expiration in seconds
    pub expires_in: u64,
    /// Set on first login with a temporary password
    pub must_change_password: bool,
}

/// User information returned in login and `/me` responses
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub phone_number: Option<String>,
    /// Tenant feature toggles so the UI can hide disabled areas;
    /// absent for SuperAdmins.
    pub features: Option<TenantFeatures>,
}

#[derive(Debug, Serialize)]
pub struct TenantFeatures {
    pub messages: bool,
    pub contacts: bool,
    pub voicemail: bool,
    pub phone: bool,
}

/// Self-service registration payload
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1-255 characters"
    ))]
    pub name: String,

    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "Tenant ID is required"))]
    pub tenant_id: String,

    pub phone_number: Option<String>,

    /// Defaults to OrgUser when omitted
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Query parameters for the UI route-check endpoint
#[derive(Debug, Deserialize)]
pub struct RouteCheckQuery {
    pub path: String,
}

/// Decision returned to the UI router
#[derive(Debug, Serialize)]
pub struct RouteCheckResponse {
    pub allowed: bool,
    /// Where to send the browser instead, when not allowed as-is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}
