//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Closed set of roles recognized by the system.
///
/// Stored as TEXT using the variant name; unknown strings coming from a token
/// or request body are rejected at the boundary rather than defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    SuperAdmin,
    Admin,
    OrgManager,
    OrgUser,
}

impl Role {
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::OrgManager => "OrgManager",
            Role::OrgUser => "OrgUser",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SuperAdmin" => Ok(Role::SuperAdmin),
            "Admin" => Ok(Role::Admin),
            "OrgManager" => Ok(Role::OrgManager),
            "OrgUser" => Ok(Role::OrgUser),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// What kind of record a phone number is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OwnerType {
    User,
    Group,
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerType::User => write!(f, "user"),
            OwnerType::Group => write!(f, "group"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub messages_enabled: bool,
    pub contacts_enabled: bool,
    pub voicemail_enabled: bool,
    pub phone_enabled: bool,
    pub retention_years: i64,
    /// The SuperAdmin who created and manages this tenant.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTenant {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Tenant name must be between 1-255 characters"
    ))]
    pub name: String,

    #[validate(email(message = "Must be a valid email"))]
    pub contact_email: Option<String>,

    pub contact_phone: Option<String>,
    pub address: Option<String>,

    pub messages_enabled: Option<bool>,
    pub contacts_enabled: Option<bool>,
    pub voicemail_enabled: Option<bool>,
    pub phone_enabled: Option<bool>,

    #[validate(range(min = 1, max = 10, message = "Retention must be 1-10 years"))]
    pub retention_years: Option<i64>,
}

/// Partial update payload for tenants; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTenant {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Tenant name must be between 1-255 characters"
    ))]
    pub name: Option<String>,

    #[validate(email(message = "Must be a valid email"))]
    pub contact_email: Option<String>,

    pub contact_phone: Option<String>,
    pub address: Option<String>,

    pub messages_enabled: Option<bool>,
    pub contacts_enabled: Option<bool>,
    pub voicemail_enabled: Option<bool>,
    pub phone_enabled: Option<bool>,

    #[validate(range(min = 1, max = 10, message = "Retention must be 1-10 years"))]
    pub retention_years: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    /// NULL only for SuperAdmin users; required for every other role.
    pub tenant_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub is_first_login: bool,
    pub temp_password_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1-255 characters"
    ))]
    pub name: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    /// Omitted when an admin creates the user; a temporary password is
    /// generated and emailed instead.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    pub role: Role,

    pub tenant_id: Option<String>,

    #[validate(custom(function = "validate_e164"))]
    pub phone_number: Option<String>,
}

/// Partial update payload for users; absent fields are left untouched.
///
/// `role` and `tenant_id` changes require SuperAdmin privilege and are
/// rejected for everyone else before any write happens.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1-255 characters"
    ))]
    pub name: Option<String>,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: Option<String>,

    pub role: Option<Role>,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Group together with its resolved member ids.
#[derive(Debug, Clone, Serialize)]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: Group,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGroup {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Group name must be between 1-255 characters"
    ))]
    pub name: String,

    #[validate(length(max = 1024, message = "Description too long"))]
    pub description: Option<String>,

    /// Members must belong to the same tenant as the group.
    #[serde(default)]
    pub member_ids: Vec<String>,

    /// Tenant to create the group in. SuperAdmins must supply it; tenant
    /// roles have it forced to their own tenant.
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateGroup {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Group name must be between 1-255 characters"
    ))]
    pub name: Option<String>,

    #[validate(length(max = 1024, message = "Description too long"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,

    /// Full replacement of the member set when present.
    pub member_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhoneAssignment {
    pub id: String,
    pub phone_number: String,
    pub tenant_id: String,
    pub owner_type: OwnerType,
    pub owner_id: String,
    pub assigned_by: String,
    pub assigned_at: DateTime<Utc>,
    pub unassigned_at: Option<DateTime<Utc>>,
    pub unassigned_by: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePhoneAssignment {
    #[validate(custom(function = "validate_e164"))]
    pub phone_number: String,

    #[validate(length(min = 1, message = "Tenant ID is required"))]
    pub tenant_id: String,

    pub owner_type: OwnerType,

    #[validate(length(min = 1, message = "Owner ID is required"))]
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordResetToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-SuperAdmin SMS provider credentials. Key and secret are stored
/// AES-GCM encrypted and never serialized back to clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProviderSettings {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub base_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProviderSettings {
    #[validate(length(min = 1, message = "API key is required"))]
    pub api_key: String,

    #[validate(length(min = 1, message = "API secret is required"))]
    pub api_secret: String,

    #[validate(url(message = "Must be a valid URL"))]
    pub base_url: Option<String>,
}

/// Validates an E.164-style phone number: leading '+', 8 to 15 digits.
pub fn validate_e164(phone: &str) -> Result<(), validator::ValidationError> {
    let rest = phone
        .strip_prefix('+')
        .ok_or_else(|| validator::ValidationError::new("phone_format"))?;

    if rest.len() < 8 || rest.len() > 15 || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err(validator::ValidationError::new("phone_format"));
    }

    Ok(())
}
