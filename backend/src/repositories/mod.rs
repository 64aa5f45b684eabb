//! Database repository modules.
//!
//! Each repository owns the persistence operations for one entity. Every
//! read excludes soft-deleted rows unless a caller explicitly asks for
//! them, and every tenant-owned entity is queried through an
//! [`crate::auth::policy::AccessScope`] so cross-tenant rows are never
//! reachable, whatever the HTTP layer allowed.

pub mod group_repository;
pub mod phone_assignment_repository;
pub mod reset_token_repository;
pub mod settings_repository;
pub mod tenant_repository;
pub mod user_repository;
