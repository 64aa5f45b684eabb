//! Central module for organizing the application's business logic services.
//!
//! Services sit between the API handlers and the repositories: they own
//! validation, role/tenant privilege checks, and the transactional
//! workflows that must not be split across requests.

pub mod email_service;
pub mod group_service;
pub mod phone_assignment_service;
pub mod settings_service;
pub mod sms_service;
pub mod tenant_service;
pub mod user_service;
