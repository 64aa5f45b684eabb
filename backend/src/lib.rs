//! Switchyard backend library.
//!
//! Multi-tenant messaging administration: authentication, role-scoped
//! authorization, tenant/user/group management, and the phone number
//! assignment workflow.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod utils;
