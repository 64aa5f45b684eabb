//! Tenant management endpoints (SuperAdmin only).

pub mod handlers;
pub mod routes;
