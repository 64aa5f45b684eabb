//! Route definitions for tenant management.
//!
//! The whole group is gated by `super_admin_auth`, which answers 404 for
//! non-SuperAdmin callers so the surface stays invisible to them.

use crate::api::tenants::handlers::*;
use crate::auth::middleware::{jwt_auth, super_admin_auth};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

/// Creates the tenants router
pub fn tenants_router() -> Router {
    Router::new()
        .route("/", post(create_tenant))
        .route("/", get(list_tenants))
        .route("/{id}", get(get_tenant))
        .route("/{id}", put(update_tenant))
        .route("/{id}", delete(delete_tenant))
        .layer(middleware::from_fn(super_admin_auth))
        .layer(middleware::from_fn(jwt_auth))
}
