//! Route definitions for the global settings surface.

use crate::api::global_settings::handlers::*;
use crate::auth::middleware::{jwt_auth, super_admin_auth};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

/// Creates the global settings router
pub fn global_settings_router() -> Router {
    Router::new()
        .route("/", get(get_settings))
        .route("/", put(update_settings))
        .route("/phone-assignments", post(create_assignment))
        .route("/phone-assignments", get(list_assignments))
        .route("/phone-assignments/{id}", delete(delete_assignment))
        .route("/phone-assignments/{id}/active", put(set_assignment_active))
        .layer(middleware::from_fn(super_admin_auth))
        .layer(middleware::from_fn(jwt_auth))
}
