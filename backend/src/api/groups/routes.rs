//! Route definitions for tenant group management.

use crate::api::groups::handlers::*;
use crate::auth::middleware::{admin_auth, jwt_auth};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

/// Creates the groups router
pub fn groups_router() -> Router {
    Router::new()
        .route(
            "/",
            post(create_group).layer(middleware::from_fn(admin_auth)),
        )
        .route("/", get(list_groups))
        .route("/{id}", get(get_group))
        .route(
            "/{id}",
            put(update_group).layer(middleware::from_fn(admin_auth)),
        )
        .route(
            "/{id}",
            delete(delete_group).layer(middleware::from_fn(admin_auth)),
        )
        .layer(middleware::from_fn(jwt_auth))
}
