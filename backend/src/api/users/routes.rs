//! Route definitions for user management.
//!
//! All routes require a valid token; mutations additionally require Admin
//! or SuperAdmin privilege.

use crate::api::users::handlers::*;
use crate::auth::middleware::{admin_auth, jwt_auth};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

/// Creates the users router
pub fn users_router() -> Router {
    Router::new()
        .route("/", post(create_user).layer(middleware::from_fn(admin_auth)))
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
        .route(
            "/{id}",
            put(update_user).layer(middleware::from_fn(admin_auth)),
        )
        .route(
            "/{id}",
            delete(delete_user).layer(middleware::from_fn(admin_auth)),
        )
        .layer(middleware::from_fn(jwt_auth))
}
