//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle endpoints like user login, registration, password
//! flows, and the UI route-check. They are designed to be integrated into
//! the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout).layer(middleware::from_fn(jwt_auth)))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/route-check", get(route_check))
        .route("/me", get(me).layer(middleware::from_fn(jwt_auth)))
        .route(
            "/change-password",
            post(change_password).layer(middleware::from_fn(jwt_auth)),
        )
}
