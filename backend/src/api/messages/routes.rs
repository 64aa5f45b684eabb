//! Route definitions for messaging.

use crate::api::messages::handlers::*;
use crate::auth::middleware::jwt_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the messages router
pub fn messages_router() -> Router {
    Router::new()
        .route("/", post(send_message))
        .route("/", get(list_messages))
        .layer(middleware::from_fn(jwt_auth))
}
