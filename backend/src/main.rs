//! Main entry point for the Switchyard backend.
//!
//! This file initializes the Axum web server, sets up database connections,
//! and registers all API routes and middleware.
//! It orchestrates the application's startup and defines its overall structure.

use axum::{Extension, Router, response::Json, routing::get};
use backend::api;
use backend::api::common::ApiResponse;
use backend::auth;
use backend::config::Config;
use backend::database::Database;
use backend::utils::jwt::JwtUtils;
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();
    let db = Database::new(&config).await.unwrap();
    let pool = db.pool().clone();

    // Signing keys are built once here; a bad JWT_SECRET already failed
    // Config::from_env above.
    let jwt = JwtUtils::from_config(&config);

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/api/auth", auth::routes::auth_router())
        .nest("/api/users", api::users::routes::users_router())
        .nest("/api/tenants", api::tenants::routes::tenants_router())
        .nest("/api/group", api::groups::routes::groups_router())
        .nest(
            "/api/global-settings",
            api::global_settings::routes::global_settings_router(),
        )
        .nest("/api/messages", api::messages::routes::messages_router())
        .layer(Extension(pool))
        .layer(Extension(jwt));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting Switchyard server on port {}", config.server_port);
    axum::serve(listener, app).await.unwrap();
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Switchyard Backend",
            "version": "0.1.0"
        }),
        "Welcome to the Switchyard API",
    ))
}
