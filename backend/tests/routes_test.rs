//! HTTP-level tests for the global settings route surface.
//!
//! Drives the real router with `tower::ServiceExt::oneshot`, so the
//! nesting, the extension layers, and the middleware chain are all
//! exercised the way a live request would hit them.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::{Extension, Router};
use backend::api;
use backend::config::{Config, EmailConfig};
use backend::database::models::Role;
use backend::repositories::settings_repository::SettingsRepository;
use backend::repositories::user_repository::{NewUserRow, UserRepository};
use backend::utils::jwt::{JwtUtils, TokenTtl};
use sqlx::SqlitePool;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        max_connections: 1,
        acquire_timeout_seconds: 3,
        jwt_secret: "routes-test-secret".into(),
        session_token_ttl_seconds: 86400,
        federated_token_ttl_seconds: 604800,
        reset_token_ttl_seconds: 900,
        temp_password_ttl_hours: 72,
        encryption_key: "test-key".into(),
        server_port: 0,
        sms_provider_base_url: "http://localhost".into(),
        email: EmailConfig {
            smtp_host: "localhost".into(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_name: "Test".into(),
            from_email: "test@localhost".into(),
            base_url: "http://localhost:3000".into(),
        },
    }
}

/// Builds the app the way `main` does, over an in-memory database.
async fn setup() -> (Router, SqlitePool, JwtUtils) {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let jwt = JwtUtils::from_config(&test_config());
    let app = Router::new()
        .nest(
            "/api/global-settings",
            api::global_settings::routes::global_settings_router(),
        )
        .layer(Extension(pool.clone()))
        .layer(Extension(jwt.clone()));

    (app, pool, jwt)
}

async fn seed_user(pool: &SqlitePool, name: &str, role: Role) -> String {
    let user = UserRepository::new(pool)
        .create_user(NewUserRow {
            tenant_id: None,
            name: name.to_string(),
            email: format!("{name}@test.local"),
            password_hash: "not-a-real-hash".to_string(),
            role,
            phone_number: None,
            is_first_login: false,
            temp_password_expires_at: None,
        })
        .await
        .unwrap()
        .id;
    user
}

fn bearer(jwt: &JwtUtils, user_id: &str, role: Role) -> String {
    let token = jwt
        .generate_token(
            user_id.to_string(),
            format!("{user_id}@test.local"),
            role.to_string(),
            None,
            TokenTtl::Session,
        )
        .unwrap();
    format!("Bearer {token}")
}

#[tokio::test]
async fn provider_settings_live_at_the_collection_root() {
    let (app, pool, jwt) = setup().await;
    let admin_id = seed_user(&pool, "root", Role::SuperAdmin).await;

    // Seed a settings row directly; GET returns it without decrypting.
    SettingsRepository::new(&pool)
        .upsert(&admin_id, "ciphertext-key", "ciphertext-secret", None)
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/global-settings")
                .header(header::AUTHORIZATION, bearer(&jwt, &admin_id, Role::SuperAdmin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn settings_routes_reject_missing_tokens() {
    let (app, _pool, _jwt) = setup().await;

    // Both methods are registered at the collection root: an anonymous
    // request is turned away by the auth middleware, not the router.
    let get = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/global-settings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get.status(), StatusCode::UNAUTHORIZED);

    let put = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/global-settings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_roles_see_nothing_at_the_settings_root() {
    let (app, pool, jwt) = setup().await;
    let user_id = seed_user(&pool, "plain", Role::OrgUser).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/global-settings")
                .header(header::AUTHORIZATION, bearer(&jwt, &user_id, Role::OrgUser))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
