//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for login, registration,
//! password flows and the UI route-check, parse request data, and interact
//! with the `auth::service` for core business logic.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::models::*;
use crate::auth::policy::{self, PageDecision};
use crate::auth::service::AuthService;
use crate::database::models::User;
use crate::utils::jwt::{Claims, JwtUtils};
use axum::{
    extract::{Extension, Json, Query},
    http::{StatusCode, header::AUTHORIZATION},
    http::HeaderMap,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt): Extension<JwtUtils>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<LoginResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt);

    match auth_service.login(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle self-service registration into an existing tenant
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt): Extension<JwtUtils>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt);

    match auth_service.register(payload).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(user, "User registered successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request (client-side token invalidation)
#[axum::debug_handler]
pub async fn logout() -> Result<ResponseJson<serde_json::Value>, (StatusCode, String)> {
    // For JWT tokens, logout is handled on the client side by removing
    // the token from storage.
    Ok(ResponseJson(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// Get current user information from token
#[axum::debug_handler]
pub async fn me(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt): Extension<JwtUtils>,
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<UserInfo>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt);

    match auth_service.me(&claims).await {
        Ok(info) => Ok(ResponseJson(info)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle forgot-password request; always answers 200
#[axum::debug_handler]
pub async fn forgot_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt): Extension<JwtUtils>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<ResponseJson<serde_json::Value>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt);

    match auth_service.forgot_password(payload).await {
        Ok(()) => Ok(ResponseJson(serde_json::json!({
            "message": "If the address exists, a reset link has been sent"
        }))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle reset-password request
#[axum::debug_handler]
pub async fn reset_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt): Extension<JwtUtils>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ResponseJson<serde_json::Value>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt);

    match auth_service.reset_password(payload).await {
        Ok(()) => Ok(ResponseJson(serde_json::json!({
            "message": "Password updated successfully"
        }))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle change-password request for the authenticated user
#[axum::debug_handler]
pub async fn change_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt): Extension<JwtUtils>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ResponseJson<serde_json::Value>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt);

    match auth_service.change_password(&claims, payload).await {
        Ok(()) => Ok(ResponseJson(serde_json::json!({
            "message": "Password changed successfully"
        }))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Page-navigation check for the UI router.
///
/// Evaluates the bearer token (if any) against the role's allow-list and
/// tells the frontend whether to render, redirect, or show not-found.
#[axum::debug_handler]
pub async fn route_check(
    Extension(jwt): Extension<JwtUtils>,
    headers: HeaderMap,
    Query(query): Query<RouteCheckQuery>,
) -> Result<ResponseJson<RouteCheckResponse>, (StatusCode, String)> {

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let response = match policy::evaluate_request(&jwt, token, &query.path) {
        PageDecision::Allow => RouteCheckResponse {
            allowed: true,
            redirect: None,
        },
        PageDecision::Redirect(target) => RouteCheckResponse {
            allowed: false,
            redirect: Some(target.to_string()),
        },
        PageDecision::Login => RouteCheckResponse {
            allowed: false,
            redirect: Some("/login".to_string()),
        },
        // Deliberate information hiding: denied paths look nonexistent.
        PageDecision::NotFound => RouteCheckResponse {
            allowed: false,
            redirect: Some("/not-found".to_string()),
        },
    };

    Ok(ResponseJson(response))
}
