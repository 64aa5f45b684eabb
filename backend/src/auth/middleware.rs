//! Middleware for protecting authenticated routes and handling authorization.
//!
//! This module contains logic for validating authentication tokens (JWTs)
//! and enforcing role gates across the API endpoints.

use crate::database::models::Role;
use crate::utils::jwt::JwtUtils;
use axum::{
    extract::Request,
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::str::FromStr;

/// JWT authentication middleware
pub async fn jwt_auth(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Check if it's a Bearer token
    if !auth_header.starts_with("Bearer ") {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token = &auth_header[7..]; // Remove "Bearer " prefix

    // The shared JwtUtils is installed as a router-wide extension at startup.
    let jwt_utils = request
        .extensions()
        .get::<JwtUtils>()
        .cloned()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    match jwt_utils.validate_token(token) {
        Ok(claims) => {
            // Add claims to request extensions for use in handlers
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// SuperAdmin role gate; must run after `jwt_auth`.
///
/// The deny is a 404, not a 403: tenant roles probing SuperAdmin routes
/// should not learn they exist.
pub async fn super_admin_auth(request: Request, next: Next) -> Result<Response, StatusCode> {
    let claims = request
        .extensions()
        .get::<crate::utils::jwt::Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match Role::from_str(claims.role()) {
        Ok(Role::SuperAdmin) => Ok(next.run(request).await),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

/// Gate for user-management mutations: SuperAdmin or tenant Admin.
pub async fn admin_auth(request: Request, next: Next) -> Result<Response, StatusCode> {
    let claims = request
        .extensions()
        .get::<crate::utils::jwt::Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match Role::from_str(claims.role()) {
        Ok(Role::SuperAdmin) | Ok(Role::Admin) => Ok(next.run(request).await),
        Ok(_) => Err(StatusCode::FORBIDDEN),
        // Unknown role string in a signed token: treat as unauthenticated.
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
