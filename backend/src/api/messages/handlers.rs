//! Handler functions for message sending and history.
//!
//! These are thin proxies: credentials are resolved from the settings of
//! the SuperAdmin behind the caller's tenant, and the provider's JSON is
//! handed back untouched.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::services::settings_service::SettingsService;
use crate::services::sms_service::{SendMessageRequest, SmsService};
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub phone_number: String,
}

/// Send a message through the configured provider
#[axum::debug_handler]
pub async fn send_message(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<ResponseJson<ApiResponse<Value>>, (StatusCode, String)> {
    let settings_service = SettingsService::new(&pool);
    let credentials = match settings_service.resolve_credentials(&claims).await {
        Ok(credentials) => credentials,
        Err(error) => return Err(service_error_to_http(error)),
    };

    let sms_service = match SmsService::new() {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match sms_service.send_message(&credentials, &payload).await {
        Ok(response) => Ok(ResponseJson(ApiResponse::success(
            response,
            "Message sent successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// List messages for a phone number
#[axum::debug_handler]
pub async fn list_messages(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<ResponseJson<ApiResponse<Value>>, (StatusCode, String)> {
    let settings_service = SettingsService::new(&pool);
    let credentials = match settings_service.resolve_credentials(&claims).await {
        Ok(credentials) => credentials,
        Err(error) => return Err(service_error_to_http(error)),
    };

    let sms_service = match SmsService::new() {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match sms_service
        .list_messages(&credentials, &query.phone_number)
        .await
    {
        Ok(response) => Ok(ResponseJson(ApiResponse::ok(response))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
