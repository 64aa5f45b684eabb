//! Handler functions for the global settings surface.
//!
//! Covers two SuperAdmin-only concerns: SMS provider credentials and the
//! phone assignment workflow. The whole group is hidden behind
//! `super_admin_auth`, which answers 404 for anyone else.

use crate::api::common::{
    ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http,
    validation_error_response,
};
use crate::database::models::{
    CreatePhoneAssignment, PhoneAssignment, ProviderSettings, UpdateProviderSettings,
};
use crate::services::phone_assignment_service::PhoneAssignmentService;
use crate::services::settings_service::SettingsService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct SetAssignmentActive {
    pub is_active: bool,
}

/// Get the caller's provider settings
#[axum::debug_handler]
pub async fn get_settings(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<ApiResponse<ProviderSettings>>, (StatusCode, String)> {
    let service = SettingsService::new(&pool);

    match service.get_settings(&claims).await {
        Ok(settings) => Ok(ResponseJson(ApiResponse::ok(settings))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Create or replace the caller's provider settings
#[axum::debug_handler]
pub async fn update_settings(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProviderSettings>,
) -> Result<ResponseJson<ApiResponse<ProviderSettings>>, (StatusCode, String)> {
    let service = SettingsService::new(&pool);

    match service.update_settings(payload, &claims).await {
        Ok(settings) => Ok(ResponseJson(ApiResponse::success(
            settings,
            "Settings updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Assign a phone number to a user or group
#[axum::debug_handler]
pub async fn create_assignment(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePhoneAssignment>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<PhoneAssignment>>), (StatusCode, String)> {
    let service = PhoneAssignmentService::new(&pool);

    match service.assign(payload, &claims).await {
        Ok(assignment) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(
                assignment,
                "Phone number assigned successfully",
            )),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// List phone assignments visible to the caller, paginated
#[axum::debug_handler]
pub async fn list_assignments(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<PhoneAssignment>>>, (StatusCode, String)> {
    if let Err(validation_errors) = pagination.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let service = PhoneAssignmentService::new(&pool);

    match service.list_assignments(&claims, &pagination).await {
        Ok((assignments, total)) => {
            let meta = PaginationMeta::from_filter(&pagination, total);
            Ok(ResponseJson(ApiResponse::paginated(
                assignments,
                meta,
                "Phone assignments retrieved successfully",
            )))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Release an assignment: clears the owner's number and deactivates it
#[axum::debug_handler]
pub async fn delete_assignment(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<PhoneAssignment>>, (StatusCode, String)> {
    let service = PhoneAssignmentService::new(&pool);

    match service.unassign(&id, &claims).await {
        Ok(assignment) => Ok(ResponseJson(ApiResponse::success(
            assignment,
            "Phone number unassigned successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Toggle an assignment's active flag without releasing the number
#[axum::debug_handler]
pub async fn set_assignment_active(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<SetAssignmentActive>,
) -> Result<ResponseJson<ApiResponse<PhoneAssignment>>, (StatusCode, String)> {
    let service = PhoneAssignmentService::new(&pool);

    match service.set_active(&id, payload.is_active, &claims).await {
        Ok(assignment) => Ok(ResponseJson(ApiResponse::success(
            assignment,
            "Phone assignment updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
