//! Handler functions for user management endpoints.
//!
//! Reading is open to any authenticated user within their scope; creating,
//! updating, and deleting users require Admin or SuperAdmin privilege.

use crate::api::common::{
    ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http,
    validation_error_response,
};
use crate::database::models::{CreateUser, UpdateUser, User};
use crate::services::user_service::UserService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;
use validator::Validate;

/// Create a new user
#[axum::debug_handler]
pub async fn create_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), (StatusCode, String)> {
    let service = UserService::new(&pool);

    match service.create_user(payload, &claims).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(user, "User created successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get a single user by ID
#[axum::debug_handler]
pub async fn get_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<User>>, (StatusCode, String)> {
    let service = UserService::new(&pool);

    match service.get_user_required(&id, &claims).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::ok(user))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// List users visible to the caller, paginated
#[axum::debug_handler]
pub async fn list_users(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, (StatusCode, String)> {
    if let Err(validation_errors) = pagination.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let service = UserService::new(&pool);

    match service.list_users(&claims, &pagination).await {
        Ok((users, total)) => {
            let meta = PaginationMeta::from_filter(&pagination, total);
            Ok(ResponseJson(ApiResponse::paginated(
                users,
                meta,
                "Users retrieved successfully",
            )))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Update a user's profile, role, or tenant
#[axum::debug_handler]
pub async fn update_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, (StatusCode, String)> {
    let service = UserService::new(&pool);

    match service.update_user(&id, payload, &claims).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Soft-delete a user
#[axum::debug_handler]
pub async fn delete_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let service = UserService::new(&pool);

    match service.delete_user(&id, &claims).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "User deleted successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
