//! Handler functions for tenant group endpoints.
//!
//! Groups are read-visible to any authenticated user of their tenant;
//! mutations require Admin or SuperAdmin privilege.

use crate::api::common::{
    ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http,
    validation_error_response,
};
use crate::database::models::{CreateGroup, Group, GroupWithMembers, UpdateGroup};
use crate::services::group_service::GroupService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;
use validator::Validate;

/// Create a new group
#[axum::debug_handler]
pub async fn create_group(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateGroup>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<GroupWithMembers>>), (StatusCode, String)> {
    let service = GroupService::new(&pool);

    match service.create_group(payload, &claims).await {
        Ok(group) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(group, "Group created successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get a single group with its member list
#[axum::debug_handler]
pub async fn get_group(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<GroupWithMembers>>, (StatusCode, String)> {
    let service = GroupService::new(&pool);

    match service.get_group_required(&id, &claims).await {
        Ok(group) => Ok(ResponseJson(ApiResponse::ok(group))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// List groups visible to the caller, paginated
#[axum::debug_handler]
pub async fn list_groups(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Group>>>, (StatusCode, String)> {
    if let Err(validation_errors) = pagination.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let service = GroupService::new(&pool);

    match service.list_groups(&claims, &pagination).await {
        Ok((groups, total)) => {
            let meta = PaginationMeta::from_filter(&pagination, total);
            Ok(ResponseJson(ApiResponse::paginated(
                groups,
                meta,
                "Groups retrieved successfully",
            )))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Update a group; a present `member_ids` replaces the member set
#[axum::debug_handler]
pub async fn update_group(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGroup>,
) -> Result<ResponseJson<ApiResponse<GroupWithMembers>>, (StatusCode, String)> {
    let service = GroupService::new(&pool);

    match service.update_group(&id, payload, &claims).await {
        Ok(group) => Ok(ResponseJson(ApiResponse::success(
            group,
            "Group updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Soft-delete a group
#[axum::debug_handler]
pub async fn delete_group(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let service = GroupService::new(&pool);

    match service.delete_group(&id, &claims).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "Group deleted successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
