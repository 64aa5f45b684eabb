//! Handler functions for tenant management endpoints.
//!
//! Every operation runs against the acting SuperAdmin's own tenants; the
//! middleware layer has already hidden these routes from anyone else.

use crate::api::common::{
    ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http,
    validation_error_response,
};
use crate::database::models::{CreateTenant, Tenant, UpdateTenant};
use crate::services::tenant_service::TenantService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;
use validator::Validate;

/// Create a new tenant
#[axum::debug_handler]
pub async fn create_tenant(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTenant>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Tenant>>), (StatusCode, String)> {
    let service = TenantService::new(&pool);

    match service.create_tenant(payload, &claims).await {
        Ok(tenant) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(tenant, "Tenant created successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get a single tenant by ID
#[axum::debug_handler]
pub async fn get_tenant(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, (StatusCode, String)> {
    let service = TenantService::new(&pool);

    match service.get_tenant_required(&id, &claims).await {
        Ok(tenant) => Ok(ResponseJson(ApiResponse::ok(tenant))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// List the caller's tenants, paginated
#[axum::debug_handler]
pub async fn list_tenants(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Tenant>>>, (StatusCode, String)> {
    if let Err(validation_errors) = pagination.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let service = TenantService::new(&pool);

    match service.list_tenants(&claims, &pagination).await {
        Ok((tenants, total)) => {
            let meta = PaginationMeta::from_filter(&pagination, total);
            Ok(ResponseJson(ApiResponse::paginated(
                tenants,
                meta,
                "Tenants retrieved successfully",
            )))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Update a tenant
#[axum::debug_handler]
pub async fn update_tenant(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTenant>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, (StatusCode, String)> {
    let service = TenantService::new(&pool);

    match service.update_tenant(&id, payload, &claims).await {
        Ok(tenant) => Ok(ResponseJson(ApiResponse::success(
            tenant,
            "Tenant updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Soft-delete a tenant
#[axum::debug_handler]
pub async fn delete_tenant(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let service = TenantService::new(&pool);

    match service.delete_tenant(&id, &claims).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "Tenant deleted successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
