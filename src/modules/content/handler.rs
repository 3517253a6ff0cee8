use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::content::dto::*;
use crate::modules::content::model::{CourseContentItem, CourseSection};
use crate::modules::content::service::ContentService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

// --- SECTION HANDLERS ---

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/sections",
    params(
        ("course_id" = Uuid, Path, description = "Course ID")
    ),
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section Created", body = ApiResponse<CourseSection>),
        (status = 400, description = "Bad Request"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
pub async fn create_section(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateSectionRequest>,
) -> impl IntoResponse {
    if let Err(e) = req.validate() {
        return ApiError::bad_request(e.to_string()).into_response();
    }

    match ContentService::create_section(state, course_id, req).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Section created successfully"), StatusCode::CREATED).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/sections",
    params(
        ("course_id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "List Sections", body = ApiResponse<Vec<CourseSection>>),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
pub async fn list_sections(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> impl IntoResponse {
    match ContentService::list_sections(state, course_id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Sections retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

// --- ITEM HANDLERS ---

#[utoipa::path(
    get,
    path = "/api/v1/sections/{section_id}/items",
    params(
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    responses(
        (status = 200, description = "Items in display order", body = ApiResponse<Vec<CourseContentItem>>),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
pub async fn list_items(
    State(state): State<AppState>,
    Path(section_id): Path<Uuid>,
) -> impl IntoResponse {
    match ContentService::list_items(state, section_id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Items retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Content item ID")
    ),
    responses(
        (status = 200, description = "Get Item", body = ApiResponse<CourseContentItem>),
        (status = 404, description = "Item Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> impl IntoResponse {
    match ContentService::get_item(state, item_id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Item retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Reorder Section Items
/// The body must list every item of the section exactly once.
#[utoipa::path(
    put,
    path = "/api/v1/sections/{section_id}/items/order",
    params(
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    request_body = ReorderItemsRequest,
    responses(
        (status = 200, description = "Items reordered", body = ApiResponse<Vec<CourseContentItem>>),
        (status = 400, description = "Not a permutation of the section's items"),
        (status = 404, description = "Section Not Found"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
pub async fn reorder_items(
    State(state): State<AppState>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<ReorderItemsRequest>,
) -> impl IntoResponse {
    if let Err(e) = req.validate() {
        return ApiError::bad_request(e.to_string()).into_response();
    }

    match ContentService::reorder_items(state, section_id, req).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Items reordered successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/items/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Content item ID")
    ),
    responses(
        (status = 200, description = "Item deleted", body = ApiResponse<String>),
        (status = 404, description = "Item Not Found"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> impl IntoResponse {
    match ContentService::delete_item(state, item_id).await {
        Ok(_) => ApiSuccess(ApiResponse::success((), "Item deleted successfully"), StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
