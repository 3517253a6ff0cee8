use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::session::Session;
use crate::modules::upload::dto::*;
use crate::modules::upload::progress::UploadSnapshot;
use crate::modules::upload::service::UploadService;
use crate::state::AppState;
use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                form.file = Some(bytes);
            }
            "type" | "title" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read '{}': {}", name, e)))?;
                if name == "type" {
                    form.item_type = Some(value);
                } else {
                    form.title = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Start Upload
/// Accepts the file and ingests it in the background; poll the returned id
/// for progress.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/sections/{section_id}/uploads",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    request_body(content = String, content_type = "multipart/form-data", description = "Fields: file, type (image|audio|video|document), title"),
    responses(
        (status = 202, description = "Upload started", body = ApiResponse<UploadAccepted>),
        (status = 400, description = "Bad Request"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Section not found"),
        (status = 413, description = "File too large")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
pub async fn start_upload(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((course_id, section_id)): Path<(Uuid, Uuid)>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let form = match read_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => return e.into_response(),
    };

    let upload = match form.validate() {
        Ok(upload) => upload,
        Err(message) => return ApiError::bad_request(message).into_response(),
    };
    info!(%section_id, uploaded_by = %session.user_id, file_name = %upload.file_name, bytes = upload.file.len(), "Upload received");

    match UploadService::start(state, course_id, section_id, upload).await {
        Ok(snapshot) => ApiSuccess(
            ApiResponse::success(UploadAccepted { upload_id: snapshot.upload_id }, "Upload started"),
            StatusCode::ACCEPTED,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/uploads/{upload_id}",
    params(
        ("upload_id" = Uuid, Path, description = "Upload ID"),
        UploadStatusQuery
    ),
    responses(
        (status = 200, description = "Upload progress", body = ApiResponse<UploadSnapshot>),
        (status = 404, description = "Unknown or expired upload")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
pub async fn get_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<Uuid>,
    Query(query): Query<UploadStatusQuery>,
) -> impl IntoResponse {
    match UploadService::status(state, upload_id, query.wait()).await {
        Some(snapshot) => ApiSuccess(ApiResponse::success(snapshot, "Upload status retrieved"), StatusCode::OK).into_response(),
        None => ApiError::not_found(format!("Upload {} not found", upload_id)).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/uploads/{upload_id}",
    params(
        ("upload_id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 202, description = "Cancellation requested", body = ApiResponse<UploadSnapshot>),
        (status = 404, description = "Unknown or expired upload")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
pub async fn cancel_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<Uuid>,
) -> impl IntoResponse {
    match UploadService::cancel(state, upload_id).await {
        Some(snapshot) => ApiSuccess(ApiResponse::success(snapshot, "Cancellation requested"), StatusCode::ACCEPTED).into_response(),
        None => ApiError::not_found(format!("Upload {} not found", upload_id)).into_response(),
    }
}
