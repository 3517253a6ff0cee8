use crate::common::response::ApiError;
use crate::common::session::Session;
use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

pub async fn staff_guard(
    Extension(session): Extension<Session>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !session.role.is_staff() {
        return Err(ApiError("Forbidden: Coach or admin access required".to_string(), StatusCode::FORBIDDEN));
    }

    Ok(next.run(req).await)
}
