use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::common::response::ApiError;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Section {0} not found")]
    SectionNotFound(Uuid),

    #[error("Content item {0} not found")]
    ItemNotFound(Uuid),

    #[error("Invalid item order: {0}")]
    InvalidOrder(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        let status = match &err {
            ContentError::SectionNotFound(_) | ContentError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            ContentError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            ContentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(err.to_string(), status)
    }
}
