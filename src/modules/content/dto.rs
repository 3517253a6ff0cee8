use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSectionRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReorderItemsRequest {
    /// Every item of the section, in the desired order. Empty for an empty section.
    pub item_ids: Vec<Uuid>,
}
