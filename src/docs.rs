use utoipa::OpenApi;
use crate::modules::content::dto::*;
use crate::modules::content::model::{CourseContentItem, CourseSection, ItemType};
use crate::modules::upload::dto::UploadAccepted;
use crate::modules::upload::progress::{UploadSnapshot, UploadState};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::content::handler::create_section,
        crate::modules::content::handler::list_sections,
        crate::modules::content::handler::list_items,
        crate::modules::content::handler::get_item,
        crate::modules::content::handler::reorder_items,
        crate::modules::content::handler::delete_item,
        crate::modules::upload::handler::start_upload,
        crate::modules::upload::handler::get_upload,
        crate::modules::upload::handler::cancel_upload,
    ),
    components(
        schemas(
            CreateSectionRequest, ReorderItemsRequest,
            CourseSection, CourseContentItem, ItemType,
            UploadAccepted, UploadSnapshot, UploadState,
        )
    ),
    tags(
        (name = "Content", description = "Course sections and content items"),
        (name = "Uploads", description = "Course file ingestion")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
