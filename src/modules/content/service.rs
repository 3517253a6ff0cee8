use super::dto::{CreateSectionRequest, ReorderItemsRequest};
use super::error::ContentError;
use super::model::{CourseContentItem, CourseSection};
use super::repository::{ContentRepository, Result};
use crate::state::AppState;
use tracing::info;
use uuid::Uuid;

pub struct ContentService;

impl ContentService {
    // --- SECTIONS ---

    pub async fn create_section(state: AppState, course_id: Uuid, req: CreateSectionRequest) -> Result<CourseSection> {
        let section = ContentRepository::create_section(&state.db, course_id, req.title.trim()).await?;
        info!(course_id = %course_id, section_id = %section.id, "Section created");
        Ok(section)
    }

    pub async fn list_sections(state: AppState, course_id: Uuid) -> Result<Vec<CourseSection>> {
        ContentRepository::list_sections(&state.db, course_id).await
    }

    // --- ITEMS ---

    pub async fn list_items(state: AppState, section_id: Uuid) -> Result<Vec<CourseContentItem>> {
        ContentRepository::list_items(&state.db, section_id).await
    }

    pub async fn get_item(state: AppState, id: Uuid) -> Result<CourseContentItem> {
        ContentRepository::get_item(&state.db, id)
            .await?
            .ok_or(ContentError::ItemNotFound(id))
    }

    pub async fn reorder_items(
        state: AppState,
        section_id: Uuid,
        req: ReorderItemsRequest,
    ) -> Result<Vec<CourseContentItem>> {
        ContentRepository::reorder_items(&state.db, section_id, &req.item_ids).await?;
        info!(section_id = %section_id, items = req.item_ids.len(), "Section items reordered");
        ContentRepository::list_items(&state.db, section_id).await
    }

    pub async fn delete_item(state: AppState, id: Uuid) -> Result<()> {
        ContentRepository::delete_item(&state.db, id).await?;
        info!(item_id = %id, "Content item deleted");
        Ok(())
    }
}
