use super::dto::ValidatedUpload;
use super::model::UploadRequest;
use super::progress::UploadSnapshot;
use crate::modules::content::error::ContentError;
use crate::modules::content::repository::ContentRepository;
use crate::state::AppState;
use tracing::info;
use uuid::Uuid;

pub struct UploadService;

impl UploadService {
    pub async fn start(
        state: AppState,
        course_id: Uuid,
        section_id: Uuid,
        upload: ValidatedUpload,
    ) -> Result<UploadSnapshot, ContentError> {
        // Sections of another course are reported as missing.
        ContentRepository::get_section(&state.db, section_id)
            .await?
            .filter(|section| section.course_id == course_id)
            .ok_or(ContentError::SectionNotFound(section_id))?;

        let request = UploadRequest {
            file: upload.file,
            file_name: upload.file_name,
            content_type: upload.content_type.to_string(),
            declared_type: upload.item_type,
            display_title: upload.title,
            course_id,
            section_id,
        };

        let snapshot = state.uploads.start(state.coordinator.clone(), request).await;
        info!(upload_id = %snapshot.upload_id, %section_id, "Upload accepted");
        Ok(snapshot)
    }

    pub async fn status(state: AppState, upload_id: Uuid, wait: Option<std::time::Duration>) -> Option<UploadSnapshot> {
        match wait {
            Some(timeout) => state.uploads.wait(upload_id, timeout).await,
            None => state.uploads.snapshot(upload_id).await,
        }
    }

    pub async fn cancel(state: AppState, upload_id: Uuid) -> Option<UploadSnapshot> {
        state.uploads.cancel(upload_id).await
    }
}
