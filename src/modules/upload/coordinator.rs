use std::sync::Arc;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::UploadError;
use super::model::{TranscodeJob, UploadRequest};
use super::poller::{PollPolicy, TranscodeReadinessPoller};
use super::ports::{BlobStore, TranscodingService};
use super::progress::ProgressReporter;
use crate::common::upload::sanitize_file_name;
use crate::modules::content::model::{CourseContentItem, ItemType, NewContentItem};
use crate::modules::content::repository::ContentItemStore;

/// Storage key for a non-video file: namespaced by course and type, made
/// unique by the upload timestamp.
pub fn blob_key(course_id: Uuid, item_type: ItemType, file_name: &str, unix_millis: i128) -> String {
    format!(
        "courses/{}/{}/{}_{}",
        course_id,
        item_type,
        unix_millis,
        sanitize_file_name(file_name)
    )
}

/// Turns one upload request into one course content item.
///
/// The item is written only after every ingestion step succeeded; any failure
/// leaves the repository untouched.
pub struct UploadCoordinator {
    blobs: Arc<dyn BlobStore>,
    transcoder: Arc<dyn TranscodingService>,
    items: Arc<dyn ContentItemStore>,
    poll_policy: PollPolicy,
}

impl UploadCoordinator {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        transcoder: Arc<dyn TranscodingService>,
        items: Arc<dyn ContentItemStore>,
        poll_policy: PollPolicy,
    ) -> Self {
        Self {
            blobs,
            transcoder,
            items,
            poll_policy,
        }
    }

    #[tracing::instrument(
        name = "upload",
        skip_all,
        fields(section_id = %request.section_id, item_type = %request.declared_type, bytes = request.file.len())
    )]
    pub async fn run(
        &self,
        request: UploadRequest,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<CourseContentItem, UploadError> {
        progress.report(0, "Starting upload");

        let new_item = match request.declared_type {
            ItemType::Video => self.ingest_video(&request, progress, cancel).await?,
            ItemType::Image | ItemType::Audio | ItemType::Document => {
                self.ingest_file(&request, progress, cancel).await?
            }
        };

        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        progress.message("Saving content item");
        let item = self.items.create_item(new_item).await.map_err(UploadError::Persist)?;

        info!(item_id = %item.id, sort_order = item.sort_order, "Content item created");
        progress.report(100, "Upload complete");
        Ok(item)
    }

    async fn ingest_file(
        &self,
        request: &UploadRequest,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<NewContentItem, UploadError> {
        let unix_millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let key = blob_key(request.course_id, request.declared_type, &request.file_name, unix_millis);

        progress.message("Uploading file");
        self.blobs
            .put_object(&key, &request.content_type, request.file.clone(), progress, cancel)
            .await
            .map_err(|e| Self::transfer_failure(e, cancel))?;
        progress.report(100, "File uploaded");

        let file_url = self.blobs.public_url(&key);
        info!(%key, "File stored");

        Ok(NewContentItem::stored(
            request.section_id,
            request.display_title.clone(),
            request.declared_type,
            file_url,
        ))
    }

    async fn ingest_video(
        &self,
        request: &UploadRequest,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<NewContentItem, UploadError> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        progress.message("Requesting video upload slot");
        let slot = self
            .transcoder
            .create_upload_slot()
            .await
            .map_err(UploadError::SlotCreation)?;
        let mut job = TranscodeJob::new(slot.upload_id.clone());
        info!(upload_id = %slot.upload_id, "Upload slot issued");

        progress.message("Uploading video");
        self.transcoder
            .upload_to_slot(&slot, &request.content_type, request.file.clone(), progress, cancel)
            .await
            .map_err(|e| Self::transfer_failure(e, cancel))?;
        progress.report(100, "Video uploaded");

        let refs = TranscodeReadinessPoller::new(self.transcoder.as_ref(), self.poll_policy, cancel)
            .wait_until_playable(&mut job, progress)
            .await?;

        Ok(NewContentItem::transcoded(
            request.section_id,
            request.display_title.clone(),
            refs,
        ))
    }

    fn transfer_failure(err: anyhow::Error, cancel: &CancellationToken) -> UploadError {
        if cancel.is_cancelled() {
            UploadError::Cancelled
        } else {
            warn!(error = %err, "Transfer failed");
            UploadError::Transfer(err)
        }
    }
}
