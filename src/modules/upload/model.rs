use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::modules::content::model::ItemType;

/// One locally selected file on its way to becoming a course item.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: Bytes,
    pub file_name: String,
    pub content_type: String,
    pub declared_type: ItemType,
    pub display_title: String,
    pub course_id: Uuid,
    pub section_id: Uuid,
}

/// Status of an external ingestion job or asset as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Ready,
    Errored,
}

/// Single-use ingest target issued by the transcoding service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub upload_id: String,
    pub upload_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStatusReport {
    pub asset_id: Option<String>,
    pub status: JobStatus,
    pub raw_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStatusReport {
    pub status: JobStatus,
    pub playback_id: Option<String>,
    pub raw_status: String,
}

/// In-flight processing job on the transcoding service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub upload_slot_id: String,
    pub asset_id: Option<String>,
    pub status: JobStatus,
    pub playback_id: Option<String>,
}

impl TranscodeJob {
    pub fn new(upload_slot_id: impl Into<String>) -> Self {
        Self {
            upload_slot_id: upload_slot_id.into(),
            asset_id: None,
            status: JobStatus::Pending,
            playback_id: None,
        }
    }
}

