use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::modules::content::error::ContentError;

/// Which of the two transcoding polls was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    Ingestion,
    AssetReadiness,
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollPhase::Ingestion => f.write_str("ingestion"),
            PollPhase::AssetReadiness => f.write_str("asset readiness"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File transfer failed: {0}")]
    Transfer(#[source] anyhow::Error),

    #[error("Transcoding service refused an upload slot: {0}")]
    SlotCreation(#[source] anyhow::Error),

    #[error("Transcoding {phase} reported an error (status: {status})")]
    Job { phase: PollPhase, status: String },

    #[error("Transcoding {phase} timed out after {attempts} attempts")]
    PollTimeout { phase: PollPhase, attempts: u32 },

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Failed to save content item: {0}")]
    Persist(#[source] ContentError),
}

impl UploadError {
    /// Stable identifier for clients and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Transfer(_) => "transfer_error",
            UploadError::SlotCreation(_) => "slot_creation_error",
            UploadError::Job { .. } => "job_error",
            UploadError::PollTimeout { .. } => "poll_timeout",
            UploadError::Cancelled => "cancelled",
            UploadError::Persist(_) => "persist_error",
        }
    }

    pub fn phase(&self) -> Option<PollPhase> {
        match self {
            UploadError::Job { phase, .. } | UploadError::PollTimeout { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
