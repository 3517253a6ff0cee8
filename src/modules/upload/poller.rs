use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{PollPhase, UploadError};
use super::model::{JobStatus, TranscodeJob};
use super::ports::TranscodingService;
use super::progress::ProgressReporter;
use crate::config::settings::PollSettings;
use crate::modules::content::model::TranscodingRefs;

/// Fixed-interval attempt budget shared by both polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        Self {
            interval: settings.interval(),
            max_attempts: settings.max_attempts.max(1),
        }
    }
}

enum Observation<T> {
    Done(T),
    Errored(String),
    NotReady,
}

/// Waits for an uploaded video to be ingested and become playable.
pub struct TranscodeReadinessPoller<'a> {
    transcoder: &'a dyn TranscodingService,
    policy: PollPolicy,
    cancel: &'a CancellationToken,
}

impl<'a> TranscodeReadinessPoller<'a> {
    pub fn new(transcoder: &'a dyn TranscodingService, policy: PollPolicy, cancel: &'a CancellationToken) -> Self {
        Self {
            transcoder,
            policy,
            cancel,
        }
    }

    /// Runs the ingestion poll and then the asset-readiness poll, updating `job`.
    pub async fn wait_until_playable(
        &self,
        job: &mut TranscodeJob,
        progress: &ProgressReporter,
    ) -> Result<TranscodingRefs, UploadError> {
        progress.message("Waiting for the video to be ingested");
        let upload_id = job.upload_slot_id.clone();
        let asset_id = self
            .poll(PollPhase::Ingestion, || self.observe_upload(&upload_id))
            .await
            .inspect_err(|e| Self::mark_failed(job, e))?;
        job.asset_id = Some(asset_id.clone());

        progress.message("Processing video");
        let playback_id = self
            .poll(PollPhase::AssetReadiness, || self.observe_asset(&asset_id))
            .await
            .inspect_err(|e| Self::mark_failed(job, e))?;
        job.playback_id = Some(playback_id.clone());
        job.status = JobStatus::Ready;

        Ok(TranscodingRefs {
            asset_id,
            playback_id,
        })
    }

    fn mark_failed(job: &mut TranscodeJob, err: &UploadError) {
        if matches!(err, UploadError::Job { .. }) {
            job.status = JobStatus::Errored;
        }
    }

    async fn poll<T, F, Fut>(&self, phase: PollPhase, mut observe: F) -> Result<T, UploadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Observation<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            let observation = tokio::select! {
                _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                observation = observe() => observation,
            };

            match observation {
                Observation::Done(value) => {
                    info!(%phase, attempt, "Transcoding poll succeeded");
                    return Ok(value);
                }
                Observation::Errored(status) => {
                    warn!(%phase, attempt, %status, "Transcoding job reported an error");
                    return Err(UploadError::Job { phase, status });
                }
                Observation::NotReady => {
                    debug!(%phase, attempt, max_attempts, "Transcoding not ready yet");
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                    _ = sleep(self.policy.interval) => {}
                }
            }
        }

        warn!(%phase, attempts = max_attempts, "Transcoding poll exhausted its attempts");
        Err(UploadError::PollTimeout {
            phase,
            attempts: max_attempts,
        })
    }

    async fn observe_upload(&self, upload_id: &str) -> Observation<String> {
        match self.transcoder.get_upload_status(upload_id).await {
            Ok(report) => match report.asset_id.filter(|id| !id.is_empty()) {
                Some(asset_id) => Observation::Done(asset_id),
                None if report.status == JobStatus::Errored => Observation::Errored(report.raw_status),
                None => Observation::NotReady,
            },
            Err(e) => {
                warn!(upload_id, error = %e, "Upload status query failed");
                Observation::NotReady
            }
        }
    }

    async fn observe_asset(&self, asset_id: &str) -> Observation<String> {
        match self.transcoder.get_asset_status(asset_id).await {
            Ok(report) => match report.status {
                JobStatus::Errored => Observation::Errored(report.raw_status),
                JobStatus::Ready => match report.playback_id.filter(|id| !id.is_empty()) {
                    Some(playback_id) => Observation::Done(playback_id),
                    None => Observation::NotReady,
                },
                JobStatus::Pending => Observation::NotReady,
            },
            Err(e) => {
                warn!(asset_id, error = %e, "Asset status query failed");
                Observation::NotReady
            }
        }
    }
}
