use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use super::coordinator::UploadCoordinator;
use super::error::UploadError;
use super::model::UploadRequest;
use super::progress::{ProgressReporter, UploadSnapshot, UploadState};

struct TrackedUpload {
    progress: watch::Receiver<UploadSnapshot>,
    cancel: CancellationToken,
    finished_at: Option<Instant>,
}

/// Uploads started over HTTP, each running as its own task.
///
/// Finished uploads stay visible for `retention` so clients can read the
/// outcome, then are dropped on the next registration.
#[derive(Clone)]
pub struct UploadRegistry {
    uploads: Arc<Mutex<HashMap<Uuid, TrackedUpload>>>,
    retention: Duration,
}

impl UploadRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            uploads: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    pub async fn start(&self, coordinator: Arc<UploadCoordinator>, request: UploadRequest) -> UploadSnapshot {
        let upload_id = Uuid::new_v4();
        let (reporter, progress) = ProgressReporter::new(upload_id);
        let cancel = CancellationToken::new();
        let snapshot = reporter.snapshot();

        {
            let mut uploads = self.uploads.lock().await;
            let retention = self.retention;
            uploads.retain(|_, tracked| {
                tracked
                    .finished_at
                    .map_or(true, |finished| finished.elapsed() < retention)
            });
            uploads.insert(
                upload_id,
                TrackedUpload {
                    progress,
                    cancel: cancel.clone(),
                    finished_at: None,
                },
            );
        }

        let registry = self.clone();
        let span = tracing::info_span!("upload_task", %upload_id);
        tokio::spawn(
            async move {
                // The run gets its own task so a panic still settles the snapshot.
                let run = {
                    let reporter = reporter.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(
                        async move { coordinator.run(request, &reporter, &cancel).await }.in_current_span(),
                    )
                };

                match run.await {
                    Ok(Ok(item)) => reporter.finish(UploadState::Succeeded { item_id: item.id }),
                    Ok(Err(UploadError::Cancelled)) => {
                        info!("Upload cancelled");
                        reporter.finish(UploadState::Cancelled);
                    }
                    Ok(Err(e)) => {
                        error!(kind = e.kind(), phase = ?e.phase(), error = %e, "Upload failed");
                        reporter.finish(UploadState::Failed {
                            kind: e.kind().to_string(),
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Upload task aborted");
                        reporter.finish(UploadState::Failed {
                            kind: "internal_error".to_string(),
                            reason: "upload task panicked".to_string(),
                        });
                    }
                }
                registry.mark_finished(upload_id).await;
            }
            .instrument(span),
        );

        snapshot
    }

    async fn mark_finished(&self, upload_id: Uuid) {
        if let Some(tracked) = self.uploads.lock().await.get_mut(&upload_id) {
            tracked.finished_at = Some(Instant::now());
        }
    }

    pub async fn snapshot(&self, upload_id: Uuid) -> Option<UploadSnapshot> {
        let uploads = self.uploads.lock().await;
        uploads.get(&upload_id).map(|tracked| tracked.progress.borrow().clone())
    }

    /// Wait up to `timeout` for the upload to reach a terminal outcome and
    /// return the latest snapshot either way.
    pub async fn wait(&self, upload_id: Uuid, timeout: Duration) -> Option<UploadSnapshot> {
        let mut progress = {
            let uploads = self.uploads.lock().await;
            uploads.get(&upload_id)?.progress.clone()
        };

        let _ = tokio::time::timeout(timeout, progress.wait_for(|snapshot| snapshot.is_terminal())).await;
        let latest = progress.borrow().clone();
        Some(latest)
    }

    /// Signal cancellation; the task settles on its own.
    pub async fn cancel(&self, upload_id: Uuid) -> Option<UploadSnapshot> {
        let uploads = self.uploads.lock().await;
        let tracked = uploads.get(&upload_id)?;
        if !tracked.progress.borrow().is_terminal() {
            info!(%upload_id, "Cancellation requested");
            tracked.cancel.cancel();
        }
        let snapshot = tracked.progress.borrow().clone();
        Some(snapshot)
    }
}
