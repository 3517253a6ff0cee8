use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    Running,
    Succeeded { item_id: Uuid },
    Failed { kind: String, reason: String },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadSnapshot {
    pub upload_id: Uuid,
    pub percent: u8,
    pub message: String,
    pub outcome: UploadState,
}

impl UploadSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.outcome != UploadState::Running
    }
}

/// Publishes the `(percent, message)` pair of one upload.
///
/// Percent is clamped to 0..=100 and never moves backwards; once a terminal
/// outcome is published further reports are ignored.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<UploadSnapshot>>,
}

impl ProgressReporter {
    pub fn new(upload_id: Uuid) -> (Self, watch::Receiver<UploadSnapshot>) {
        let (tx, rx) = watch::channel(UploadSnapshot {
            upload_id,
            percent: 0,
            message: "Queued".to_string(),
            outcome: UploadState::Running,
        });
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn report(&self, percent: u8, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_if_modified(|snapshot| {
            if snapshot.is_terminal() {
                return false;
            }
            let percent = percent.min(100).max(snapshot.percent);
            let changed = percent != snapshot.percent || message != snapshot.message;
            snapshot.percent = percent;
            snapshot.message = message;
            changed
        });
    }

    /// Report progress of a byte stream of `total` bytes.
    pub fn report_bytes(&self, sent: u64, total: u64, message: &str) {
        let percent = if total == 0 {
            100
        } else {
            (sent.min(total).saturating_mul(100) / total) as u8
        };
        self.report(percent, message);
    }

    /// Change the message without touching the percentage.
    pub fn message(&self, message: impl Into<String>) {
        self.report(0, message);
    }

    pub fn finish(&self, outcome: UploadState) {
        self.tx.send_modify(|snapshot| {
            if snapshot.is_terminal() {
                return;
            }
            snapshot.message = match &outcome {
                UploadState::Running => return,
                UploadState::Succeeded { .. } => {
                    snapshot.percent = 100;
                    "Upload complete".to_string()
                }
                UploadState::Failed { reason, .. } => format!("Upload failed: {}", reason),
                UploadState::Cancelled => "Upload cancelled".to_string(),
            };
            snapshot.outcome = outcome;
        });
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_never_decreases_and_is_bounded() {
        let (reporter, rx) = ProgressReporter::new(Uuid::new_v4());
        let mut seen = Vec::new();

        for value in [0u8, 10, 5, 40, 200, 30, 100] {
            reporter.report(value, "Uploading");
            seen.push(rx.borrow().percent);
        }

        assert_eq!(seen, vec![0, 10, 10, 40, 100, 100, 100]);
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn byte_progress_is_proportional() {
        let (reporter, _rx) = ProgressReporter::new(Uuid::new_v4());
        reporter.report_bytes(512, 2048, "Uploading");
        assert_eq!(reporter.snapshot().percent, 25);
        reporter.report_bytes(4096, 2048, "Uploading");
        assert_eq!(reporter.snapshot().percent, 100);
    }

    #[test]
    fn message_keeps_percent() {
        let (reporter, _rx) = ProgressReporter::new(Uuid::new_v4());
        reporter.report(60, "Uploading video");
        reporter.message("Processing video");
        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.percent, 60);
        assert_eq!(snapshot.message, "Processing video");
    }

    #[test]
    fn terminal_outcome_is_final() {
        let (reporter, rx) = ProgressReporter::new(Uuid::new_v4());
        reporter.report(30, "Uploading");
        reporter.finish(UploadState::Failed {
            kind: "transfer_error".to_string(),
            reason: "connection reset".to_string(),
        });
        reporter.report(90, "Uploading");
        reporter.finish(UploadState::Cancelled);

        let snapshot = rx.borrow().clone();
        assert!(snapshot.is_terminal());
        assert_eq!(snapshot.percent, 30);
        assert!(matches!(snapshot.outcome, UploadState::Failed { .. }));
    }

    #[test]
    fn success_completes_the_bar() {
        let (reporter, _rx) = ProgressReporter::new(Uuid::new_v4());
        let item_id = Uuid::new_v4();
        reporter.finish(UploadState::Succeeded { item_id });
        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.percent, 100);
        assert_eq!(snapshot.outcome, UploadState::Succeeded { item_id });
    }
}
