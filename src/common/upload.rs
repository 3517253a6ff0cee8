use crate::modules::upload::progress::ProgressReporter;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use aws_sdk_s3::types::CompletedPart;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// S3 rejects non-final parts under 5MB.
pub const PART_SIZE: usize = 6 * 1024 * 1024;

/// Keep only `[A-Za-z0-9.-]` so the name is safe inside an object key.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Split `len` bytes into `(start, end)` ranges of at most `part_size`.
fn part_ranges(len: usize, part_size: usize) -> Vec<(usize, usize)> {
    (0..len)
        .step_by(part_size.max(1))
        .map(|start| (start, (start + part_size).min(len)))
        .collect()
}

/// Object store that accepts multipart uploads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MultipartTarget: Send + Sync {
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<String>;

    async fn upload_part(&self, key: &str, upload_id: &str, part_number: i32, body: Bytes) -> Result<CompletedPart>;

    async fn complete_multipart_upload(&self, key: &str, upload_id: &str, parts: Vec<CompletedPart>) -> Result<()>;

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()>;
}

pub struct MultipartUploader<'a> {
    storage: &'a dyn MultipartTarget,
    key: String,
    upload_id: String,
    parts: Vec<CompletedPart>,
}

impl<'a> MultipartUploader<'a> {
    pub async fn new(storage: &'a dyn MultipartTarget, key: &str, content_type: &str) -> Result<Self> {
        let upload_id = storage
            .create_multipart_upload(key, content_type)
            .await
            .map_err(|e| anyhow!("Failed to initiate upload: {}", e))?;

        Ok(Self {
            storage,
            key: key.to_string(),
            upload_id,
            parts: Vec::new(),
        })
    }

    async fn send_part(&mut self, body: Bytes) -> Result<()> {
        let part_number = self.parts.len() as i32 + 1;
        let part = self
            .storage
            .upload_part(&self.key, &self.upload_id, part_number, body)
            .await
            .map_err(|e| anyhow!("Failed to upload part {}: {}", part_number, e))?;

        self.parts.push(part);
        Ok(())
    }

    async fn finish(self) -> Result<()> {
        self.storage
            .complete_multipart_upload(&self.key, &self.upload_id, self.parts)
            .await
            .map_err(|e| anyhow!("Failed to complete upload: {}", e))
    }

    async fn abort(&self) {
        if let Err(e) = self
            .storage
            .abort_multipart_upload(&self.key, &self.upload_id)
            .await
        {
            error!(key = %self.key, "Failed to abort upload: {}", e);
        }
    }
}

/// Send `body` to `key` part by part, reporting progress after each part.
///
/// Cancellation is honoured between parts; an aborted upload leaves no object
/// behind.
pub async fn upload_bytes(
    storage: &dyn MultipartTarget,
    key: &str,
    content_type: &str,
    body: Bytes,
    progress: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<()> {
    let total = body.len() as u64;
    let mut uploader = MultipartUploader::new(storage, key, content_type).await?;
    let mut sent = 0u64;

    // An empty object still needs one (empty) part.
    let ranges = match part_ranges(body.len(), PART_SIZE) {
        ranges if ranges.is_empty() => vec![(0, 0)],
        ranges => ranges,
    };

    for (start, end) in ranges {
        if cancel.is_cancelled() {
            uploader.abort().await;
            bail!("Upload of {} cancelled", key);
        }

        if let Err(e) = uploader.send_part(body.slice(start..end)).await {
            error!("Upload error: {}", e);
            uploader.abort().await;
            return Err(e);
        }

        sent += (end - start) as u64;
        progress.report_bytes(sent, total, "Uploading file");
    }

    uploader.finish().await?;
    info!(%key, bytes = total, "Multipart upload completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    const MB: usize = 1024 * 1024;

    fn part(part_number: i32) -> CompletedPart {
        CompletedPart::builder()
            .e_tag(format!("etag-{}", part_number))
            .part_number(part_number)
            .build()
    }

    fn target_with_session() -> MockMultipartTarget {
        let mut target = MockMultipartTarget::new();
        target
            .expect_create_multipart_upload()
            .withf(|key, content_type| key == "courses/c/audio/1_talk.mp3" && content_type == "audio/mpeg")
            .times(1)
            .returning(|_, _| Ok("mpu-1".to_string()));
        target
    }

    #[tokio::test]
    async fn reports_progress_after_every_part() {
        let (progress, rx) = ProgressReporter::new(Uuid::new_v4());
        let cancel = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sizes = Arc::new(Mutex::new(Vec::new()));

        let mut target = target_with_session();
        let (seen_in_part, sizes_in_part) = (seen.clone(), sizes.clone());
        target
            .expect_upload_part()
            .withf(|_, upload_id, _, _| upload_id == "mpu-1")
            .times(3)
            .returning(move |_, _, part_number, body| {
                seen_in_part.lock().unwrap().push(rx.borrow().percent);
                sizes_in_part.lock().unwrap().push(body.len());
                Ok(part(part_number))
            });
        target
            .expect_complete_multipart_upload()
            .withf(|_, _, parts| {
                parts.iter().map(|p| p.part_number()).collect::<Vec<_>>() == vec![Some(1), Some(2), Some(3)]
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        target.expect_abort_multipart_upload().times(0);

        let body = Bytes::from(vec![1u8; 13 * MB]);
        upload_bytes(&target, "courses/c/audio/1_talk.mp3", "audio/mpeg", body, &progress, &cancel)
            .await
            .unwrap();

        let mut percents = seen.lock().unwrap().clone();
        percents.push(progress.snapshot().percent);
        assert_eq!(percents, vec![0, 46, 92, 100]);
        assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(*sizes.lock().unwrap(), vec![PART_SIZE, PART_SIZE, MB]);
    }

    #[tokio::test]
    async fn cancellation_between_parts_aborts_without_completing() {
        let (progress, _rx) = ProgressReporter::new(Uuid::new_v4());
        let cancel = CancellationToken::new();

        let mut target = target_with_session();
        let cancel_after_first = cancel.clone();
        target.expect_upload_part().times(1).returning(move |_, _, part_number, _| {
            cancel_after_first.cancel();
            Ok(part(part_number))
        });
        target.expect_complete_multipart_upload().times(0);
        target
            .expect_abort_multipart_upload()
            .withf(|key, upload_id| key == "courses/c/audio/1_talk.mp3" && upload_id == "mpu-1")
            .times(1)
            .returning(|_, _| Ok(()));

        let body = Bytes::from(vec![1u8; 13 * MB]);
        let result = upload_bytes(&target, "courses/c/audio/1_talk.mp3", "audio/mpeg", body, &progress, &cancel).await;

        assert!(result.is_err());
        assert!(progress.snapshot().percent < 100);
    }

    #[tokio::test]
    async fn failed_part_aborts_and_keeps_the_part_error() {
        let (progress, _rx) = ProgressReporter::new(Uuid::new_v4());
        let cancel = CancellationToken::new();

        let mut target = target_with_session();
        target.expect_upload_part().times(2).returning(|_, _, part_number, _| {
            if part_number == 2 {
                Err(anyhow!("connection reset"))
            } else {
                Ok(part(part_number))
            }
        });
        target.expect_complete_multipart_upload().times(0);
        target
            .expect_abort_multipart_upload()
            .times(1)
            .returning(|_, _| Err(anyhow!("abort refused")));

        let body = Bytes::from(vec![1u8; 13 * MB]);
        let err = upload_bytes(&target, "courses/c/audio/1_talk.mp3", "audio/mpeg", body, &progress, &cancel)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_file_name("Week 1 notes (final).pdf"), "Week1notesfinal.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_file_name("intro-v2.mp3"), "intro-v2.mp3");
    }

    #[test]
    fn sanitize_falls_back_when_nothing_survives() {
        assert_eq!(sanitize_file_name("日本語"), "file");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("/.."), "file");
    }

    #[test]
    fn parts_cover_body_without_overlap() {
        let ranges = part_ranges(13, 5);
        assert_eq!(ranges, vec![(0, 5), (5, 10), (10, 13)]);
        assert!(part_ranges(0, 5).is_empty());
        assert_eq!(part_ranges(PART_SIZE, PART_SIZE), vec![(0, PART_SIZE)]);
    }
}
