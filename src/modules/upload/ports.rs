use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::model::{AssetStatusReport, UploadSlot, UploadStatusReport};
use super::progress::ProgressReporter;

/// Durable object storage for non-video course files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream `body` to `key`, reporting progress as bytes are accepted.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;

    /// Permanent retrieval URL of a stored object.
    fn public_url(&self, key: &str) -> String;
}

/// External video transcoding service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscodingService: Send + Sync {
    async fn create_upload_slot(&self) -> anyhow::Result<UploadSlot>;

    async fn upload_to_slot(
        &self,
        slot: &UploadSlot,
        content_type: &str,
        body: Bytes,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;

    async fn get_upload_status(&self, upload_id: &str) -> anyhow::Result<UploadStatusReport>;

    async fn get_asset_status(&self, asset_id: &str) -> anyhow::Result<AssetStatusReport>;
}
