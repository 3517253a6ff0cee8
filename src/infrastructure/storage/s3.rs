use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::{config::BehaviorVersion, config::Credentials, config::Region, Client};
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::common::upload::{upload_bytes, MultipartTarget};
use crate::modules::upload::ports::BlobStore;
use crate::modules::upload::progress::ProgressReporter;

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
    public_base_url: String,
}

impl StorageService {
    pub fn new(endpoint: &str, bucket: &str, access_key: &str, secret_key: &str, public_base_url: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // MinIO
            .build();

        info!(%endpoint, %bucket, "Object storage client ready");

        Self {
            client: Client::from_conf(config),
            bucket: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }
}

#[async_trait]
impl MultipartTarget for StorageService {
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<String> {
        let result = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        result
            .upload_id
            .ok_or_else(|| anyhow!("Storage returned no upload id for {}", key))
    }

    async fn upload_part(&self, key: &str, upload_id: &str, part_number: i32, body: Bytes) -> Result<CompletedPart> {
        let result = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        let e_tag = result
            .e_tag
            .ok_or_else(|| anyhow!("Storage returned no ETag for part {}", part_number))?;

        Ok(CompletedPart::builder()
            .e_tag(e_tag)
            .part_number(part_number)
            .build())
    }

    async fn complete_multipart_upload(&self, key: &str, upload_id: &str, parts: Vec<CompletedPart>) -> Result<()> {
        let completed = CompletedMultipartUpload::builder().set_parts(Some(parts)).build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(())
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for StorageService {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        upload_bytes(self, key, content_type, body, progress, cancel).await
    }

    fn public_url(&self, key: &str) -> String {
        self.object_url(key)
    }
}
