use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::settings::MuxConfig;
use crate::modules::upload::model::{AssetStatusReport, JobStatus, UploadSlot, UploadStatusReport};
use crate::modules::upload::ports::TranscodingService;
use crate::modules::upload::progress::ProgressReporter;

const CHUNK_SIZE: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DirectUpload {
    id: String,
    #[serde(default)]
    url: Option<String>,
    status: String,
    #[serde(default)]
    asset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaybackId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Asset {
    status: String,
    #[serde(default)]
    playback_ids: Vec<PlaybackId>,
}

fn upload_job_status(raw: &str) -> JobStatus {
    match raw {
        "asset_created" => JobStatus::Ready,
        "errored" | "cancelled" | "timed_out" => JobStatus::Errored,
        _ => JobStatus::Pending,
    }
}

fn asset_job_status(raw: &str) -> JobStatus {
    match raw {
        "ready" => JobStatus::Ready,
        "errored" => JobStatus::Errored,
        _ => JobStatus::Pending,
    }
}

impl From<DirectUpload> for UploadStatusReport {
    fn from(upload: DirectUpload) -> Self {
        Self {
            status: upload_job_status(&upload.status),
            asset_id: upload.asset_id,
            raw_status: upload.status,
        }
    }
}

impl From<Asset> for AssetStatusReport {
    fn from(asset: Asset) -> Self {
        Self {
            status: asset_job_status(&asset.status),
            playback_id: asset.playback_ids.into_iter().next().map(|p| p.id),
            raw_status: asset.status,
        }
    }
}

/// Mux Video API client: direct uploads and asset status.
pub struct MuxClient {
    http_client: Client,
    config: MuxConfig,
}

impl MuxClient {
    pub fn new(config: MuxConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for Mux")?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/video/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn read_data<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("Mux {} failed: {} - {}", action, status, error_text);
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Mux {} response", action))?;
        Ok(envelope.data)
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str, action: &str) -> Result<T> {
        let response = self
            .http_client
            .get(self.endpoint(path))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Failed to reach Mux for {}", action))?;

        Self::read_data(response, action).await
    }
}

#[async_trait]
impl TranscodingService for MuxClient {
    async fn create_upload_slot(&self) -> Result<UploadSlot> {
        let response = self
            .http_client
            .post(self.endpoint("uploads"))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .timeout(Duration::from_secs(30))
            .json(&json!({
                "cors_origin": self.config.cors_origin,
                "new_asset_settings": { "playback_policy": ["public"] },
            }))
            .send()
            .await
            .context("Failed to reach Mux to create an upload")?;

        let upload: DirectUpload = Self::read_data(response, "upload creation").await?;
        let upload_url = upload
            .url
            .ok_or_else(|| anyhow!("Mux upload {} has no upload URL", upload.id))?;

        debug!(upload_id = %upload.id, "Mux direct upload created");
        Ok(UploadSlot {
            upload_id: upload.id,
            upload_url,
        })
    }

    async fn upload_to_slot(
        &self,
        slot: &UploadSlot,
        content_type: &str,
        body: Bytes,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let total = body.len() as u64;
        let reporter = progress.clone();
        // A chunk counts once the next one is pulled; the last one only when the server answers.
        let chunks = stream::iter((0..body.len()).step_by(CHUNK_SIZE)).map(move |start| {
            reporter.report_bytes(start as u64, total, "Uploading video");
            let end = (start + CHUNK_SIZE).min(body.len());
            Ok::<Bytes, std::io::Error>(body.slice(start..end))
        });

        let request = self
            .http_client
            .put(&slot.upload_url)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(chunks))
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => bail!("Video upload {} cancelled", slot.upload_id),
            response = request => response.context("Failed to send video to Mux")?,
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("Mux rejected video upload: {} - {}", status, error_text);
        }

        progress.report_bytes(total, total, "Uploading video");
        info!(upload_id = %slot.upload_id, bytes = total, "Video sent to Mux");
        Ok(())
    }

    async fn get_upload_status(&self, upload_id: &str) -> Result<UploadStatusReport> {
        let upload: DirectUpload = self
            .get_data(&format!("uploads/{}", upload_id), "upload status")
            .await?;
        Ok(upload.into())
    }

    async fn get_asset_status(&self, asset_id: &str) -> Result<AssetStatusReport> {
        let asset: Asset = self
            .get_data(&format!("assets/{}", asset_id), "asset status")
            .await?;
        Ok(asset.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::put;
    use axum::Router;
    use std::sync::{Arc, Mutex};
    use tokio::sync::watch;
    use uuid::Uuid;

    use crate::modules::upload::progress::UploadSnapshot;

    #[derive(Clone)]
    struct SlotEndpoint {
        received: Arc<Mutex<Option<(Bytes, String)>>>,
        percent_at_arrival: Arc<Mutex<Option<u8>>>,
        progress: watch::Receiver<UploadSnapshot>,
        status: StatusCode,
    }

    async fn receive(State(endpoint): State<SlotEndpoint>, headers: HeaderMap, body: Bytes) -> StatusCode {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        *endpoint.percent_at_arrival.lock().unwrap() = Some(endpoint.progress.borrow().percent);
        *endpoint.received.lock().unwrap() = Some((body, content_type));
        endpoint.status
    }

    async fn serve_slot(endpoint: SlotEndpoint) -> UploadSlot {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/upload/{id}", put(receive))
            .with_state(endpoint);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        UploadSlot {
            upload_id: "up-1".to_string(),
            upload_url: format!("http://{}/upload/up-1", addr),
        }
    }

    fn client() -> MuxClient {
        MuxClient::new(MuxConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            token_id: "id".to_string(),
            token_secret: "secret".to_string(),
            cors_origin: "*".to_string(),
        })
        .unwrap()
    }

    fn endpoint(progress: watch::Receiver<UploadSnapshot>, status: StatusCode) -> SlotEndpoint {
        SlotEndpoint {
            received: Arc::new(Mutex::new(None)),
            percent_at_arrival: Arc::new(Mutex::new(None)),
            progress,
            status,
        }
    }

    #[tokio::test]
    async fn slot_upload_delivers_every_byte_with_rising_progress() {
        let (progress, rx) = ProgressReporter::new(Uuid::new_v4());
        let endpoint = endpoint(rx.clone(), StatusCode::OK);
        let slot = serve_slot(endpoint.clone()).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut watcher_rx = rx.clone();
        let watcher_seen = seen.clone();
        let watcher = tokio::spawn(async move {
            while watcher_rx.changed().await.is_ok() {
                let percent = watcher_rx.borrow_and_update().percent;
                watcher_seen.lock().unwrap().push(percent);
            }
        });

        let body: Bytes = (0..(3 * CHUNK_SIZE + 1000)).map(|n| (n % 251) as u8).collect::<Vec<u8>>().into();
        client()
            .upload_to_slot(&slot, "video/mp4", body.clone(), &progress, &CancellationToken::new())
            .await
            .unwrap();

        let (received, content_type) = endpoint.received.lock().unwrap().clone().unwrap();
        assert_eq!(received, body);
        assert_eq!(content_type, "video/mp4");

        let at_arrival = endpoint.percent_at_arrival.lock().unwrap().unwrap();
        assert!(at_arrival < 100, "bar reached {} before the server answered", at_arrival);
        assert_eq!(progress.snapshot().percent, 100);

        tokio::task::yield_now().await;
        watcher.abort();
        let seen = seen.lock().unwrap().clone();
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", seen);
        assert!(seen.iter().all(|percent| *percent <= 100));
    }

    #[tokio::test]
    async fn rejected_slot_upload_is_an_error_without_completion() {
        let (progress, rx) = ProgressReporter::new(Uuid::new_v4());
        let slot = serve_slot(endpoint(rx, StatusCode::BAD_REQUEST)).await;

        let err = client()
            .upload_to_slot(&slot, "video/mp4", Bytes::from(vec![0u8; 1024]), &progress, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("400"));
        assert!(progress.snapshot().percent < 100);
    }

    #[test]
    fn upload_statuses_map_to_job_status() {
        assert_eq!(upload_job_status("waiting"), JobStatus::Pending);
        assert_eq!(upload_job_status("asset_created"), JobStatus::Ready);
        assert_eq!(upload_job_status("errored"), JobStatus::Errored);
        assert_eq!(upload_job_status("timed_out"), JobStatus::Errored);
        assert_eq!(upload_job_status("cancelled"), JobStatus::Errored);
    }

    #[test]
    fn asset_statuses_map_to_job_status() {
        assert_eq!(asset_job_status("preparing"), JobStatus::Pending);
        assert_eq!(asset_job_status("ready"), JobStatus::Ready);
        assert_eq!(asset_job_status("errored"), JobStatus::Errored);
    }

    #[test]
    fn parses_upload_envelope() {
        let body = r#"{"data":{"id":"up-1","url":"https://storage.mux.com/up-1","status":"asset_created","asset_id":"a1","timeout":3600}}"#;
        let envelope: Envelope<DirectUpload> = serde_json::from_str(body).unwrap();
        let report = UploadStatusReport::from(envelope.data);

        assert_eq!(report.status, JobStatus::Ready);
        assert_eq!(report.asset_id.as_deref(), Some("a1"));
        assert_eq!(report.raw_status, "asset_created");
    }

    #[test]
    fn parses_asset_playback_id() {
        let body = r#"{"data":{"id":"a1","status":"ready","playback_ids":[{"id":"p1","policy":"public"}]}}"#;
        let envelope: Envelope<Asset> = serde_json::from_str(body).unwrap();
        let report = AssetStatusReport::from(envelope.data);

        assert_eq!(report.status, JobStatus::Ready);
        assert_eq!(report.playback_id.as_deref(), Some("p1"));
    }

    #[test]
    fn preparing_asset_has_no_playback_id() {
        let body = r#"{"data":{"id":"a1","status":"preparing"}}"#;
        let envelope: Envelope<Asset> = serde_json::from_str(body).unwrap();
        let report = AssetStatusReport::from(envelope.data);

        assert_eq!(report.status, JobStatus::Pending);
        assert!(report.playback_id.is_none());
    }
}
