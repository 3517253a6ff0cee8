use serde::Deserialize;
use std::time::Duration;
use crate::config::env::{self, EnvKey};

const DEFAULT_MUX_BASE_URL: &str = "https://api.mux.com";

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub minio_url: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    /// Base used to build permanent retrieval URLs; defaults to the MinIO endpoint.
    pub storage_public_url: String,
    pub mux: MuxConfig,
    pub poll: PollSettings,
    pub max_upload_bytes: usize,
    pub upload_retention_secs: u64,
    pub jwt_secret: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MuxConfig {
    pub base_url: String,
    pub token_id: String,
    pub token_secret: String,
    pub cors_origin: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        let minio_url = env::get(EnvKey::MinioUrl)?;

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            database_url: env::get(EnvKey::DatabaseUrl)?,
            storage_public_url: env::get_or(EnvKey::StoragePublicUrl, &minio_url),
            minio_url,
            minio_bucket: env::get(EnvKey::MinioBucket)?,
            minio_access_key: env::get(EnvKey::MinioAccessKey)?,
            minio_secret_key: env::get(EnvKey::MinioSecretKey)?,
            mux: MuxConfig {
                base_url: env::get_or(EnvKey::MuxBaseUrl, DEFAULT_MUX_BASE_URL),
                token_id: env::get(EnvKey::MuxTokenId)?,
                token_secret: env::get(EnvKey::MuxTokenSecret)?,
                cors_origin: env::get_or(EnvKey::MuxCorsOrigin, "*"),
            },
            poll: PollSettings {
                interval_secs: env::get_parsed(EnvKey::PollIntervalSecs, 5),
                max_attempts: env::get_parsed(EnvKey::PollMaxAttempts, 60),
            },
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, 512 * 1024 * 1024),
            upload_retention_secs: env::get_parsed(EnvKey::UploadRetentionSecs, 3600),
            jwt_secret: env::get(EnvKey::JwtSecret)?,
        })
    }
}
