use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    MinioUrl,
    MinioBucket,
    MinioAccessKey,
    MinioSecretKey,
    StoragePublicUrl,
    MuxBaseUrl,
    MuxTokenId,
    MuxTokenSecret,
    MuxCorsOrigin,
    PollIntervalSecs,
    PollMaxAttempts,
    MaxUploadBytes,
    UploadRetentionSecs,
    JwtSecret,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::MinioUrl => "MINIO_ENDPOINT",
            EnvKey::MinioBucket => "MINIO_BUCKET_CONTENT",
            EnvKey::MinioAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::MinioSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::StoragePublicUrl => "STORAGE_PUBLIC_URL",
            EnvKey::MuxBaseUrl => "MUX_BASE_URL",
            EnvKey::MuxTokenId => "MUX_TOKEN_ID",
            EnvKey::MuxTokenSecret => "MUX_TOKEN_SECRET",
            EnvKey::MuxCorsOrigin => "MUX_CORS_ORIGIN",
            EnvKey::PollIntervalSecs => "TRANSCODE_POLL_INTERVAL_SECS",
            EnvKey::PollMaxAttempts => "TRANSCODE_POLL_MAX_ATTEMPTS",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
            EnvKey::UploadRetentionSecs => "UPLOAD_RETENTION_SECS",
            EnvKey::JwtSecret => "JWT_SECRET",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
