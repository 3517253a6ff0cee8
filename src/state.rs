use std::sync::Arc;
use std::time::Duration;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::storage::s3::StorageService;
use crate::infrastructure::transcoding::mux::MuxClient;
use crate::modules::content::repository::PgContentStore;
use crate::modules::upload::coordinator::UploadCoordinator;
use crate::modules::upload::poller::PollPolicy;
use crate::modules::upload::registry::UploadRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub uploads: UploadRegistry,
    pub coordinator: Arc<UploadCoordinator>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, storage: StorageService, transcoder: MuxClient) -> Self {
        let coordinator = UploadCoordinator::new(
            Arc::new(storage),
            Arc::new(transcoder),
            Arc::new(PgContentStore::new(db.clone())),
            PollPolicy::from(config.poll),
        );

        Self {
            uploads: UploadRegistry::new(Duration::from_secs(config.upload_retention_secs)),
            coordinator: Arc::new(coordinator),
            config,
            db,
        }
    }
}
