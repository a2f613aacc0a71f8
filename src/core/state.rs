use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::storage::StorageService;

/// Shared handles cloned into every handler. Storage is optional; video
/// uploads are rejected at the handler level when S3 is not configured.
#[derive(Clone)]
pub(crate) struct AppState {
    shared: Arc<Shared>,
}

struct Shared {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: Option<StorageService>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
    ) -> Self {
        Self { shared: Arc::new(Shared { settings, db, redis, storage }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.shared.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.shared.redis
    }

    pub(crate) fn storage(&self) -> Option<&StorageService> {
        self.shared.storage.as_ref()
    }
}
