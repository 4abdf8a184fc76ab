use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::db::Database;
use crate::models::Settings;
use crate::services::fallback::FallbackStore;
use crate::services::local::LocalStore;
use crate::services::remote::RemoteStore;
use crate::services::store::DataStore;

pub struct AppState {
    pub store: Arc<dyn DataStore>,
}

impl AppState {
    /// Picks the backend once: hosted tables with a local fallback when a remote
    /// is configured, SQLite only otherwise.
    pub fn new(settings: Settings) -> Result<Self> {
        if let Some(parent) = settings.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::new(settings.db_path.clone())?;
        let local = LocalStore::new(db);

        let store: Arc<dyn DataStore> = match &settings.remote {
            Some(remote) => Arc::new(FallbackStore::new(RemoteStore::new(remote), local)),
            None => Arc::new(local),
        };
        info!(
            backend = store.backend_name(),
            db = %settings.db_path.display(),
            "Store ready"
        );

        Ok(AppState { store })
    }
}
