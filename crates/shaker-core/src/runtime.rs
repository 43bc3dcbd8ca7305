use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::api::{ApiClient, ApiError};
use crate::config::CoreConfig;
use crate::realtime::{ConnectionManager, ProjectSync};
use crate::store::Stores;

/// Owns the API client, the stores and the push channel for one backend.
pub struct ShakerRuntime {
    config: CoreConfig,
    api: ApiClient,
    stores: Stores,
    connection: ConnectionManager,
    sync: Mutex<Option<ProjectSync>>,
    backend_reachable: AtomicBool,
}

impl ShakerRuntime {
    pub fn new(config: CoreConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let stores = Stores::new(&api);
        let connection = ConnectionManager::new(config.clone());

        Ok(Self {
            config,
            api,
            stores,
            connection,
            sync: Mutex::new(None),
            backend_reachable: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Switches the push channel to `project_id` and keeps its collections in
    /// sync. A blank id leaves the current selection untouched.
    pub fn select_project(&self, project_id: &str) {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            tracing::error!("Cannot select a project without an id");
            return;
        }

        let mut sync = self.sync.lock();
        // Drop the old listeners before the new channel can deliver anything
        sync.take();
        self.connection.connect(project_id);
        *sync = Some(ProjectSync::attach(&self.connection, &self.stores, project_id));
        tracing::info!("Selected project {}", project_id);
    }

    pub fn active_project(&self) -> Option<String> {
        self.sync.lock().as_ref().map(|s| s.project_id().to_string())
    }

    /// Stops syncing and closes the push channel; stores keep their contents.
    pub fn deselect_project(&self) {
        self.sync.lock().take();
        self.connection.disconnect();
    }

    /// Probes `/health` and records the result. Never touches store state.
    pub async fn check_health(&self) -> bool {
        let reachable = self.api.check_health().await;
        self.backend_reachable.store(reachable, Ordering::Relaxed);
        reachable
    }

    pub fn is_backend_reachable(&self) -> bool {
        self.backend_reachable.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        self.deselect_project();
        tracing::debug!("Runtime shut down");
    }
}

impl Drop for ShakerRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
