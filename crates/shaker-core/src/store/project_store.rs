use crate::api::ApiError;
use crate::models::Project;

use super::cache_store::CacheStore;

impl CacheStore<Project> {
    /// Projects take a whole-entity replace on status change, unlike agents
    /// and tasks, since the backend may touch other fields (e.g. `updated_at`).
    pub async fn update_project_status(&self, id: &str, status: &str) -> Result<Project, ApiError> {
        let call = self.api().update_status::<Project>(id, status);
        self.replace_with("Failed to update project status", id, call)
            .await
    }
}
