use crate::api::{ApiError, ListFilter};
use crate::models::Agent;

use super::cache_store::CacheStore;

impl CacheStore<Agent> {
    pub async fn fetch_project_agents(&self, project_id: &str) -> Result<Vec<Agent>, ApiError> {
        let filter = ListFilter::new().project(project_id);
        let call = self.api().list::<Agent>(&filter);
        self.load_items("Failed to fetch project agents", call, |agent| {
            agent.project_id == project_id
        })
        .await
    }

    /// Cached agents currently reporting `active`.
    pub fn active_agents(&self) -> Vec<Agent> {
        self.items().into_iter().filter(Agent::is_active).collect()
    }
}
