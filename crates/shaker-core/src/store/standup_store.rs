use crate::api::{ApiError, ListFilter};
use crate::constants::DEFAULT_HEARTBEAT_LIMIT;
use crate::models::{Heartbeat, NewHeartbeat, Standup};

use super::cache_store::CacheStore;

impl CacheStore<Standup> {
    pub async fn fetch_project_standups(&self, project_id: &str) -> Result<Vec<Standup>, ApiError> {
        let filter = ListFilter::new().project(project_id);
        let call = self.api().list::<Standup>(&filter);
        self.load_items("Failed to fetch standups", call, |standup| {
            standup.project_id == project_id
        })
        .await
    }

    /// Pass-through; heartbeats are not cached and do not touch store state.
    pub async fn record_heartbeat(&self, heartbeat: &NewHeartbeat) -> Result<Heartbeat, ApiError> {
        self.api().record_heartbeat(heartbeat).await.map_err(|e| {
            tracing::error!("Error recording heartbeat: {}", e);
            e
        })
    }

    /// Most recent heartbeats for an agent; `None` uses the server default of 50.
    pub async fn agent_heartbeats(
        &self,
        agent_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Heartbeat>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_HEARTBEAT_LIMIT);
        self.api()
            .agent_heartbeats(agent_id, limit)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching heartbeats for {}: {}", agent_id, e);
                e
            })
    }
}
