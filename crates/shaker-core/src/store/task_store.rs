use crate::api::{ApiError, ListFilter};
use crate::models::Task;

use super::cache_store::CacheStore;

impl CacheStore<Task> {
    pub async fn fetch_project_tasks(&self, project_id: &str) -> Result<Vec<Task>, ApiError> {
        let filter = ListFilter::new().project(project_id);
        let call = self.api().list::<Task>(&filter);
        self.load_items("Failed to fetch project tasks", call, |task| {
            task.project_id == project_id
        })
        .await
    }

    pub async fn fetch_agent_tasks(&self, agent_id: &str) -> Result<Vec<Task>, ApiError> {
        let filter = ListFilter::new().agent(agent_id);
        let call = self.api().list::<Task>(&filter);
        // The agent filter is resolved server-side; a cached task cannot tell
        // whether it belongs, so `current` is left alone
        self.load_items("Failed to fetch agent tasks", call, |_| false)
            .await
    }

    pub fn tasks_with_status(&self, status: &str) -> Vec<Task> {
        self.items()
            .into_iter()
            .filter(|task| task.status == status)
            .collect()
    }
}
