use crate::api::{ApiError, ListFilter};
use crate::models::Context;

use super::cache_store::CacheStore;

impl CacheStore<Context> {
    pub async fn fetch_project_contexts(&self, project_id: &str) -> Result<Vec<Context>, ApiError> {
        let filter = ListFilter::new().project(project_id);
        let call = self.api().list::<Context>(&filter);
        self.load_items("Failed to fetch project contexts", call, |context| {
            context.project_id == project_id
        })
        .await
    }

    /// Cached contexts carrying `tag`
    pub fn tagged(&self, tag: &str) -> Vec<Context> {
        self.items()
            .into_iter()
            .filter(|context| context.tags.contains(tag))
            .collect()
    }
}
