//! Client-side cache stores, one per entity kind.
//!
//! Every store is a [`CacheStore`] specialised by entity; entity-specific
//! reads live in the sibling modules as inherent impls.

mod agent_store;
mod cache_store;
mod context_store;
mod project_store;
mod standup_store;
mod task_store;

pub use cache_store::{CacheStore, StoreState};

use crate::api::ApiClient;
use crate::models::{Agent, Context, Project, Standup, Task};

pub type ProjectStore = CacheStore<Project>;
pub type AgentStore = CacheStore<Agent>;
pub type TaskStore = CacheStore<Task>;
pub type ContextStore = CacheStore<Context>;
pub type StandupStore = CacheStore<Standup>;

/// One store of each kind, sharing an API client.
#[derive(Clone)]
pub struct Stores {
    pub projects: ProjectStore,
    pub agents: AgentStore,
    pub tasks: TaskStore,
    pub contexts: ContextStore,
    pub standups: StandupStore,
}

impl Stores {
    pub fn new(api: &ApiClient) -> Self {
        Self {
            projects: CacheStore::new(api.clone()),
            agents: CacheStore::new(api.clone()),
            tasks: CacheStore::new(api.clone()),
            contexts: CacheStore::new(api.clone()),
            standups: CacheStore::new(api.clone()),
        }
    }

    pub fn clear_errors(&self) {
        self.projects.clear_error();
        self.agents.clear_error();
        self.tasks.clear_error();
        self.contexts.clear_error();
        self.standups.clear_error();
    }
}
