pub mod agent;
pub mod context;
pub mod documentation;
pub mod heartbeat;
pub mod project;
pub mod standup;
pub mod task;

pub use agent::{Agent, NewAgent};
pub use context::{Context, NewContext};
pub use documentation::{Documentation, NewDocumentation};
pub use heartbeat::{Heartbeat, NewHeartbeat};
pub use project::{NewProject, Project};
pub use standup::{NewStandup, Standup};
pub use task::{NewTask, Task, TaskPriority};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// A server-owned record cached by a store.
pub trait Entity: Clone + Send + Sync + DeserializeOwned + 'static {
    /// Collection name under `/api`, also used as the plural noun in messages
    const RESOURCE: &'static str;
    /// Singular noun used in messages ("task")
    const NOUN: &'static str;

    fn id(&self) -> &str;
}

/// Entities with a status-only partial update endpoint (`PUT /<resource>/{id}/status`).
pub trait StatusEntity: Entity {
    /// Apply a status change in place, taking only the server-maintained
    /// timestamp from `echo`. Every other field is left as cached.
    fn apply_status(&mut self, status: &str, echo: &Self);
}

/// Decodes JSON `null` as the type's default (the server emits `null` for empty arrays).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
