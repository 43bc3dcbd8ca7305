pub mod api;
pub mod config;
pub mod constants;
pub mod events;
pub mod models;
pub mod realtime;
pub mod runtime;
pub mod store;
pub mod tracing_setup;

pub use api::{ApiClient, ApiError, ListFilter};
pub use config::{ConfigError, CoreConfig};
pub use events::{PushEvent, PushEventKind};
pub use realtime::{ConnectionManager, ListenerId, ProjectSync};
pub use runtime::ShakerRuntime;
pub use store::{CacheStore, StoreState, Stores};
