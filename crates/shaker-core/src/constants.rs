//! Application-wide constants
//!
//! Centralized location for paths, defaults and wire names that are
//! shared by the REST client, the push channel and the CLI.

/// Default Agent Shaker server
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Environment variable overriding the server URL
pub const SERVER_URL_ENV: &str = "AGENT_SHAKER_URL";

/// Delay before a dropped push channel is reopened
pub const RECONNECT_DELAY_MS: u64 = 3000;

pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// Server paths
pub const API_PATH: &str = "/api";
pub const WS_PATH: &str = "/ws";
pub const HEALTH_PATH: &str = "/health";

/// Default page size for agent heartbeat history
pub const DEFAULT_HEARTBEAT_LIMIT: u32 = 50;

// Task defaults
pub const DEFAULT_TASK_STATUS: &str = "pending";

/// Push event type tags sent by the server on `/ws`
pub mod events {
    pub const TASK_UPDATE: &str = "task_update";
    pub const AGENT_UPDATE: &str = "agent_update";
    pub const CONTEXT_ADDED: &str = "context_added";
    pub const CONTEXT_UPDATED: &str = "context_updated";
    pub const CONTEXT_DELETED: &str = "context_deleted";
    pub const STANDUP_UPDATE: &str = "standup_update";
}
