use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub heartbeat_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewHeartbeat {
    pub agent_id: String,
    pub status: String,
    pub metadata: serde_json::Value,
}

impl NewHeartbeat {
    pub fn new(agent_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            status: status.into(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }
}
