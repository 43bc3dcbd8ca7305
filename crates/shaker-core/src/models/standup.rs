use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;

/// Daily standup entry posted by an agent. The text fields are opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standup {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub standup_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub did: String,
    #[serde(default)]
    pub doing: String,
    #[serde(default)]
    pub done: String,
    #[serde(default)]
    pub blockers: String,
    #[serde(default)]
    pub challenges: String,
    #[serde(default)]
    pub references: String,
    // Present when listed with agent details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_team: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Standup {
    const RESOURCE: &'static str = "standups";
    const NOUN: &'static str = "standup";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewStandup {
    pub agent_id: String,
    pub project_id: String,
    /// YYYY-MM-DD
    pub standup_date: String,
    pub did: String,
    pub doing: String,
    pub done: String,
    pub blockers: String,
    pub challenges: String,
    pub references: String,
}
