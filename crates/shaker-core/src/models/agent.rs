use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, StatusEntity};

/// An agent registered to one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    /// e.g. "backend", "frontend"
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

impl Entity for Agent {
    const RESOURCE: &'static str = "agents";
    const NOUN: &'static str = "agent";

    fn id(&self) -> &str {
        &self.id
    }
}

impl StatusEntity for Agent {
    fn apply_status(&mut self, status: &str, echo: &Self) {
        self.status = status.to_string();
        if echo.last_seen.is_some() {
            self.last_seen = echo.last_seen;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewAgent {
    pub project_id: String,
    pub name: String,
    pub role: String,
    pub team: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        serde_json::from_value(serde_json::json!({
            "id": "a1",
            "project_id": "p1",
            "name": "Builder",
            "role": "backend",
            "team": "Core",
            "status": "active",
            "last_seen": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_apply_status_keeps_identity_fields() {
        let mut cached = agent();
        let mut echo = agent();
        echo.name = "Renamed on server".to_string();
        echo.last_seen = Some("2024-02-01T12:00:00Z".parse().unwrap());

        cached.apply_status("idle", &echo);

        assert_eq!(cached.status, "idle");
        assert_eq!(cached.name, "Builder");
        assert_eq!(cached.last_seen, echo.last_seen);
        assert!(!cached.is_active());
    }

    #[test]
    fn test_apply_status_without_echoed_timestamp() {
        let mut cached = agent();
        let before = cached.last_seen;
        let mut echo = agent();
        echo.last_seen = None;

        cached.apply_status("offline", &echo);

        assert_eq!(cached.last_seen, before);
    }
}
