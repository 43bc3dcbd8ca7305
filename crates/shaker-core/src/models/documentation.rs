use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Markdown documentation attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    pub id: String,
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewDocumentation {
    pub task_id: String,
    pub content: String,
    pub created_by: String,
}
