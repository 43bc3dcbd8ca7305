use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, StatusEntity};
use crate::constants::DEFAULT_TASK_STATUS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown priority '{0}' (expected low, medium or high)")]
pub struct ParsePriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

// Lenient on the wire: anything unrecognised decodes as the default.
impl From<String> for TaskPriority {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<TaskPriority> for String {
    fn from(value: TaskPriority) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Task {
    const RESOURCE: &'static str = "tasks";
    const NOUN: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }
}

impl StatusEntity for Task {
    fn apply_status(&mut self, status: &str, echo: &Self) {
        self.status = status.to_string();
        if echo.updated_at.is_some() {
            self.updated_at = echo.updated_at;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl NewTask {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::default(),
            status: DEFAULT_TASK_STATUS.to_string(),
            created_by: None,
            assigned_to: None,
        }
    }
}
