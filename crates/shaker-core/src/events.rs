//! Push events received over the realtime channel.
//!
//! Wire shape is `{"type": "<kind>", "payload": {...}}`. Payloads are partial
//! copies of the changed entity; consumers treat them as invalidation hints
//! and re-fetch instead of trusting their contents.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::constants::events;

/// Closed set of event kinds the backend broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushEventKind {
    TaskUpdate,
    AgentUpdate,
    ContextAdded,
    ContextUpdated,
    ContextDeleted,
    StandupUpdate,
    /// Missing or unrecognised `type`
    Unknown,
}

impl PushEventKind {
    pub const ALL: [PushEventKind; 7] = [
        PushEventKind::TaskUpdate,
        PushEventKind::AgentUpdate,
        PushEventKind::ContextAdded,
        PushEventKind::ContextUpdated,
        PushEventKind::ContextDeleted,
        PushEventKind::StandupUpdate,
        PushEventKind::Unknown,
    ];

    pub fn from_wire(name: &str) -> Self {
        match name {
            events::TASK_UPDATE => PushEventKind::TaskUpdate,
            events::AGENT_UPDATE => PushEventKind::AgentUpdate,
            events::CONTEXT_ADDED => PushEventKind::ContextAdded,
            events::CONTEXT_UPDATED => PushEventKind::ContextUpdated,
            events::CONTEXT_DELETED => PushEventKind::ContextDeleted,
            events::STANDUP_UPDATE => PushEventKind::StandupUpdate,
            _ => PushEventKind::Unknown,
        }
    }

    /// Wire name; `None` for `Unknown`.
    pub fn wire_name(&self) -> Option<&'static str> {
        match self {
            PushEventKind::TaskUpdate => Some(events::TASK_UPDATE),
            PushEventKind::AgentUpdate => Some(events::AGENT_UPDATE),
            PushEventKind::ContextAdded => Some(events::CONTEXT_ADDED),
            PushEventKind::ContextUpdated => Some(events::CONTEXT_UPDATED),
            PushEventKind::ContextDeleted => Some(events::CONTEXT_DELETED),
            PushEventKind::StandupUpdate => Some(events::STANDUP_UPDATE),
            PushEventKind::Unknown => None,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(
            self,
            PushEventKind::ContextAdded
                | PushEventKind::ContextUpdated
                | PushEventKind::ContextDeleted
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskChange {
    #[serde(alias = "task_id")]
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentChange {
    #[serde(alias = "agent_id")]
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContextChange {
    #[serde(alias = "context_id")]
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StandupChange {
    #[serde(alias = "standup_id")]
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    TaskUpdate(TaskChange),
    AgentUpdate(AgentChange),
    ContextAdded(ContextChange),
    ContextUpdated(ContextChange),
    ContextDeleted(ContextChange),
    StandupUpdate(StandupChange),
    Unknown {
        event_type: Option<String>,
        payload: Value,
    },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
    #[serde(default)]
    payload: Value,
}

/// Decodes a payload, treating `null`/absent as an empty change. A payload
/// of any other unexpected shape also becomes an empty change, so the kind
/// still reaches listeners.
fn payload<T: Default + DeserializeOwned>(kind: &str, value: Value) -> T {
    if value.is_null() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed {} payload: {}", kind, e);
        T::default()
    })
}

impl PushEvent {
    /// Parses one text frame. Errors only when the frame is not a JSON object.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawEvent = serde_json::from_str(text)?;
        let name = raw.event_type.as_deref().unwrap_or_default();
        let kind = raw
            .event_type
            .as_deref()
            .map(PushEventKind::from_wire)
            .unwrap_or(PushEventKind::Unknown);

        Ok(match kind {
            PushEventKind::TaskUpdate => PushEvent::TaskUpdate(payload(name, raw.payload)),
            PushEventKind::AgentUpdate => PushEvent::AgentUpdate(payload(name, raw.payload)),
            PushEventKind::ContextAdded => PushEvent::ContextAdded(payload(name, raw.payload)),
            PushEventKind::ContextUpdated => PushEvent::ContextUpdated(payload(name, raw.payload)),
            PushEventKind::ContextDeleted => PushEvent::ContextDeleted(payload(name, raw.payload)),
            PushEventKind::StandupUpdate => PushEvent::StandupUpdate(payload(name, raw.payload)),
            PushEventKind::Unknown => PushEvent::Unknown {
                event_type: raw.event_type,
                payload: raw.payload,
            },
        })
    }

    pub fn kind(&self) -> PushEventKind {
        match self {
            PushEvent::TaskUpdate(_) => PushEventKind::TaskUpdate,
            PushEvent::AgentUpdate(_) => PushEventKind::AgentUpdate,
            PushEvent::ContextAdded(_) => PushEventKind::ContextAdded,
            PushEvent::ContextUpdated(_) => PushEventKind::ContextUpdated,
            PushEvent::ContextDeleted(_) => PushEventKind::ContextDeleted,
            PushEvent::StandupUpdate(_) => PushEventKind::StandupUpdate,
            PushEvent::Unknown { .. } => PushEventKind::Unknown,
        }
    }

    /// Project named by the payload, if any.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            PushEvent::TaskUpdate(change) => change.project_id.as_deref(),
            PushEvent::AgentUpdate(change) => change.project_id.as_deref(),
            PushEvent::ContextAdded(change)
            | PushEvent::ContextUpdated(change)
            | PushEvent::ContextDeleted(change) => change.project_id.as_deref(),
            PushEvent::StandupUpdate(change) => change.project_id.as_deref(),
            PushEvent::Unknown { payload, .. } => {
                payload.get("project_id").and_then(Value::as_str)
            }
        }
    }

    /// True unless the payload names a project other than `project_id`.
    pub fn concerns_project(&self, project_id: &str) -> bool {
        self.project_id()
            .filter(|id| !id.is_empty())
            .map_or(true, |id| id == project_id)
    }
}
