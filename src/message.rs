use agent_events::{EventEnvelope, EventType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display category a message renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    System,
    User,
    Assistant,
    Tool,
    ToolApproval,
    Error,
}

impl DisplayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::ToolApproval => "tool_approval",
            Self::Error => "error",
        }
    }
}

/// Static event-type to display-kind table.
///
/// Unrecognized event types render as system messages, the same default the
/// accumulation path applies to them.
pub fn display_kind_for(event_type: &EventType) -> DisplayKind {
    match event_type {
        EventType::Started
        | EventType::Progress
        | EventType::Done
        | EventType::DoneWithWarning
        | EventType::Completed => DisplayKind::System,
        EventType::Thinking
        | EventType::Action
        | EventType::Acting
        | EventType::Observing
        | EventType::Collaborating
        | EventType::Executing
        | EventType::PartialResult
        | EventType::TaskAnalysis
        | EventType::Thought
        | EventType::InitPlan
        | EventType::UpdatePlan
        | EventType::AdvancePlan => DisplayKind::Assistant,
        EventType::Tool => DisplayKind::Tool,
        EventType::ToolApproval | EventType::Interaction => DisplayKind::ToolApproval,
        EventType::Error => DisplayKind::Error,
        EventType::Other(_) => DisplayKind::System,
    }
}

/// One display-ready accumulation unit in the message list.
///
/// A node's primary message is mutated in place as fragments arrive; tool
/// invocations become sibling entries sharing the same `node_id`. `events`
/// retains every folded envelope in arrival order for audit/replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub node_id: String,
    pub session_id: Option<String>,
    pub kind: DisplayKind,
    pub event_type: EventType,
    pub sender: String,
    pub message: String,
    pub timestamp: i64,
    #[serde(default)]
    pub events: Vec<EventEnvelope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Single overwrite-only progress slot; never part of the message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub message: String,
    pub timestamp: i64,
    pub agent_id: String,
}

/// Connection state of the current stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

/// Task state of the current stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}
