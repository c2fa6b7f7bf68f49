//! Shared wire and transport contract for agent event streams.
//!
//! This crate intentionally defines only the event envelope schema, the
//! execute-request payload, and the stream transport seam. It excludes
//! transport protocol details, aggregation state, and UI concerns.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shared cancellation flag for one in-flight stream.
pub type CancelSignal = Arc<AtomicBool>;

/// Sender label used when an envelope carries no `agentId`.
pub const DEFAULT_SENDER: &str = "Agent";

/// Current wall-clock time in epoch milliseconds.
pub fn current_epoch_ms() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Closed event tag set with passthrough for unrecognized wire values.
///
/// Unknown tags round-trip through [`EventType::Other`] so a newer server
/// never breaks an older client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Started,
    Thinking,
    Action,
    Acting,
    Observing,
    Collaborating,
    Executing,
    Tool,
    ToolApproval,
    Interaction,
    PartialResult,
    Progress,
    Done,
    DoneWithWarning,
    Error,
    Completed,
    // Planning subfamily emitted by plan-tracking agents.
    TaskAnalysis,
    Thought,
    InitPlan,
    UpdatePlan,
    AdvancePlan,
    Other(String),
}

impl EventType {
    pub fn parse(value: &str) -> Self {
        match value {
            "STARTED" => Self::Started,
            "THINKING" => Self::Thinking,
            "ACTION" => Self::Action,
            "ACTING" => Self::Acting,
            "OBSERVING" => Self::Observing,
            "COLLABORATING" => Self::Collaborating,
            "EXECUTING" => Self::Executing,
            "TOOL" => Self::Tool,
            "TOOL_APPROVAL" => Self::ToolApproval,
            "INTERACTION" => Self::Interaction,
            "PARTIAL_RESULT" => Self::PartialResult,
            "PROGRESS" => Self::Progress,
            "DONE" => Self::Done,
            "DONEWITHWARNING" => Self::DoneWithWarning,
            "ERROR" => Self::Error,
            "COMPLETED" => Self::Completed,
            "TASK_ANALYSIS" => Self::TaskAnalysis,
            "THOUGHT" => Self::Thought,
            "INIT_PLAN" => Self::InitPlan,
            "UPDATE_PLAN" => Self::UpdatePlan,
            "ADVANCE_PLAN" => Self::AdvancePlan,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Started => "STARTED",
            Self::Thinking => "THINKING",
            Self::Action => "ACTION",
            Self::Acting => "ACTING",
            Self::Observing => "OBSERVING",
            Self::Collaborating => "COLLABORATING",
            Self::Executing => "EXECUTING",
            Self::Tool => "TOOL",
            Self::ToolApproval => "TOOL_APPROVAL",
            Self::Interaction => "INTERACTION",
            Self::PartialResult => "PARTIAL_RESULT",
            Self::Progress => "PROGRESS",
            Self::Done => "DONE",
            Self::DoneWithWarning => "DONEWITHWARNING",
            Self::Error => "ERROR",
            Self::Completed => "COMPLETED",
            Self::TaskAnalysis => "TASK_ANALYSIS",
            Self::Thought => "THOUGHT",
            Self::InitPlan => "INIT_PLAN",
            Self::UpdatePlan => "UPDATE_PLAN",
            Self::AdvancePlan => "ADVANCE_PLAN",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded frame from the server-push stream.
///
/// `type` is mandatory; frames whose payload decodes without a usable type
/// are dropped at the transport boundary and never reach the aggregator.
/// `data` and `meta` are opaque passthrough for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
}

impl EventEnvelope {
    /// Creates a minimal envelope for the given type.
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            session_id: None,
            node_id: None,
            event_type,
            agent_id: None,
            message: None,
            data: None,
            meta: None,
            start_time: None,
        }
    }

    /// Returns the sender identity, falling back to [`DEFAULT_SENDER`].
    #[must_use]
    pub fn sender(&self) -> &str {
        self.agent_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_SENDER)
    }

    /// Returns the text fragment carried by this envelope, possibly empty.
    #[must_use]
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    /// Returns the event timestamp, defaulting to the given receipt time.
    #[must_use]
    pub fn timestamp_or(&self, receipt_ms: i64) -> i64 {
        self.start_time.unwrap_or(receipt_ms)
    }
}

/// Request body posted when opening one agent stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub message: String,
    pub user_id: String,
    pub session_id: String,
    pub agent_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_command: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ExecuteRequest {
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        agent_type: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            agent_type: agent_type.into(),
            is_command: false,
        }
    }

    #[must_use]
    pub fn as_command(mut self) -> Self {
        self.is_command = true;
        self
    }
}

/// Transport-emitted signal for one open stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    /// Connection acknowledged; frames may follow.
    Opened,
    /// One decoded frame, in delivery order.
    Envelope(EventEnvelope),
}

/// Terminal failure of one stream at the transport seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The caller's cancel signal was observed.
    Cancelled,
    /// Connection, HTTP, or mid-stream transport failure.
    Failed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "stream was cancelled"),
            Self::Failed(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Transport seam for one unidirectional server-push stream.
///
/// Contract:
/// - `Opened` is emitted exactly once, before any envelope, when the
///   connection is acknowledged.
/// - Envelopes are emitted in delivery order. The aggregator assumes this
///   order; a reordering transport degrades accumulation to best effort.
/// - A delivered COMPLETED envelope terminates the stream: the transport
///   closes the connection and returns `Ok(())`.
/// - Cancellation returns [`TransportError::Cancelled`]; closing the
///   underlying connection must be idempotent since caller cancellation and
///   server completion may race.
pub trait StreamTransport: Send + Sync + 'static {
    fn open(
        &self,
        request: &ExecuteRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(StreamSignal),
    ) -> Result<(), TransportError>;
}
