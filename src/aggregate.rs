use std::collections::HashMap;

use agent_events::{current_epoch_ms, EventEnvelope, EventType};

use crate::classify::{classify, HandlerCategory};
use crate::message::{
    display_kind_for, ConnectionStatus, DisplayKind, DisplayMessage, ProgressInfo, TaskStatus,
};
use crate::notify::{Notification, NotificationSink, NullSink, Severity};

/// Shared accumulation bucket for envelopes that carry no `nodeId`.
pub const ANONYMOUS_NODE_ID: &str = "anonymous";

/// Synthetic node id used for transport-failure messages. Never bound in the
/// node index, so a server event can't accidentally extend it.
const TRANSPORT_ERROR_NODE_ID: &str = "error";

/// Outcome of folding one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The message list changed (entry created, extended, or upgraded).
    ListMutated,
    /// Only the progress slot changed.
    ProgressUpdated,
    /// The notification sink was invoked; list untouched.
    Notified,
    /// COMPLETED observed: stream must close, statuses updated.
    StreamCompleted,
}

/// The event-to-message-list reducer for one session.
///
/// Owns the message list, the node index, the progress slot, and both status
/// fields exclusively; no other component mutates them. Envelopes are folded
/// in arrival order and the aggregator assumes in-order delivery per stream —
/// a reordering transport degrades concatenation to best effort.
pub struct Aggregator {
    session_id: String,
    messages: Vec<DisplayMessage>,
    node_index: HashMap<String, usize>,
    progress: Option<ProgressInfo>,
    connection_status: ConnectionStatus,
    task_status: TaskStatus,
    current_task_title: String,
    sink: Box<dyn NotificationSink>,
    user_message_seq: u64,
}

impl Aggregator {
    /// Creates an aggregator that discards notifications.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self::with_sink(session_id, Box::new(NullSink))
    }

    #[must_use]
    pub fn with_sink(session_id: impl Into<String>, sink: Box<dyn NotificationSink>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            node_index: HashMap::new(),
            progress: None,
            connection_status: ConnectionStatus::default(),
            task_status: TaskStatus::default(),
            current_task_title: String::new(),
            sink,
            user_message_seq: 0,
        }
    }

    /// Replaces the notification sink.
    pub fn set_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sink = sink;
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn progress(&self) -> Option<&ProgressInfo> {
        self.progress.as_ref()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    pub fn task_status(&self) -> TaskStatus {
        self.task_status
    }

    pub fn current_task_title(&self) -> &str {
        &self.current_task_title
    }

    /// Position of a node's primary message, if bound.
    pub fn node_position(&self, node_id: &str) -> Option<usize> {
        self.node_index.get(node_id).copied()
    }

    /// Fold one envelope into session state.
    pub fn apply(&mut self, envelope: EventEnvelope) -> Applied {
        let received_at = current_epoch_ms();

        match classify(&envelope.event_type) {
            HandlerCategory::Progress => {
                self.progress = Some(ProgressInfo {
                    message: envelope.text().to_string(),
                    timestamp: envelope.timestamp_or(received_at),
                    agent_id: envelope.sender().to_string(),
                });
                Applied::ProgressUpdated
            }
            HandlerCategory::Notify => {
                let severity = match envelope.event_type {
                    EventType::Done => Severity::Info,
                    EventType::DoneWithWarning => Severity::Warning,
                    _ => Severity::Error,
                };
                if envelope.event_type == EventType::DoneWithWarning {
                    self.progress = None;
                }
                self.sink.notify(Notification {
                    text: envelope.text().to_string(),
                    timestamp: envelope.timestamp_or(received_at),
                    title: self.current_task_title.clone(),
                    node_id: envelope.node_id.clone(),
                    severity,
                });
                Applied::Notified
            }
            HandlerCategory::Terminate => {
                self.connection_status = ConnectionStatus::Disconnected;
                self.task_status = TaskStatus::Completed;
                self.progress = None;
                Applied::StreamCompleted
            }
            HandlerCategory::Accumulate => {
                self.accumulate(envelope, received_at);
                Applied::ListMutated
            }
        }
    }

    /// Find-or-create accumulation by node id.
    fn accumulate(&mut self, envelope: EventEnvelope, received_at: i64) {
        let node_id = envelope
            .node_id
            .clone()
            .unwrap_or_else(|| ANONYMOUS_NODE_ID.to_string());
        let timestamp = envelope.timestamp_or(received_at);

        match self.node_index.get(&node_id).copied() {
            Some(position) => match envelope.event_type {
                EventType::Tool => {
                    // Tool invocations are siblings under the same node, never
                    // merged into the parent text. The index keeps pointing at
                    // the original message.
                    let sibling = tool_message(node_id, timestamp, envelope);
                    self.messages.push(sibling);
                }
                EventType::ToolApproval => {
                    let message = &mut self.messages[position];
                    message.kind = DisplayKind::ToolApproval;
                    message.event_type = envelope.event_type.clone();
                    message.sender = envelope.sender().to_string();
                    message.approval = envelope.data.clone();
                    message.timestamp = timestamp;
                    message.meta = envelope.meta.clone();
                    message.events.push(envelope);
                }
                _ => {
                    // Fragments concatenate with no separator; an empty
                    // fragment still refreshes timestamp/meta and lands in
                    // the audit trail.
                    let message = &mut self.messages[position];
                    message.message.push_str(envelope.text());
                    message.kind = display_kind_for(&envelope.event_type);
                    message.event_type = envelope.event_type.clone();
                    message.timestamp = timestamp;
                    message.meta = envelope.meta.clone();
                    message.events.push(envelope);
                }
            },
            None => {
                let message = if envelope.event_type == EventType::Tool {
                    tool_message(node_id.clone(), timestamp, envelope)
                } else {
                    let approval = if envelope.event_type == EventType::ToolApproval {
                        envelope.data.clone()
                    } else {
                        None
                    };
                    DisplayMessage {
                        node_id: node_id.clone(),
                        session_id: envelope.session_id.clone(),
                        kind: display_kind_for(&envelope.event_type),
                        event_type: envelope.event_type.clone(),
                        sender: envelope.sender().to_string(),
                        message: envelope.text().to_string(),
                        timestamp,
                        approval,
                        meta: envelope.meta.clone(),
                        events: vec![envelope],
                    }
                };
                self.messages.push(message);
                self.node_index.insert(node_id, self.messages.len() - 1);
            }
        }
    }

    /// Records the start of a new task: title captured, progress cleared.
    pub fn begin_task(&mut self, title: impl Into<String>) {
        self.current_task_title = title.into();
        self.progress = None;
    }

    /// Connection acknowledged: stream is live.
    pub fn mark_connected(&mut self) {
        self.connection_status = ConnectionStatus::Connected;
        self.task_status = TaskStatus::Running;
    }

    /// Caller-initiated interrupt: connection closed, task status untouched.
    pub fn mark_interrupted(&mut self) {
        self.connection_status = ConnectionStatus::Disconnected;
    }

    /// Transport close without an error. Idempotent with COMPLETED handling.
    pub fn finish_stream(&mut self) {
        self.connection_status = ConnectionStatus::Disconnected;
        self.task_status = TaskStatus::Completed;
        self.progress = None;
    }

    /// Transport failure: statuses to error plus one synthesized error entry.
    ///
    /// This is the single documented case where stream plumbing, not an
    /// envelope, writes to the message list — a broken connection can no
    /// longer deliver a server-side error frame.
    pub fn record_transport_failure(&mut self, detail: &str) {
        self.connection_status = ConnectionStatus::Error;
        self.task_status = TaskStatus::Error;
        self.messages.push(DisplayMessage {
            node_id: TRANSPORT_ERROR_NODE_ID.to_string(),
            session_id: Some(self.session_id.clone()),
            kind: DisplayKind::Error,
            event_type: EventType::Error,
            sender: "System".to_string(),
            message: format!("Connection failed: {detail}"),
            timestamp: current_epoch_ms(),
            events: Vec::new(),
            approval: None,
            meta: None,
        });
    }

    /// Appends the user's own input as a display entry.
    ///
    /// User entries get synthetic node ids and are not bound in the node
    /// index; stream events can never extend them.
    pub fn push_user_message(&mut self, text: impl Into<String>) {
        self.user_message_seq += 1;
        self.messages.push(DisplayMessage {
            node_id: format!("user-{}", self.user_message_seq),
            session_id: Some(self.session_id.clone()),
            kind: DisplayKind::User,
            event_type: EventType::Other("USER_INPUT".to_string()),
            sender: "You".to_string(),
            message: text.into(),
            timestamp: current_epoch_ms(),
            events: Vec::new(),
            approval: None,
            meta: None,
        });
    }

    /// Resets all session-scoped state. The node index rebinds from scratch
    /// for the next stream.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.node_index.clear();
        self.progress = None;
        self.connection_status = ConnectionStatus::default();
        self.task_status = TaskStatus::default();
        self.current_task_title.clear();
    }

    /// Replaces the message list from a persistence handoff and rebuilds the
    /// node index (first occurrence of each node id wins, which restores the
    /// primary-message binding ahead of tool siblings).
    pub fn restore(&mut self, messages: Vec<DisplayMessage>) {
        self.clear();
        self.messages = messages;
        for (position, message) in self.messages.iter().enumerate() {
            self.node_index
                .entry(message.node_id.clone())
                .or_insert(position);
        }
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("session_id", &self.session_id)
            .field("messages", &self.messages.len())
            .field("connection_status", &self.connection_status)
            .field("task_status", &self.task_status)
            .finish_non_exhaustive()
    }
}

fn tool_message(node_id: String, timestamp: i64, envelope: EventEnvelope) -> DisplayMessage {
    DisplayMessage {
        node_id,
        session_id: envelope.session_id.clone(),
        kind: DisplayKind::Tool,
        event_type: envelope.event_type.clone(),
        sender: envelope.sender().to_string(),
        message: envelope.text().to_string(),
        timestamp,
        approval: None,
        meta: envelope.meta.clone(),
        events: vec![envelope],
    }
}

#[cfg(test)]
mod tests {
    use agent_events::{EventEnvelope, EventType};

    use super::{Aggregator, Applied, ANONYMOUS_NODE_ID};
    use crate::message::DisplayKind;

    fn envelope(event_type: EventType, node_id: &str, message: &str) -> EventEnvelope {
        let mut env = EventEnvelope::new(event_type);
        env.node_id = Some(node_id.to_string());
        env.message = Some(message.to_string());
        env
    }

    #[test]
    fn anonymous_envelopes_share_one_bucket() {
        let mut aggregator = Aggregator::new("s1");

        let mut first = EventEnvelope::new(EventType::Thinking);
        first.message = Some("a".to_string());
        let mut second = EventEnvelope::new(EventType::Thinking);
        second.message = Some("b".to_string());

        aggregator.apply(first);
        aggregator.apply(second);

        assert_eq!(aggregator.messages().len(), 1);
        assert_eq!(aggregator.messages()[0].node_id, ANONYMOUS_NODE_ID);
        assert_eq!(aggregator.messages()[0].message, "ab");
    }

    #[test]
    fn empty_fragment_still_updates_timestamp_and_audit_trail() {
        let mut aggregator = Aggregator::new("s1");
        aggregator.apply(envelope(EventType::Thinking, "n1", "text"));

        let mut empty = envelope(EventType::Acting, "n1", "");
        empty.start_time = Some(777);
        let applied = aggregator.apply(empty);

        assert_eq!(applied, Applied::ListMutated);
        let message = &aggregator.messages()[0];
        assert_eq!(message.message, "text");
        assert_eq!(message.timestamp, 777);
        assert_eq!(message.events.len(), 2);
        assert_eq!(message.event_type, EventType::Acting);
    }

    #[test]
    fn transport_failure_entry_is_not_bound_in_node_index() {
        let mut aggregator = Aggregator::new("s1");
        aggregator.record_transport_failure("connection refused");

        assert_eq!(aggregator.messages().len(), 1);
        assert_eq!(aggregator.messages()[0].kind, DisplayKind::Error);
        assert!(aggregator.node_position("error").is_none());
    }

    #[test]
    fn user_messages_are_never_extended_by_stream_events() {
        let mut aggregator = Aggregator::new("s1");
        aggregator.push_user_message("do the thing");
        aggregator.apply(envelope(EventType::Thinking, "user-1", "hijack"));

        assert_eq!(aggregator.messages().len(), 2);
        assert_eq!(aggregator.messages()[0].message, "do the thing");
        assert_eq!(aggregator.messages()[1].message, "hijack");
    }
}
