//! Event aggregation engine for streaming agent chat.
//!
//! Invariant: single entry point for stream state — every envelope mutates
//! session state only through [`Aggregator::apply`].
//!
//! # Public API Overview
//! - Fold a live event stream into display state with [`Aggregator`].
//! - Drive a full conversation, interruption included, via [`ChatSession`]
//!   over any [`agent_events::StreamTransport`].
//! - Route terminal/warning/error events to a [`NotificationSink`].
//! - Intercept local input with [`parse_slash_command`].

pub mod aggregate;
pub mod classify;
pub mod commands;
pub mod message;
pub mod notify;
pub mod session;

/// Core reducer and its per-envelope outcome.
pub use crate::aggregate::{Aggregator, Applied, ANONYMOUS_NODE_ID};

/// Event-type handling categories.
pub use crate::classify::{classify, HandlerCategory};

/// Local slash command interception.
pub use crate::commands::{parse_slash_command, SlashCommand};

/// Display-side data model.
pub use crate::message::{
    display_kind_for, ConnectionStatus, DisplayKind, DisplayMessage, ProgressInfo, TaskStatus,
};

/// Notification side channel.
pub use crate::notify::{Notification, NotificationSink, NullSink, RecordingSink, Severity};

/// Session orchestration over a stream transport.
pub use crate::session::{ChatError, ChatSession, ExecuteOutcome};
