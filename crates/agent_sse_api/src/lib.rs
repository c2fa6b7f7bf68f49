//! Transport-only client primitives for agent event streams.
//!
//! This crate owns opening a unidirectional server-push stream over HTTP POST
//! (`Accept: text/event-stream`), decoding each SSE frame into an
//! `agent_events::EventEnvelope`, and the connection lifecycle around it:
//! bounded retry on the opening request, cooperative cancellation, and
//! termination on the COMPLETED frame. It contains no aggregation state and
//! no UI coupling.
//!
//! Frame decode failures are logged and skipped; they are never fatal to the
//! stream. Transport-level failures (connect refused, non-2xx, broken read)
//! fail the stream as a whole.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod retry;
pub mod sse;
pub mod transport;
pub mod url;

pub use client::AgentSseClient;
pub use config::AgentApiConfig;
pub use error::AgentApiError;
pub use sse::SseStreamParser;
pub use transport::SseStreamTransport;
pub use url::{normalize_stream_url, AgentKind};
