use agent_events::{CancelSignal, ExecuteRequest, StreamSignal, StreamTransport, TransportError};

use crate::client::AgentSseClient;
use crate::config::AgentApiConfig;
use crate::error::AgentApiError;

/// Blocking [`StreamTransport`] adapter over the async SSE client.
///
/// Each `open` call drives the stream to completion on a current-thread
/// runtime; callers interrupt through the shared cancel signal.
#[derive(Debug)]
pub struct SseStreamTransport {
    client: AgentSseClient,
}

impl SseStreamTransport {
    pub fn new(config: AgentApiConfig) -> Result<Self, AgentApiError> {
        Ok(Self {
            client: AgentSseClient::new(config)?,
        })
    }

    pub fn client(&self) -> &AgentSseClient {
        &self.client
    }
}

impl StreamTransport for SseStreamTransport {
    fn open(
        &self,
        request: &ExecuteRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(StreamSignal),
    ) -> Result<(), TransportError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                TransportError::Failed(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime
            .block_on(
                self.client
                    .stream_with_handler(request, Some(&cancel), |signal| emit(signal)),
            )
            .map_err(|error| match error {
                AgentApiError::Cancelled => TransportError::Cancelled,
                other => TransportError::Failed(other.to_string()),
            })
    }
}
