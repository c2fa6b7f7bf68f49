use std::future::Future;
use std::sync::atomic::Ordering;
use std::time::Duration;

use agent_events::{CancelSignal, EventType, ExecuteRequest, StreamSignal};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::AgentApiConfig;
use crate::error::{parse_error_message, AgentApiError};
use crate::headers::build_headers;
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::sse::SseStreamParser;
use crate::url::normalize_stream_url;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Async client opening one server-push stream per call.
#[derive(Debug)]
pub struct AgentSseClient {
    http: Client,
    config: AgentApiConfig,
}

impl AgentSseClient {
    pub fn new(config: AgentApiConfig) -> Result<Self, AgentApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AgentApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AgentApiConfig {
        &self.config
    }

    pub fn stream_endpoint(&self) -> String {
        normalize_stream_url(&self.config.base_url, self.config.agent)
    }

    pub fn header_map(&self) -> Result<HeaderMap, AgentApiError> {
        let headers = build_headers(&self.config);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| AgentApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| AgentApiError::InvalidHeader(format!("invalid value for {key}")))?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ExecuteRequest,
    ) -> Result<reqwest::RequestBuilder, AgentApiError> {
        let headers = self.header_map()?;
        let payload = self.request_with_transport_defaults(request);
        Ok(self
            .http
            .post(self.stream_endpoint())
            .headers(headers)
            .json(&payload))
    }

    /// Fill payload identity fields the caller left empty from config.
    pub fn request_with_transport_defaults(&self, request: &ExecuteRequest) -> ExecuteRequest {
        let mut payload = request.clone();
        if payload.user_id.trim().is_empty() {
            payload.user_id = self.config.user_id.clone();
        }
        if payload.agent_type.trim().is_empty() {
            payload.agent_type = self.config.agent.as_str().to_owned();
        }
        payload
    }

    /// Open the stream with bounded retry on the initial POST.
    pub async fn send_with_retry(
        &self,
        request: &ExecuteRequest,
        cancellation: Option<&CancelSignal>,
    ) -> Result<Response, AgentApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }

            let response = self.build_request(request)?.send();
            let response = await_or_cancel(response, cancellation)
                .await?
                .map_err(AgentApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_else(|_| {
                            status
                                .canonical_reason()
                                .unwrap_or("request failed")
                                .to_string()
                        });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &body) {
                        warn!(%status, attempt, "stream open failed, retrying");
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(AgentApiError::Status(status, message));
                }
                Err(error) => {
                    let message = error.to_string();
                    last_error = Some(message.clone());
                    if attempt < MAX_RETRIES && is_retryable_http_error(0, &message) {
                        warn!(attempt, "stream open request errored, retrying");
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                    return Err(error);
                }
            }
        }

        Err(AgentApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    /// Stream envelopes to the handler until completion, close, or failure.
    ///
    /// Emits [`StreamSignal::Opened`] once after the server acknowledges the
    /// request, then one [`StreamSignal::Envelope`] per decoded frame in
    /// delivery order. A COMPLETED envelope terminates the stream; the
    /// connection is dropped after delivering it.
    pub async fn stream_with_handler<F>(
        &self,
        request: &ExecuteRequest,
        cancellation: Option<&CancelSignal>,
        mut on_signal: F,
    ) -> Result<(), AgentApiError>
    where
        F: FnMut(StreamSignal),
    {
        let response = self.send_with_retry(request, cancellation).await?;
        debug!(endpoint = %self.stream_endpoint(), "stream opened");
        on_signal(StreamSignal::Opened);

        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            let chunk = chunk.map_err(AgentApiError::from)?;
            for envelope in parser.feed(&chunk) {
                let completed = envelope.event_type == EventType::Completed;
                on_signal(StreamSignal::Envelope(envelope));
                if completed {
                    debug!("stream completed by server");
                    return Ok(());
                }
            }
        }

        if is_cancelled(cancellation) {
            return Err(AgentApiError::Cancelled);
        }

        debug!("stream closed by server without completion frame");
        Ok(())
    }
}

fn is_cancelled(cancel: Option<&CancelSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancelSignal>,
) -> Result<F::Output, AgentApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(AgentApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
