//! Deterministic mock implementation of the shared `agent_events` transport
//! contract.
//!
//! This crate contains no protocol logic and is intended for contract-level
//! integration testing of aggregation and session behavior. Playback is
//! delay-free so tests stay deterministic and fast.

use std::sync::atomic::Ordering;
use std::sync::{Mutex, MutexGuard};

use agent_events::{
    CancelSignal, EventEnvelope, ExecuteRequest, StreamSignal, StreamTransport, TransportError,
};

/// Scripted playback outcome after the final envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScriptedOutcome {
    /// Natural close (or close after a COMPLETED envelope).
    Close,
    /// Transport-level failure surfaced after playback stops.
    Fail(String),
}

/// Scripted transport replaying a fixed envelope sequence per `open` call.
///
/// Cancellation is checked between envelopes; a set cancel signal stops
/// playback and returns [`TransportError::Cancelled`], matching the real
/// transport's cooperative semantics. Failure injection stops playback after
/// `fail_after` envelopes and returns [`TransportError::Failed`].
pub struct MockTransport {
    envelopes: Vec<EventEnvelope>,
    outcome: ScriptedOutcome,
    fail_after: usize,
    requests: Mutex<Vec<ExecuteRequest>>,
}

impl MockTransport {
    /// Creates a transport replaying `envelopes` and then closing cleanly.
    #[must_use]
    pub fn new(envelopes: Vec<EventEnvelope>) -> Self {
        let fail_after = envelopes.len();
        Self {
            envelopes,
            outcome: ScriptedOutcome::Close,
            fail_after,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Injects a transport failure after `delivered` envelopes.
    #[must_use]
    pub fn failing_after(mut self, delivered: usize, message: impl Into<String>) -> Self {
        self.fail_after = delivered.min(self.envelopes.len());
        self.outcome = ScriptedOutcome::Fail(message.into());
        self
    }

    /// Returns every request observed by this transport, in call order.
    pub fn observed_requests(&self) -> Vec<ExecuteRequest> {
        lock_unpoisoned(&self.requests).clone()
    }
}

impl StreamTransport for MockTransport {
    fn open(
        &self,
        request: &ExecuteRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(StreamSignal),
    ) -> Result<(), TransportError> {
        lock_unpoisoned(&self.requests).push(request.clone());

        if cancel.load(Ordering::Acquire) {
            return Err(TransportError::Cancelled);
        }

        emit(StreamSignal::Opened);

        for (delivered, envelope) in self.envelopes.iter().enumerate() {
            if cancel.load(Ordering::Acquire) {
                return Err(TransportError::Cancelled);
            }
            if delivered == self.fail_after {
                break;
            }

            let completed = envelope.event_type == agent_events::EventType::Completed;
            emit(StreamSignal::Envelope(envelope.clone()));
            if completed {
                return Ok(());
            }
        }

        match &self.outcome {
            ScriptedOutcome::Close => Ok(()),
            ScriptedOutcome::Fail(message) => Err(TransportError::Failed(message.clone())),
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
