use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use agent_events::{
    CancelSignal, ExecuteRequest, StreamSignal, StreamTransport, TransportError,
};
use agent_sse_api::{AgentApiConfig, AgentApiError, SseStreamTransport};
use tracing::{debug, warn};

use crate::aggregate::{Aggregator, Applied};
use crate::message::{ConnectionStatus, DisplayMessage, ProgressInfo, TaskStatus};
use crate::notify::NotificationSink;

/// How one execute call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// The stream completed (COMPLETED frame or clean server close).
    Completed,
    /// The caller interrupted the stream.
    Interrupted,
    /// The stream failed mid-flight; an error entry was synthesized.
    Errored,
}

/// Session-level failure of an execute call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// One in-flight stream per session; the caller must interrupt first.
    AlreadyExecuting,
    /// The stream could not be opened at all.
    Connect(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExecuting => write!(f, "a stream is already executing for this session"),
            Self::Connect(message) => write!(f, "failed to open stream: {message}"),
        }
    }
}

impl std::error::Error for ChatError {}

struct ActiveStream {
    cancel: CancelSignal,
}

type UpdateHook = Box<dyn FnMut() + Send>;

/// One chat session: an aggregator plus at most one in-flight stream.
///
/// `execute` blocks until the stream settles; `interrupt` may be called from
/// another thread and closes the stream cooperatively. Concurrency policy is
/// reject-while-busy: a second `execute` fails with
/// [`ChatError::AlreadyExecuting`] instead of replacing the live stream.
pub struct ChatSession {
    transport: Arc<dyn StreamTransport>,
    aggregator: Mutex<Aggregator>,
    session_id: String,
    user_id: String,
    agent_type: String,
    active: Mutex<Option<ActiveStream>>,
    on_update: Mutex<Option<UpdateHook>>,
}

impl ChatSession {
    #[must_use]
    pub fn new(transport: Arc<dyn StreamTransport>, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            transport,
            aggregator: Mutex::new(Aggregator::new(session_id.clone())),
            session_id,
            user_id: String::new(),
            agent_type: String::new(),
            active: Mutex::new(None),
            on_update: Mutex::new(None),
        }
    }

    /// Creates a session backed by the real SSE transport.
    pub fn over_sse(
        config: AgentApiConfig,
        session_id: impl Into<String>,
    ) -> Result<Self, AgentApiError> {
        let transport = Arc::new(SseStreamTransport::new(config)?);
        Ok(Self::new(transport, session_id))
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    #[must_use]
    pub fn with_agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = agent_type.into();
        self
    }

    #[must_use]
    pub fn with_notification_sink(self, sink: Box<dyn NotificationSink>) -> Self {
        lock_unpoisoned(&self.aggregator).set_sink(sink);
        self
    }

    /// Registers a fire-and-forget callback invoked after each list mutation
    /// (scroll-to-bottom style UI side effects). Must not block.
    pub fn set_update_hook(&self, hook: UpdateHook) {
        *lock_unpoisoned(&self.on_update) = Some(hook);
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Snapshot of the current message list.
    pub fn messages(&self) -> Vec<DisplayMessage> {
        lock_unpoisoned(&self.aggregator).messages().to_vec()
    }

    pub fn progress(&self) -> Option<ProgressInfo> {
        lock_unpoisoned(&self.aggregator).progress().cloned()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        lock_unpoisoned(&self.aggregator).connection_status()
    }

    pub fn task_status(&self) -> TaskStatus {
        lock_unpoisoned(&self.aggregator).task_status()
    }

    pub fn is_executing(&self) -> bool {
        lock_unpoisoned(&self.active).is_some()
    }

    /// Executes one user message, blocking until the stream settles.
    pub fn execute(&self, text: &str) -> Result<ExecuteOutcome, ChatError> {
        self.run_stream(text, false)
    }

    /// Executes one command input (`isCommand` on the wire).
    pub fn execute_command(&self, text: &str) -> Result<ExecuteOutcome, ChatError> {
        self.run_stream(text, true)
    }

    /// Requests cancellation of the in-flight stream, if any.
    pub fn interrupt(&self) -> bool {
        let active = lock_unpoisoned(&self.active);
        match active.as_ref() {
            Some(stream) => {
                stream.cancel.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Clears all session state for a fresh conversation.
    pub fn clear(&self) {
        lock_unpoisoned(&self.aggregator).clear();
        self.fire_update();
    }

    /// Loads a persisted message list back into the session.
    pub fn restore(&self, messages: Vec<DisplayMessage>) {
        lock_unpoisoned(&self.aggregator).restore(messages);
        self.fire_update();
    }

    fn run_stream(&self, text: &str, is_command: bool) -> Result<ExecuteOutcome, ChatError> {
        let cancel = self.claim_stream_slot()?;

        let mut request =
            ExecuteRequest::new(text, self.user_id.clone(), self.session_id.clone(), self.agent_type.clone());
        if is_command {
            request = request.as_command();
        }

        {
            let mut aggregator = lock_unpoisoned(&self.aggregator);
            aggregator.begin_task(text);
            aggregator.push_user_message(text);
        }
        self.fire_update();
        debug!(session_id = %self.session_id, is_command, "stream starting");

        let mut saw_completion = false;
        let result = self.transport.open(&request, cancel, &mut |signal| {
            let mutated = {
                let mut aggregator = lock_unpoisoned(&self.aggregator);
                match signal {
                    StreamSignal::Opened => {
                        aggregator.mark_connected();
                        false
                    }
                    StreamSignal::Envelope(envelope) => {
                        match aggregator.apply(envelope) {
                            Applied::ListMutated => true,
                            Applied::StreamCompleted => {
                                saw_completion = true;
                                false
                            }
                            Applied::ProgressUpdated | Applied::Notified => false,
                        }
                    }
                }
            };
            if mutated {
                self.fire_update();
            }
        });

        self.release_stream_slot();

        match result {
            Ok(()) => {
                if !saw_completion {
                    lock_unpoisoned(&self.aggregator).finish_stream();
                }
                debug!(session_id = %self.session_id, "stream completed");
                Ok(ExecuteOutcome::Completed)
            }
            Err(TransportError::Cancelled) => {
                lock_unpoisoned(&self.aggregator).mark_interrupted();
                debug!(session_id = %self.session_id, "stream interrupted");
                Ok(ExecuteOutcome::Interrupted)
            }
            Err(TransportError::Failed(message)) => {
                warn!(session_id = %self.session_id, %message, "stream failed");
                let opened = {
                    let mut aggregator = lock_unpoisoned(&self.aggregator);
                    let opened = aggregator.connection_status() == ConnectionStatus::Connected;
                    aggregator.record_transport_failure(&message);
                    opened
                };
                self.fire_update();
                if opened {
                    Ok(ExecuteOutcome::Errored)
                } else {
                    Err(ChatError::Connect(message))
                }
            }
        }
    }

    fn claim_stream_slot(&self) -> Result<CancelSignal, ChatError> {
        let mut active = lock_unpoisoned(&self.active);
        if active.is_some() {
            return Err(ChatError::AlreadyExecuting);
        }
        let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
        *active = Some(ActiveStream {
            cancel: Arc::clone(&cancel),
        });
        Ok(cancel)
    }

    fn release_stream_slot(&self) {
        *lock_unpoisoned(&self.active) = None;
    }

    fn fire_update(&self) {
        if let Some(hook) = lock_unpoisoned(&self.on_update).as_mut() {
            hook();
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
