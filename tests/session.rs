use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use agent_chat::{
    ChatError, ChatSession, ConnectionStatus, DisplayKind, ExecuteOutcome, RecordingSink,
    Severity, TaskStatus,
};
use agent_events::{
    CancelSignal, EventEnvelope, EventType, ExecuteRequest, StreamSignal, StreamTransport,
    TransportError,
};
use agent_transport_mock::MockTransport;

fn envelope(event_type: EventType, node_id: &str, message: &str) -> EventEnvelope {
    let mut env = EventEnvelope::new(event_type);
    env.node_id = Some(node_id.to_string());
    env.message = Some(message.to_string());
    env
}

fn scripted(envelopes: Vec<EventEnvelope>) -> Arc<MockTransport> {
    Arc::new(MockTransport::new(envelopes))
}

#[test]
fn execute_drives_a_full_stream_to_completion() {
    let transport = scripted(vec![
        envelope(EventType::Thinking, "n1", "Working on it. "),
        envelope(EventType::Thinking, "n1", "Almost there."),
        envelope(EventType::Done, "n1", "Finished."),
        envelope(EventType::Completed, "n1", ""),
    ]);
    let sink = RecordingSink::new();
    let log = sink.log();
    let session = ChatSession::new(transport.clone(), "s1")
        .with_user_id("user-001")
        .with_agent_type("ReAct")
        .with_notification_sink(Box::new(sink));

    let outcome = session.execute("do the task").expect("execute should succeed");

    assert_eq!(outcome, ExecuteOutcome::Completed);
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, DisplayKind::User);
    assert_eq!(messages[0].message, "do the task");
    assert_eq!(messages[1].message, "Working on it. Almost there.");
    assert_eq!(session.connection_status(), ConnectionStatus::Disconnected);
    assert_eq!(session.task_status(), TaskStatus::Completed);
    assert!(session.progress().is_none());

    let recorded = log.lock().expect("log lock should not be poisoned");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].severity, Severity::Info);
    assert_eq!(recorded[0].title, "do the task");

    let requests = transport.observed_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message, "do the task");
    assert_eq!(requests[0].user_id, "user-001");
    assert_eq!(requests[0].session_id, "s1");
    assert_eq!(requests[0].agent_type, "ReAct");
    assert!(!requests[0].is_command);
}

#[test]
fn execute_command_sets_the_command_flag_on_the_wire() {
    let transport = scripted(vec![envelope(EventType::Completed, "n1", "")]);
    let session = ChatSession::new(transport.clone(), "s1");

    session
        .execute_command("/compact")
        .expect("command execute should succeed");

    let requests = transport.observed_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].is_command);
}

#[test]
fn clean_close_without_completed_frame_still_finishes_the_task() {
    let transport = scripted(vec![envelope(EventType::Thinking, "n1", "partial")]);
    let session = ChatSession::new(transport, "s1");

    let outcome = session.execute("hi").expect("execute should succeed");

    assert_eq!(outcome, ExecuteOutcome::Completed);
    assert_eq!(session.connection_status(), ConnectionStatus::Disconnected);
    assert_eq!(session.task_status(), TaskStatus::Completed);
}

#[test]
fn mid_stream_failure_synthesizes_an_error_entry() {
    let transport = Arc::new(
        MockTransport::new(vec![
            envelope(EventType::Thinking, "n1", "Starting the work."),
            envelope(EventType::Thinking, "n1", " never delivered"),
        ])
        .failing_after(1, "connection reset by peer"),
    );
    let session = ChatSession::new(transport, "s1");

    let outcome = session.execute("hi").expect("mid-stream failure is not a call error");

    assert_eq!(outcome, ExecuteOutcome::Errored);
    let messages = session.messages();
    // User entry, the delivered fragment, then the synthesized error.
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].message, "Starting the work.");
    assert_eq!(messages[2].kind, DisplayKind::Error);
    assert_eq!(
        messages[2].message,
        "Connection failed: connection reset by peer"
    );
    assert_eq!(session.connection_status(), ConnectionStatus::Error);
    assert_eq!(session.task_status(), TaskStatus::Error);
}

/// Transport that fails before acknowledging the connection.
struct RefusingTransport;

impl StreamTransport for RefusingTransport {
    fn open(
        &self,
        _request: &ExecuteRequest,
        _cancel: CancelSignal,
        _emit: &mut dyn FnMut(StreamSignal),
    ) -> Result<(), TransportError> {
        Err(TransportError::Failed("connection refused".to_string()))
    }
}

#[test]
fn connect_failure_is_a_call_error_with_an_error_entry() {
    let session = ChatSession::new(Arc::new(RefusingTransport), "s1");

    let error = session.execute("hi").expect_err("open never succeeded");

    assert_eq!(error, ChatError::Connect("connection refused".to_string()));
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].kind, DisplayKind::Error);
    assert_eq!(session.connection_status(), ConnectionStatus::Error);
}

/// Transport that parks until its cancel signal is set, then reports
/// cancellation; used to exercise busy rejection and interrupts.
struct ParkedTransport {
    started: Arc<AtomicBool>,
}

impl StreamTransport for ParkedTransport {
    fn open(
        &self,
        _request: &ExecuteRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(StreamSignal),
    ) -> Result<(), TransportError> {
        emit(StreamSignal::Opened);
        self.started.store(true, Ordering::Release);
        while !cancel.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(5));
        }
        Err(TransportError::Cancelled)
    }
}

#[test]
fn second_execute_is_rejected_while_a_stream_is_live() {
    let started = Arc::new(AtomicBool::new(false));
    let session = Arc::new(ChatSession::new(
        Arc::new(ParkedTransport {
            started: Arc::clone(&started),
        }),
        "s1",
    ));

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.execute("long task"))
    };
    let wait_started = std::time::Instant::now();
    while !started.load(Ordering::Acquire) {
        assert!(
            wait_started.elapsed() < Duration::from_secs(5),
            "stream should have started"
        );
        thread::sleep(Duration::from_millis(5));
    }

    assert!(session.is_executing());
    assert_eq!(
        session.execute("impatient retry").expect_err("slot is taken"),
        ChatError::AlreadyExecuting
    );

    assert!(session.interrupt());
    let outcome = worker
        .join()
        .expect("worker should not panic")
        .expect("interrupt is not a call error");
    assert_eq!(outcome, ExecuteOutcome::Interrupted);
    assert_eq!(session.connection_status(), ConnectionStatus::Disconnected);
    assert!(!session.is_executing());

    // Slot freed: the session accepts work again.
    assert!(!session.interrupt());
}

#[test]
fn update_hook_fires_on_list_mutations_only() {
    let transport = scripted(vec![
        envelope(EventType::Thinking, "n1", "text"),
        envelope(EventType::Progress, "n1", "working"),
        envelope(EventType::Done, "n1", "done"),
        envelope(EventType::Completed, "n1", ""),
    ]);
    let session = ChatSession::new(transport, "s1");
    let (tick_tx, tick_rx) = mpsc::channel();
    session.set_update_hook(Box::new(move || {
        let _ = tick_tx.send(());
    }));

    session.execute("hi").expect("execute should succeed");

    // One tick for the user entry, one for the accumulated fragment; progress,
    // notification, and completion stay off the list channel.
    assert_eq!(tick_rx.try_iter().count(), 2);
}

#[test]
fn clear_and_restore_round_trip_session_state() {
    let transport = scripted(vec![
        envelope(EventType::Thinking, "n1", "remember me"),
        envelope(EventType::Completed, "n1", ""),
    ]);
    let session = ChatSession::new(transport, "s1");
    session.execute("hi").expect("execute should succeed");

    let saved = session.messages();
    session.clear();
    assert!(session.messages().is_empty());
    assert_eq!(session.task_status(), TaskStatus::Idle);

    session.restore(saved);
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].message, "remember me");
}
