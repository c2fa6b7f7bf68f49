use std::sync::{Arc, Mutex, MutexGuard};

/// Notification level derived from the triggering event type.
///
/// DONE maps to `Info`, DONEWITHWARNING to `Warning`, ERROR to `Error`; the
/// three event types stay distinguishable at the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Side-channel payload for terminal/warning/error events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub timestamp: i64,
    /// The triggering input of the current task.
    pub title: String,
    pub node_id: Option<String>,
    pub severity: Severity,
}

/// Sink for notifications extracted from the event stream.
///
/// The aggregator guarantees only when this is called and with what shape;
/// rendering is entirely the implementer's concern.
pub trait NotificationSink: Send {
    fn notify(&mut self, notification: Notification);
}

/// Sink that discards every notification.
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _notification: Notification) {}
}

/// Sink that records notifications behind a shared handle.
#[derive(Debug, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded notifications.
    #[must_use]
    pub fn log(&self) -> Arc<Mutex<Vec<Notification>>> {
        Arc::clone(&self.log)
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: Notification) {
        lock_unpoisoned(&self.log).push(notification);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
