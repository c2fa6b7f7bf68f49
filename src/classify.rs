use agent_events::EventType;

/// Semantic handling category for one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerCategory {
    /// Folded into the message list (find-or-create by node).
    Accumulate,
    /// Overwrites the progress slot; never touches the message list.
    Progress,
    /// Routed to the notification sink; never touches the message list.
    Notify,
    /// Stream-termination signal.
    Terminate,
}

/// Classify an event type into its handling category.
///
/// Total over the wire tag set: unrecognized types accumulate like any other
/// message event, so an unknown tag can never fail the stream.
pub fn classify(event_type: &EventType) -> HandlerCategory {
    match event_type {
        EventType::Progress => HandlerCategory::Progress,
        EventType::Done | EventType::DoneWithWarning | EventType::Error => HandlerCategory::Notify,
        EventType::Completed => HandlerCategory::Terminate,
        EventType::Started
        | EventType::Thinking
        | EventType::Action
        | EventType::Acting
        | EventType::Observing
        | EventType::Collaborating
        | EventType::Executing
        | EventType::Tool
        | EventType::ToolApproval
        | EventType::Interaction
        | EventType::PartialResult
        | EventType::TaskAnalysis
        | EventType::Thought
        | EventType::InitPlan
        | EventType::UpdatePlan
        | EventType::AdvancePlan
        | EventType::Other(_) => HandlerCategory::Accumulate,
    }
}
