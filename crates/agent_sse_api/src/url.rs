/// Default base URL for agent stream requests.
pub const DEFAULT_AGENT_BASE_URL: &str = "http://127.0.0.1:8080/api/agent";

/// Agent flavor selecting the stream endpoint and the `agentType` payload tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentKind {
    #[default]
    ReAct,
    ReActPlus,
}

impl AgentKind {
    /// Wire value carried in the request payload's `agentType` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReAct => "ReAct",
            Self::ReActPlus => "ReActPlus",
        }
    }

    /// Path segment used in the stream endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::ReAct => "react",
            Self::ReActPlus => "react-plus",
        }
    }
}

/// Normalize a base URL to a stream endpoint for the given agent kind.
///
/// Normalization rules:
/// 1) keep `/chat/<kind>/stream` unchanged
/// 2) append `<kind>/stream` when the path ends in `/chat`
/// 3) append `/chat/<kind>/stream` otherwise
pub fn normalize_stream_url(input: &str, agent: AgentKind) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_AGENT_BASE_URL
    } else {
        input.trim()
    };

    let segment = agent.path_segment();
    let trimmed = base.trim_end_matches('/');
    let suffix = format!("/chat/{segment}/stream");
    if trimmed.ends_with(&suffix) {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/chat") {
        return format!("{trimmed}/{segment}/stream");
    }
    format!("{trimmed}{suffix}")
}
