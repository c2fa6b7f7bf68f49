use std::collections::BTreeMap;

use crate::config::AgentApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CACHE_CONTROL: &str = "cache-control";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_SESSION_ID: &str = "session_id";
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Build a deterministic header map for stream-opening POST requests.
///
/// The server-push contract requires `Accept: text/event-stream` and
/// `Cache-Control: no-cache`; explicit extra headers win over defaults.
pub fn build_headers(config: &AgentApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "text/event-stream".to_owned());
    headers.insert(HEADER_CACHE_CONTROL.to_owned(), "no-cache".to_owned());

    let ua = match config.user_agent.as_deref().map(str::trim) {
        Some(explicit) if !explicit.is_empty() => explicit.to_owned(),
        _ => default_user_agent(),
    };
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    if let Some(session_id) = config.session_id.as_deref().map(str::trim) {
        if !session_id.is_empty() {
            headers.insert(HEADER_SESSION_ID.to_owned(), session_id.to_owned());
        }
    }

    headers
}

fn default_user_agent() -> String {
    format!("agent-chat/{}", env!("CARGO_PKG_VERSION"))
}
