use agent_sse_api::headers::{
    build_headers, HEADER_ACCEPT, HEADER_CACHE_CONTROL, HEADER_CONTENT_TYPE, HEADER_SESSION_ID,
    HEADER_USER_AGENT,
};
use agent_sse_api::AgentApiConfig;

#[test]
fn headers_carry_stream_contract_defaults() {
    let headers = build_headers(&AgentApiConfig::default());

    assert_eq!(
        headers.get(HEADER_ACCEPT).map(String::as_str),
        Some("text/event-stream")
    );
    assert_eq!(
        headers.get(HEADER_CACHE_CONTROL).map(String::as_str),
        Some("no-cache")
    );
    assert_eq!(
        headers.get(HEADER_CONTENT_TYPE).map(String::as_str),
        Some("application/json")
    );
    assert!(headers
        .get(HEADER_USER_AGENT)
        .is_some_and(|ua| ua.starts_with("agent-chat/")));
    assert!(!headers.contains_key(HEADER_SESSION_ID));
}

#[test]
fn headers_include_trimmed_session_id_when_configured() {
    let headers = build_headers(&AgentApiConfig::default().with_session_id("  s-42  "));
    assert_eq!(headers.get(HEADER_SESSION_ID).map(String::as_str), Some("s-42"));

    let blank = build_headers(&AgentApiConfig::default().with_session_id("   "));
    assert!(!blank.contains_key(HEADER_SESSION_ID));
}

#[test]
fn extra_headers_are_lowercased_and_override_defaults() {
    let headers = build_headers(
        &AgentApiConfig::default()
            .insert_header("X-Trace-Id", "abc")
            .insert_header("Cache-Control", "no-store"),
    );

    assert_eq!(headers.get("x-trace-id").map(String::as_str), Some("abc"));
    assert_eq!(
        headers.get(HEADER_CACHE_CONTROL).map(String::as_str),
        Some("no-store")
    );
}

#[test]
fn explicit_user_agent_wins_over_default() {
    let headers = build_headers(&AgentApiConfig::default().with_user_agent("browser-shell/2.0"));
    assert_eq!(
        headers.get(HEADER_USER_AGENT).map(String::as_str),
        Some("browser-shell/2.0")
    );
}
