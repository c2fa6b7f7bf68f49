use agent_sse_api::retry::{is_retryable_http_error, retry_delay_ms};

#[test]
fn retry_http_status_is_retryable() {
    assert!(is_retryable_http_error(429, ""));
    assert!(is_retryable_http_error(500, ""));
    assert!(is_retryable_http_error(502, ""));
    assert!(is_retryable_http_error(503, ""));
    assert!(is_retryable_http_error(504, ""));
    assert!(!is_retryable_http_error(400, ""));
    assert!(!is_retryable_http_error(404, ""));
}

#[test]
fn retry_transient_error_text_is_retryable() {
    assert!(is_retryable_http_error(0, "connection refused"));
    assert!(is_retryable_http_error(0, "Connection reset by peer"));
    assert!(is_retryable_http_error(400, "rate limit exceeded"));
    assert!(is_retryable_http_error(0, "request timed out"));
    assert!(!is_retryable_http_error(0, "invalid payload shape"));
}

#[test]
fn retry_delay_is_exponential() {
    assert_eq!(retry_delay_ms(0).as_millis(), 500);
    assert_eq!(retry_delay_ms(1).as_millis(), 1000);
    assert_eq!(retry_delay_ms(2).as_millis(), 2000);
}
