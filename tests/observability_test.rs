use backlot::infrastructure::observability::{
    REQUEST_ID_HEADER, RequestId, TracingConfig, sanitize_prompt,
};

#[test]
fn given_request_id_header_constant_when_accessed_then_returns_correct_value() {
    assert_eq!(REQUEST_ID_HEADER, "x-request-id");
}

#[test]
fn given_request_id_when_cloned_then_equals_original() {
    let original = RequestId("abc".to_string());
    let cloned = original.clone();
    assert_eq!(original.0, cloned.0);
}

#[test]
fn given_default_config_when_created_then_environment_is_set() {
    let config = TracingConfig::default();
    assert!(!config.environment.is_empty());
}

#[test]
fn given_empty_prompt_when_sanitized_then_placeholder_returned() {
    assert_eq!(sanitize_prompt("   "), "[EMPTY]");
}

#[test]
fn given_long_prompt_when_sanitized_then_truncated_with_length() {
    let prompt = "x".repeat(500);
    let sanitized = sanitize_prompt(&prompt);
    assert!(sanitized.contains("(500 chars total)"));
    assert!(sanitized.len() < prompt.len());
}

#[test]
fn given_credentialish_prompt_when_sanitized_then_redacted() {
    let sanitized = sanitize_prompt("call with api_key=sk-123456 please");
    assert!(sanitized.contains("api_key=[REDACTED]"));
    assert!(!sanitized.contains("sk-123456"));
}
