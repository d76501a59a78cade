//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Config::from_env() also loads a .env file
//! via dotenvy, so each test sets every variable it asserts on.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use legal_intake_orchestrator::config::{Config, LogFormat};
use serial_test::serial;
use std::env;

#[test]
#[serial]
fn test_config_from_env_loads_successfully() {
    let result = Config::from_env();
    assert!(result.is_ok(), "Config::from_env() should succeed with defaults");
}

#[test]
#[serial]
fn test_config_from_env_provider_priority() {
    env::set_var("PROVIDER_PRIORITY", " Ollama , ,gemini ");

    let config = Config::from_env().unwrap();
    assert_eq!(
        config.orchestration.provider_priority,
        vec!["ollama".to_string(), "gemini".to_string()]
    );

    env::remove_var("PROVIDER_PRIORITY");
}

#[test]
#[serial]
fn test_config_from_env_provider_priority_repeats_collapse() {
    env::set_var("PROVIDER_PRIORITY", "ollama,ollama,OLLAMA");

    let config = Config::from_env().unwrap();
    assert_eq!(config.orchestration.provider_priority, vec!["ollama".to_string()]);

    env::remove_var("PROVIDER_PRIORITY");
}

#[test]
#[serial]
fn test_config_from_env_gemini_key() {
    env::set_var("GEMINI_API_KEY", "abc123");
    env::set_var("GEMINI_VISION_MODEL", "gemini-pro-vision");

    let config = Config::from_env().unwrap();
    assert_eq!(config.gemini.api_key.as_deref(), Some("abc123"));
    assert_eq!(config.gemini.vision_model, "gemini-pro-vision");

    env::set_var("GEMINI_API_KEY", "   ");
    let config = Config::from_env().unwrap();
    assert!(config.gemini.api_key.is_none());

    env::remove_var("GEMINI_API_KEY");
    env::remove_var("GEMINI_VISION_MODEL");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::set_var("LOG_FORMAT", "pretty");
}

#[test]
#[serial]
fn test_config_from_env_custom_timeouts() {
    env::set_var("REQUEST_TIMEOUT_MS", "45000");
    env::set_var("SELF_HOSTED_TIMEOUT_MS", "120000");
    env::set_var("PROBE_TIMEOUT_MS", "2000");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 45000);
    assert_eq!(config.request.self_hosted_timeout_ms, 120000);
    assert_eq!(config.request.probe_timeout().as_millis(), 2000);

    env::remove_var("REQUEST_TIMEOUT_MS");
    env::remove_var("SELF_HOSTED_TIMEOUT_MS");
    env::remove_var("PROBE_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_probe_must_be_shorter_than_inference() {
    env::set_var("SELF_HOSTED_TIMEOUT_MS", "1000");
    env::set_var("PROBE_TIMEOUT_MS", "1000");

    assert!(Config::from_env().is_err());

    env::remove_var("SELF_HOSTED_TIMEOUT_MS");
    env::remove_var("PROBE_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_orchestration_thresholds() {
    env::set_var("HISTORY_WINDOW", "8");
    env::set_var("ANALYSIS_MIN_WORDS", "20");
    env::set_var("ANALYZING_AFTER_EXCHANGES", "3");

    let config = Config::from_env().unwrap();
    assert_eq!(config.orchestration.history_window, 8);
    assert_eq!(config.orchestration.analysis_min_words, 20);
    assert_eq!(config.orchestration.analyzing_after_exchanges, 3);

    env::remove_var("HISTORY_WINDOW");
    env::remove_var("ANALYSIS_MIN_WORDS");
    env::remove_var("ANALYZING_AFTER_EXCHANGES");
}

#[test]
#[serial]
fn test_config_invalid_number_uses_default() {
    env::set_var("ANALYSIS_CONTEXT_WINDOW", "not-a-number");

    let config = Config::from_env().unwrap();
    assert_eq!(config.orchestration.analysis_context_window, 3);

    env::remove_var("ANALYSIS_CONTEXT_WINDOW");
}
