use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub ollama: OllamaConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub orchestration: OrchestrationConfig,
}

/// Hosted, vision-capable provider configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; the provider is left out of the chain when absent.
    pub api_key: Option<String>,
    pub model: String,
    pub vision_model: String,
    pub base_url: String,
}

/// Self-hosted, text-only provider configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Per-call timeouts for provider requests
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub media_timeout_ms: u64,
    pub self_hosted_timeout_ms: u64,
    pub probe_timeout_ms: u64,
}

/// Orchestration tuning values
#[derive(Debug, Clone)]
pub struct OrchestrationConfig {
    /// Provider names in priority order (first is tried first).
    pub provider_priority: Vec<String>,
    /// Trailing exchanges of history sent to providers.
    pub history_window: usize,
    /// Trailing prior user messages considered by the analysis gate.
    pub analysis_context_window: usize,
    /// Minimum combined word count before structured analysis is attempted.
    pub analysis_min_words: usize,
    /// Stage flips to analyzing once history length exceeds this.
    pub analyzing_after_exchanges: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let gemini = GeminiConfig {
            api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            vision_model: env::var("GEMINI_VISION_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
        };

        let ollama = OllamaConfig {
            base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama2".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let defaults = RequestConfig::default();
        let request = RequestConfig {
            timeout_ms: env_parse("REQUEST_TIMEOUT_MS", defaults.timeout_ms),
            media_timeout_ms: env_parse("MEDIA_REQUEST_TIMEOUT_MS", defaults.media_timeout_ms),
            self_hosted_timeout_ms: env_parse(
                "SELF_HOSTED_TIMEOUT_MS",
                defaults.self_hosted_timeout_ms,
            ),
            probe_timeout_ms: env_parse("PROBE_TIMEOUT_MS", defaults.probe_timeout_ms),
        };

        if request.probe_timeout_ms >= request.self_hosted_timeout_ms {
            return Err(AppError::Config {
                message: format!(
                    "PROBE_TIMEOUT_MS ({}) must be shorter than SELF_HOSTED_TIMEOUT_MS ({})",
                    request.probe_timeout_ms, request.self_hosted_timeout_ms
                ),
            });
        }

        let defaults = OrchestrationConfig::default();
        let orchestration = OrchestrationConfig {
            provider_priority: env::var("PROVIDER_PRIORITY")
                .map(|raw| parse_priority(&raw))
                .unwrap_or(defaults.provider_priority),
            history_window: env_parse("HISTORY_WINDOW", defaults.history_window),
            analysis_context_window: env_parse(
                "ANALYSIS_CONTEXT_WINDOW",
                defaults.analysis_context_window,
            ),
            analysis_min_words: env_parse("ANALYSIS_MIN_WORDS", defaults.analysis_min_words),
            analyzing_after_exchanges: env_parse(
                "ANALYZING_AFTER_EXCHANGES",
                defaults.analyzing_after_exchanges,
            ),
        };

        Ok(Config {
            gemini,
            ollama,
            logging,
            request,
            orchestration,
        })
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Split a comma separated provider list, normalizing case and dropping
/// blanks and repeats. First occurrence wins.
pub fn parse_priority(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(|name| name.trim().to_lowercase()) {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn media_timeout(&self) -> Duration {
        Duration::from_millis(self.media_timeout_ms)
    }

    pub fn self_hosted_timeout(&self) -> Duration {
        Duration::from_millis(self.self_hosted_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            media_timeout_ms: 60_000,
            self_hosted_timeout_ms: 300_000,
            probe_timeout_ms: 5_000,
        }
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            provider_priority: vec!["gemini".to_string(), "ollama".to_string()],
            history_window: 5,
            analysis_context_window: 3,
            analysis_min_words: 15,
            analyzing_after_exchanges: 5,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            vision_model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_priority_normalizes() {
        assert_eq!(
            parse_priority(" Gemini , OLLAMA,,"),
            vec!["gemini".to_string(), "ollama".to_string()]
        );
        assert!(parse_priority("").is_empty());
    }

    #[test]
    fn test_parse_priority_drops_repeats() {
        assert_eq!(
            parse_priority("ollama,gemini,Ollama, gemini"),
            vec!["ollama".to_string(), "gemini".to_string()]
        );
    }

    #[test]
    fn test_request_defaults() {
        let request = RequestConfig::default();
        assert!(request.probe_timeout() < request.self_hosted_timeout());
        assert!(request.timeout() < request.media_timeout());
    }

    #[test]
    fn test_orchestration_defaults() {
        let orchestration = OrchestrationConfig::default();
        assert_eq!(orchestration.history_window, 5);
        assert_eq!(orchestration.analysis_context_window, 3);
        assert_eq!(orchestration.analysis_min_words, 15);
        assert_eq!(orchestration.analyzing_after_exchanges, 5);
        assert_eq!(orchestration.provider_priority, vec!["gemini", "ollama"]);
    }
}
