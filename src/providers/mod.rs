//! Inference providers.
//!
//! Every backend implements [`Provider`]. The fallback chain only ever sees
//! this trait and the immutable [`ProviderDescriptor`] each provider carries,
//! so adding a backend never touches chain logic.

mod gemini;
mod ollama;
mod types;

pub use gemini::*;
pub use ollama::*;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ProviderError, ProviderResult};

/// Optional abilities a provider may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Accepts inline image and video payloads.
    Vision,
}

/// Immutable description of one configured backend.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Provider identity reported as `provider_used`.
    pub name: String,
    /// Lower is tried first.
    pub priority: usize,
    pub capabilities: Vec<Capability>,
    /// Whether the chain must call [`Provider::is_available`] before each attempt.
    pub liveness_probe: bool,
    /// Inference timeout for text-only requests.
    pub timeout: Duration,
    /// Inference timeout when inline media is attached (defaults to `timeout`).
    pub media_timeout: Option<Duration>,
}

impl ProviderDescriptor {
    /// Create a descriptor with no capabilities and no liveness probe
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            capabilities: Vec::new(),
            liveness_probe: false,
            timeout,
            media_timeout: None,
        }
    }

    /// Set the priority rank
    pub fn with_priority(mut self, priority: usize) -> Self {
        self.priority = priority;
        self
    }

    /// Declare a capability
    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Require a liveness probe before each attempt
    pub fn with_liveness_probe(mut self) -> Self {
        self.liveness_probe = true;
        self
    }

    /// Use a longer timeout for requests carrying inline media
    pub fn with_media_timeout(mut self, timeout: Duration) -> Self {
        self.media_timeout = Some(timeout);
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Timeout that applies to the given request.
    pub fn timeout_for(&self, request: &InferenceRequest) -> Duration {
        if request.requires_vision() {
            self.media_timeout.unwrap_or(self.timeout)
        } else {
            self.timeout
        }
    }
}

/// A single inference backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Static configuration of this provider.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Execute one request against the backend, reporting the specific cause on failure.
    async fn complete(&self, request: &InferenceRequest) -> ProviderResult<String>;

    /// Liveness check. Only consulted when the descriptor declares a probe.
    async fn is_available(&self) -> bool {
        true
    }

    /// Execute one attempt bounded by `timeout`.
    ///
    /// Every failure cause (timeout, transport, malformed or empty text) is
    /// logged here and collapsed to `None`.
    async fn call(&self, request: &InferenceRequest, timeout: Duration) -> Option<String> {
        let name = self.descriptor().name.as_str();
        let start = Instant::now();

        let result = match tokio::time::timeout(timeout, self.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };
        let latency_ms = start.elapsed().as_millis();

        match result {
            Ok(text) if !text.trim().is_empty() => {
                info!(
                    provider = %name,
                    chars = text.len(),
                    latency_ms = latency_ms,
                    "Provider responded"
                );
                Some(text)
            }
            Ok(_) => {
                let e = ProviderError::EmptyResponse {
                    provider: name.to_string(),
                };
                warn!(
                    provider = %name,
                    latency_ms = latency_ms,
                    error = %e,
                    "Provider call failed"
                );
                None
            }
            Err(e) => {
                warn!(
                    provider = %name,
                    latency_ms = latency_ms,
                    error = %e,
                    "Provider call failed"
                );
                None
            }
        }
    }
}

/// Build the configured providers in priority order.
///
/// Unknown names and providers missing credentials are logged and left out;
/// an empty result is a configuration error.
pub fn build_providers(config: &Config) -> AppResult<Vec<Arc<dyn Provider>>> {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    for name in &config.orchestration.provider_priority {
        if providers.iter().any(|p| &p.descriptor().name == name) {
            warn!(provider = %name, "Provider listed twice in PROVIDER_PRIORITY, ignoring repeat");
            continue;
        }
        let priority = providers.len();
        match name.as_str() {
            "gemini" => match GeminiClient::new(&config.gemini, &config.request) {
                Ok(client) => providers.push(Arc::new(client.with_priority(priority))),
                Err(e) => warn!(provider = "gemini", error = %e, "Skipping provider"),
            },
            "ollama" => {
                let client = OllamaClient::new(&config.ollama, &config.request)?;
                providers.push(Arc::new(client.with_priority(priority)));
            }
            other => warn!(provider = %other, "Unknown provider in PROVIDER_PRIORITY, ignoring"),
        }
    }

    if providers.is_empty() {
        return Err(AppError::Config {
            message: format!(
                "no usable providers in PROVIDER_PRIORITY ({})",
                config.orchestration.provider_priority.join(",")
            ),
        });
    }

    info!(
        providers = ?providers.iter().map(|p| p.descriptor().name.clone()).collect::<Vec<_>>(),
        "Providers configured"
    );

    Ok(providers)
}
