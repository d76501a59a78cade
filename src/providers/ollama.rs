use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{InferenceRequest, Message, Provider, ProviderDescriptor};
use crate::config::{OllamaConfig, RequestConfig};
use crate::error::{ProviderError, ProviderResult};

/// Client for a self-hosted Ollama server.
///
/// Text-only. Declares a liveness probe against `/api/tags` that uses its own,
/// shorter timeout than inference.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    probe_timeout: Duration,
    descriptor: ProviderDescriptor,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &OllamaConfig, request_config: &RequestConfig) -> ProviderResult<Self> {
        let client = Client::builder().build().map_err(ProviderError::Http)?;

        let descriptor = ProviderDescriptor::new("ollama", request_config.self_hosted_timeout())
            .with_liveness_probe();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            probe_timeout: request_config.probe_timeout(),
            descriptor,
        })
    }

    /// Set the priority rank
    pub fn with_priority(mut self, priority: usize) -> Self {
        self.descriptor.priority = priority;
        self
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_tags(&self) -> ProviderResult<TagsResponse> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: self.probe_timeout.as_millis() as u64,
                    }
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                message: format!("Failed to parse tags response: {}", e),
            })
    }

    /// Names of the models installed on the server; empty when unreachable.
    pub async fn list_models(&self) -> Vec<String> {
        match self.fetch_tags().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                warn!(provider = "ollama", error = %e, "Failed to list models");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Provider for OllamaClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(provider = "ollama", error = %e, "Liveness probe failed");
                false
            }
        }
    }

    async fn complete(&self, request: &InferenceRequest) -> ProviderResult<String> {
        let url = format!("{}/api/chat", self.base_url);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Calling Ollama"
        );

        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            stream: false,
            options: ChatOptions {
                temperature: 0.7,
                top_p: 0.9,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                message: format!("Failed to parse Ollama response: {}", e),
            })?;

        match chat.message.map(|m| m.content) {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(ProviderError::EmptyResponse {
                provider: "ollama".to_string(),
            }),
        }
    }
}
