use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Capability, InferenceRequest, MessageRole, Provider, ProviderDescriptor};
use crate::config::{GeminiConfig, RequestConfig};
use crate::error::{ProviderError, ProviderResult};

/// Client for the hosted Gemini `generateContent` API.
///
/// Vision-capable: inline image and video payloads are attached to the final
/// user turn.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    vision_model: String,
    descriptor: ProviderDescriptor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiClient {
    /// Create a new Gemini client. Fails when no API key is configured.
    pub fn new(config: &GeminiConfig, request_config: &RequestConfig) -> ProviderResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: "gemini".to_string(),
                message: "GEMINI_API_KEY is not set".to_string(),
            })?;

        let client = Client::builder().build().map_err(ProviderError::Http)?;

        let descriptor = ProviderDescriptor::new("gemini", request_config.timeout())
            .with_capability(Capability::Vision)
            .with_media_timeout(request_config.media_timeout());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
            descriptor,
        })
    }

    /// Set the priority rank
    pub fn with_priority(mut self, priority: usize) -> Self {
        self.descriptor.priority = priority;
        self
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_for(&self, request: &InferenceRequest) -> &str {
        if request.requires_vision() {
            &self.vision_model
        } else {
            &self.model
        }
    }

    fn build_body(request: &InferenceRequest) -> GenerateContentRequest {
        let system_instruction = request.system_prompt().map(|text| Content {
            role: None,
            parts: vec![Part::text(text)],
        });

        let mut contents: Vec<Content> = request
            .messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    MessageRole::System => return None,
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                Some(Content {
                    role: Some(role.to_string()),
                    parts: vec![Part::text(m.content.clone())],
                })
            })
            .collect();

        if !request.media.is_empty() {
            let needs_user_turn = contents
                .last()
                .map_or(true, |c| c.role.as_deref() != Some("user"));
            if needs_user_turn {
                contents.push(Content {
                    role: Some("user".to_string()),
                    parts: Vec::new(),
                });
            }
            if let Some(last) = contents.last_mut() {
                last.parts.extend(request.media.iter().map(|payload| Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: payload.media_type.clone(),
                        data: STANDARD.encode(&payload.bytes),
                    }),
                }));
            }
        }

        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_p: 0.9,
            },
        }
    }
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

#[async_trait]
impl Provider for GeminiClient {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn complete(&self, request: &InferenceRequest) -> ProviderResult<String> {
        let model = self.model_for(request);
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        debug!(
            model = %model,
            messages = request.messages.len(),
            media = request.media.len(),
            "Calling Gemini"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let body: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    message: format!("Failed to parse Gemini response: {}", e),
                })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse {
                provider: "gemini".to_string(),
            });
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{InlinePayload, Message};

    fn client() -> GeminiClient {
        let config = GeminiConfig {
            api_key: Some("test-key".to_string()),
            vision_model: "gemini-vision".to_string(),
            ..GeminiConfig::default()
        };
        GeminiClient::new(&config, &RequestConfig::default()).unwrap()
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = GeminiClient::new(&GeminiConfig::default(), &RequestConfig::default());
        assert!(matches!(result, Err(ProviderError::NotConfigured { .. })));
    }

    #[test]
    fn test_descriptor_declares_vision() {
        let client = client();
        assert!(client.descriptor().supports(Capability::Vision));
        assert!(!client.descriptor().liveness_probe);
    }

    #[test]
    fn test_model_switches_for_media() {
        let client = client();
        let text = InferenceRequest::new(vec![Message::user("hi")]);
        assert_eq!(client.model_for(&text), "gemini-1.5-flash");

        let media = text.with_media(vec![InlinePayload {
            filename: "a.png".to_string(),
            media_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }]);
        assert_eq!(client.model_for(&media), "gemini-vision");
    }

    #[test]
    fn test_build_body_maps_roles_and_media() {
        let request = InferenceRequest::new(vec![
            Message::system("be terse"),
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("look at this"),
        ])
        .with_media(vec![InlinePayload {
            filename: "a.png".to_string(),
            media_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }]);

        let body = serde_json::to_value(GeminiClient::build_body(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "look at this");
        assert_eq!(contents[2]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(contents[2]["parts"][1]["inlineData"]["data"], "AQID");
    }
}
