use serde::{Deserialize, Serialize};

/// Message in a provider conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Binary image or video content submitted inline to a vision-capable provider.
#[derive(Debug, Clone, PartialEq)]
pub struct InlinePayload {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// A single inference call: ordered messages plus any inline media.
#[derive(Debug, Clone, Default)]
pub struct InferenceRequest {
    pub messages: Vec<Message>,
    pub media: Vec<InlinePayload>,
}

impl InferenceRequest {
    /// Create a text-only request
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            media: Vec::new(),
        }
    }

    /// Attach inline media payloads
    pub fn with_media(mut self, media: Vec<InlinePayload>) -> Self {
        self.media = media;
        self
    }

    /// Whether any provider receiving this request must be vision-capable.
    pub fn requires_vision(&self) -> bool {
        !self.media.is_empty()
    }

    /// Concatenated system message content, if any.
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}
