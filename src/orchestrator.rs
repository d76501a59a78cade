//! Orchestration entry point.
//!
//! Composes attachment preparation, the fallback chain, question extraction,
//! structured analysis and stage tracking into one infallible call. The only
//! hard failure is configuration, surfaced when the orchestrator is built.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::{AnalysisExtractor, AttorneyDirectory, StructuredAnalysis};
use crate::chain::{FallbackChain, InferenceOutcome, FALLBACK_PROVIDER};
use crate::config::{Config, OrchestrationConfig};
use crate::error::{AppError, AppResult, ProviderError};
use crate::modality::{self, Attachment, PreparedAttachments};
use crate::normalizer::extract_clarifying_questions;
use crate::prompts::{media_note, summary_prompt, INTAKE_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT};
use crate::providers::{build_providers, InferenceRequest, Message};
use crate::stage::{CaseAssessment, CaseStage, ConfidenceLevel};

/// Scripted answer used when every provider failed or was skipped.
pub const FALLBACK_RESPONSE: &str = "Thank you for sharing your situation. To better help you, I need to gather some more information.";

/// Clarifying questions that accompany [`FALLBACK_RESPONSE`].
pub const FALLBACK_QUESTIONS: [&str; 4] = [
    "Can you provide more details about what happened?",
    "When did this incident occur?",
    "Do you have any documentation or evidence related to this matter?",
    "Have you contacted any authorities or other parties about this?",
];

/// One prior turn of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(default, alias = "user_message")]
    pub user_message: String,
    #[serde(default, alias = "system_response")]
    pub system_response: String,
}

impl Exchange {
    pub fn new(user_message: impl Into<String>, system_response: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            system_response: system_response.into(),
        }
    }
}

/// Base64-encoded attachment as received from callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    pub filename: String,
    #[serde(alias = "media_type", alias = "contentType", alias = "content_type")]
    pub media_type: String,
    #[serde(alias = "base64_data", alias = "data")]
    pub base64_data: String,
}

/// Orchestration input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(alias = "user_message")]
    pub user_message: String,
    #[serde(default, alias = "conversation_history")]
    pub conversation_history: Vec<Exchange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentInput>>,
}

impl AnalysisRequest {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<Exchange>) -> Self {
        self.conversation_history = history;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<AttachmentInput>) -> Self {
        self.attachments = Some(attachments);
        self
    }
}

/// Orchestration output. Always well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub response: String,
    pub clarifying_questions: Vec<String>,
    pub case_assessment: CaseAssessment,
    pub confidence_level: ConfidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<StructuredAnalysis>,
    /// Provider that produced `response`, or `"fallback"`.
    pub provider_used: String,
}

impl AnalysisResponse {
    /// The scripted response for an exhausted chain.
    pub fn fallback() -> Self {
        Self {
            response: FALLBACK_RESPONSE.to_string(),
            clarifying_questions: FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            case_assessment: CaseAssessment::Pending,
            confidence_level: ConfidenceLevel::Low,
            analysis: None,
            provider_used: FALLBACK_PROVIDER.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provider_used == FALLBACK_PROVIDER
    }
}

/// Summary of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
    pub summary: String,
    pub provider_used: String,
}

/// The orchestration core. Immutable after construction; share behind `Arc`.
#[derive(Debug, Clone)]
pub struct LegalOrchestrator {
    chain: FallbackChain,
    extractor: AnalysisExtractor,
    history_window: usize,
    analyzing_after: usize,
}

impl LegalOrchestrator {
    pub fn new(
        chain: FallbackChain,
        directory: Arc<AttorneyDirectory>,
        config: &OrchestrationConfig,
    ) -> Self {
        let extractor = AnalysisExtractor::new(chain.clone(), directory, config);
        Self {
            chain,
            extractor,
            history_window: config.history_window,
            analyzing_after: config.analyzing_after_exchanges,
        }
    }

    /// Build providers from configuration with the bundled attorney directory.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let chain = FallbackChain::new(build_providers(config)?)?;
        Ok(Self::new(
            chain,
            Arc::new(AttorneyDirectory::builtin()),
            &config.orchestration,
        ))
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Answer one user turn.
    ///
    /// Never fails: provider failures advance the chain, exhaustion yields
    /// [`AnalysisResponse::fallback`], and analysis problems leave `analysis` empty.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("analyze", request_id = %request_id);
        self.analyze_inner(request).instrument(span).await
    }

    async fn analyze_inner(&self, request: AnalysisRequest) -> AnalysisResponse {
        let AnalysisRequest {
            user_message,
            conversation_history: history,
            attachments,
        } = request;

        info!(
            history = history.len(),
            attachments = attachments.as_ref().map_or(0, Vec::len),
            "Analyzing user message"
        );

        let prepared = modality::prepare_all(decode_attachments(attachments.unwrap_or_default()));
        let inference = self.build_inference_request(&user_message, &history, prepared);

        let (provider_used, response) = match self.chain.run(&inference).await {
            InferenceOutcome::Answered { provider, text } => {
                info!(provider = %provider, "Conversational response ready");
                (provider, text)
            }
            InferenceOutcome::Fallback => return AnalysisResponse::fallback(),
        };

        let clarifying_questions = extract_clarifying_questions(&response);
        let analysis = self.extractor.extract(&user_message, &history).await;
        let stage = CaseStage::from_history_len(history.len(), self.analyzing_after);

        AnalysisResponse {
            response,
            clarifying_questions,
            case_assessment: stage.into(),
            confidence_level: ConfidenceLevel::Medium,
            analysis,
            provider_used,
        }
    }

    /// System prompt, the trailing history window, then the current turn with
    /// any extracted document text and a note about inline media.
    pub fn build_inference_request(
        &self,
        user_message: &str,
        history: &[Exchange],
        prepared: PreparedAttachments,
    ) -> InferenceRequest {
        let mut messages = vec![Message::system(INTAKE_SYSTEM_PROMPT)];

        let start = history.len().saturating_sub(self.history_window);
        for exchange in &history[start..] {
            if !exchange.user_message.trim().is_empty() {
                messages.push(Message::user(exchange.user_message.clone()));
            }
            if !exchange.system_response.trim().is_empty() {
                messages.push(Message::assistant(exchange.system_response.clone()));
            }
        }

        let mut content = user_message.to_string();
        if let Some(evidence) = modality::render_documents(&prepared.documents) {
            content.push_str("\n\n");
            content.push_str(&evidence);
        }
        if !prepared.media.is_empty() {
            content.push_str("\n\n");
            content.push_str(&media_note(prepared.media.len()));
        }
        messages.push(Message::user(content));

        InferenceRequest::new(messages).with_media(prepared.media)
    }

    /// Summarize a conversation.
    ///
    /// Unlike [`analyze`](Self::analyze) there is no scripted answer, so an
    /// exhausted chain is reported as [`ProviderError::Exhausted`].
    pub async fn summarize(&self, history: &[Exchange]) -> AppResult<CaseSummary> {
        let conversation = history
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.user_message, e.system_response))
            .collect::<Vec<_>>()
            .join("\n");

        let request = InferenceRequest::new(vec![
            Message::system(SUMMARY_SYSTEM_PROMPT),
            Message::user(summary_prompt(&conversation)),
        ]);

        match self.chain.run(&request).await {
            InferenceOutcome::Answered { provider, text } => Ok(CaseSummary {
                summary: text,
                provider_used: provider,
            }),
            InferenceOutcome::Fallback => {
                warn!(exchanges = history.len(), "Summary unavailable");
                Err(AppError::Provider(ProviderError::Exhausted))
            }
        }
    }
}

fn decode_attachments(inputs: Vec<AttachmentInput>) -> Vec<Attachment> {
    inputs
        .into_iter()
        .filter_map(|input| {
            match Attachment::from_base64(&input.filename, &input.media_type, &input.base64_data)
            {
                Ok(attachment) => Some(attachment),
                Err(e) => {
                    warn!(filename = %input.filename, error = %e, "Attachment contributed no content");
                    None
                }
            }
        })
        .collect()
}
