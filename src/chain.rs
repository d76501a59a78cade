//! Prioritized provider fallback.
//!
//! Providers are attempted strictly one after another in priority order. A
//! provider lacking a capability the request needs, or failing its liveness
//! probe, is skipped; a failed or empty attempt advances to the next
//! provider. Each provider gets exactly one attempt per traversal. When the
//! list is exhausted the outcome is [`InferenceOutcome::Fallback`], which the
//! caller resolves to its scripted response.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::providers::{Capability, InferenceRequest, Provider};

/// Identity reported when no provider answered.
pub const FALLBACK_PROVIDER: &str = "fallback";

/// Result of one chain traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    /// A provider returned non-empty text.
    Answered { provider: String, text: String },
    /// Every provider failed or was skipped.
    Fallback,
}

impl InferenceOutcome {
    /// Identity of the provider that answered, or `"fallback"`.
    pub fn provider_used(&self) -> &str {
        match self {
            InferenceOutcome::Answered { provider, .. } => provider,
            InferenceOutcome::Fallback => FALLBACK_PROVIDER,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            InferenceOutcome::Answered { text, .. } => Some(text),
            InferenceOutcome::Fallback => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, InferenceOutcome::Fallback)
    }
}

/// Why a provider was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingVision,
    Unavailable,
}

/// Ordered, immutable list of providers.
#[derive(Clone)]
pub struct FallbackChain {
    providers: Vec<Arc<dyn Provider>>,
}

impl std::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl FallbackChain {
    /// Build a chain ordered by descriptor priority.
    ///
    /// Sorting is stable, so equal ranks keep their configured order. An empty
    /// provider list is the one unrecoverable configuration error.
    pub fn new(mut providers: Vec<Arc<dyn Provider>>) -> AppResult<Self> {
        if providers.is_empty() {
            return Err(AppError::Config {
                message: "fallback chain requires at least one provider".to_string(),
            });
        }
        providers.sort_by_key(|p| p.descriptor().priority);
        Ok(Self { providers })
    }

    /// Provider names in attempt order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.descriptor().name.clone())
            .collect()
    }

    /// Run one traversal for `request`.
    pub async fn run(&self, request: &InferenceRequest) -> InferenceOutcome {
        let start = Instant::now();
        let needs_vision = request.requires_vision();

        for provider in &self.providers {
            let descriptor = provider.descriptor();

            if let Some(reason) = self.skip_reason(provider.as_ref(), needs_vision).await {
                info!(
                    provider = %descriptor.name,
                    reason = ?reason,
                    "Skipping provider"
                );
                continue;
            }

            debug!(provider = %descriptor.name, "Trying provider");
            let timeout = descriptor.timeout_for(request);

            if let Some(text) = provider.call(request, timeout).await {
                info!(
                    provider = %descriptor.name,
                    latency_ms = start.elapsed().as_millis(),
                    "Chain resolved"
                );
                return InferenceOutcome::Answered {
                    provider: descriptor.name.clone(),
                    text,
                };
            }
        }

        warn!(
            providers = self.providers.len(),
            latency_ms = start.elapsed().as_millis(),
            "All providers failed or were skipped, using scripted fallback"
        );
        InferenceOutcome::Fallback
    }

    async fn skip_reason(&self, provider: &dyn Provider, needs_vision: bool) -> Option<SkipReason> {
        let descriptor = provider.descriptor();

        if needs_vision && !descriptor.supports(Capability::Vision) {
            return Some(SkipReason::MissingVision);
        }
        if descriptor.liveness_probe && !provider.is_available().await {
            return Some(SkipReason::Unavailable);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderResult};
    use crate::providers::{InlinePayload, Message, ProviderDescriptor};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records the order in which providers are invoked.
    type CallLog = Arc<Mutex<Vec<String>>>;

    struct StubProvider {
        descriptor: ProviderDescriptor,
        answer: Option<&'static str>,
        available: bool,
        delay: Duration,
        calls: AtomicUsize,
        probes: AtomicUsize,
        log: CallLog,
    }

    impl StubProvider {
        fn new(name: &str, priority: usize, answer: Option<&'static str>, log: &CallLog) -> Self {
            Self {
                descriptor: ProviderDescriptor::new(name, Duration::from_secs(5))
                    .with_priority(priority),
                answer,
                available: true,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                probes: AtomicUsize::new(0),
                log: Arc::clone(log),
            }
        }

        fn vision(mut self) -> Self {
            self.descriptor = self.descriptor.with_capability(Capability::Vision);
            self
        }

        fn probed(mut self, available: bool) -> Self {
            self.descriptor = self.descriptor.with_liveness_probe();
            self.available = available;
            self
        }

        fn slow(mut self, delay: Duration, timeout: Duration) -> Self {
            self.delay = delay;
            self.descriptor.timeout = timeout;
            self
        }
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn is_available(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.available
        }

        async fn complete(&self, _request: &InferenceRequest) -> ProviderResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log
                .lock()
                .unwrap()
                .push(self.descriptor.name.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.answer
                .map(str::to_string)
                .ok_or(ProviderError::Api {
                    status: 500,
                    message: "stub failure".to_string(),
                })
        }
    }

    fn text_request() -> InferenceRequest {
        InferenceRequest::new(vec![Message::user("My landlord kept my deposit.")])
    }

    fn image_request() -> InferenceRequest {
        text_request().with_media(vec![InlinePayload {
            filename: "damage.png".to_string(),
            media_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }])
    }

    #[test]
    fn test_empty_chain_is_config_error() {
        let result = FallbackChain::new(Vec::new());
        assert!(matches!(result, Err(AppError::Config { .. })));
    }

    #[test]
    fn test_chain_sorted_by_priority() {
        let log = CallLog::default();
        let chain = FallbackChain::new(vec![
            Arc::new(StubProvider::new("second", 1, None, &log)),
            Arc::new(StubProvider::new("first", 0, None, &log)),
        ])
        .unwrap();
        assert_eq!(chain.provider_names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let log = CallLog::default();
        let primary = Arc::new(StubProvider::new("primary", 0, Some("answer"), &log).vision());
        let secondary = Arc::new(StubProvider::new("secondary", 1, Some("other"), &log));
        let chain = FallbackChain::new(vec![primary.clone(), secondary.clone()]).unwrap();

        let outcome = chain.run(&text_request()).await;

        assert_eq!(
            outcome,
            InferenceOutcome::Answered {
                provider: "primary".to_string(),
                text: "answer".to_string(),
            }
        );
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_advances_to_next_provider() {
        let log = CallLog::default();
        let primary = Arc::new(StubProvider::new("primary", 0, None, &log).vision());
        let secondary = Arc::new(StubProvider::new("secondary", 1, Some("from secondary"), &log));
        let chain = FallbackChain::new(vec![primary.clone(), secondary.clone()]).unwrap();

        let outcome = chain.run(&text_request()).await;

        assert_eq!(outcome.provider_used(), "secondary");
        assert_eq!(outcome.text(), Some("from secondary"));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock().unwrap(), vec!["primary", "secondary"]);
    }

    #[tokio::test]
    async fn test_text_only_provider_skipped_for_images() {
        let log = CallLog::default();
        let text_only = Arc::new(StubProvider::new("text-only", 0, Some("blind"), &log));
        let vision = Arc::new(StubProvider::new("vision", 1, Some("sees it"), &log).vision());
        let chain = FallbackChain::new(vec![text_only.clone(), vision.clone()]).unwrap();

        let outcome = chain.run(&image_request()).await;

        assert_eq!(outcome.provider_used(), "vision");
        assert_eq!(text_only.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_vision_skip_happens_before_probe() {
        let log = CallLog::default();
        let probed = Arc::new(StubProvider::new("self-hosted", 0, Some("x"), &log).probed(true));
        let chain = FallbackChain::new(vec![probed.clone()]).unwrap();

        let outcome = chain.run(&image_request()).await;

        assert!(outcome.is_fallback());
        assert_eq!(probed.probes.load(Ordering::SeqCst), 0);
        assert_eq!(probed.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_provider_skipped() {
        let log = CallLog::default();
        let down = Arc::new(StubProvider::new("down", 0, Some("never"), &log).probed(false));
        let up = Arc::new(StubProvider::new("up", 1, Some("ok"), &log));
        let chain = FallbackChain::new(vec![down.clone(), up]).unwrap();

        let outcome = chain.run(&text_request()).await;

        assert_eq!(outcome.provider_used(), "up");
        assert_eq!(down.probes.load(Ordering::SeqCst), 1);
        assert_eq!(down.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_treated_as_failure() {
        let log = CallLog::default();
        let slow = Arc::new(
            StubProvider::new("slow", 0, Some("late"), &log)
                .slow(Duration::from_millis(200), Duration::from_millis(20)),
        );
        let fast = Arc::new(StubProvider::new("fast", 1, Some("on time"), &log));
        let chain = FallbackChain::new(vec![slow, fast]).unwrap();

        let outcome = chain.run(&text_request()).await;

        assert_eq!(outcome.provider_used(), "fast");
    }

    #[tokio::test]
    async fn test_empty_text_treated_as_failure() {
        let log = CallLog::default();
        let blank = Arc::new(StubProvider::new("blank", 0, Some("   "), &log));
        let real = Arc::new(StubProvider::new("real", 1, Some("content"), &log));
        let chain = FallbackChain::new(vec![blank, real]).unwrap();

        assert_eq!(chain.run(&text_request()).await.provider_used(), "real");
    }

    #[tokio::test]
    async fn test_exhaustion_yields_fallback() {
        let log = CallLog::default();
        let a = Arc::new(StubProvider::new("a", 0, None, &log));
        let b = Arc::new(StubProvider::new("b", 1, None, &log));
        let chain = FallbackChain::new(vec![a.clone(), b.clone()]).unwrap();

        let outcome = chain.run(&text_request()).await;

        assert!(outcome.is_fallback());
        assert_eq!(outcome.provider_used(), FALLBACK_PROVIDER);
        assert!(outcome.text().is_none());
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }
}
