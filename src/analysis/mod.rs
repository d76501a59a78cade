//! Structured analysis extraction.
//!
//! A second, schema-constrained provider call that turns the conversation
//! into win probability, statutes, precedents and attorney recommendations.
//! Every failure here degrades to "no analysis"; the conversational answer is
//! never affected.

mod attorneys;
mod citations;
mod parsing;

pub use attorneys::*;
pub use citations::{case_url, law_url, search_url};
pub use parsing::{parse_analysis, recover_json, CitationEntry, RawAnalysis};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chain::{FallbackChain, InferenceOutcome};
use crate::config::OrchestrationConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::orchestrator::Exchange;
use crate::prompts::{analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::providers::{InferenceRequest, Message};

/// Maximum statutes kept per analysis.
pub const MAX_LAWS: usize = 4;
/// Maximum precedents kept per analysis.
pub const MAX_PRECEDENTS: usize = 3;

const INSUFFICIENT_DATA: &str = "Insufficient data";
const DEFAULT_WIN_MESSAGE: &str = "More information needed for accurate assessment";
const DEFAULT_LEGAL_AREA: &str = "General";
const DEFAULT_JURISDICTION: &str = "Your area";
const PRECEDENT_YEAR: &str = "Recent";

/// A standalone number followed by `%`; for a range like `40-50%` the lower bound.
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w.])(-?\d+(?:\.\d+)?)(?:\s*-\s*\d+(?:\.\d+)?)?\s*%")
        .expect("valid percentage regex")
});

/// A standalone number not glued to a word by a hyphen (`COVID-19`).
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w.-])(-?\d+(?:\.\d+)?)").expect("valid number regex"));

/// Structured analysis attached to an orchestration response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAnalysis {
    /// `"{n}%"` with n in 0..=100, or `"Insufficient data"`.
    pub win_probability: String,
    pub win_message: String,
    pub legal_area: String,
    pub jurisdiction: String,
    pub laws: Vec<LawReference>,
    pub precedents: Vec<PrecedentReference>,
    pub lawyers: Vec<AttorneyRecommendation>,
    pub key_factors: Vec<String>,
}

/// A statute with its derived URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LawReference {
    pub title: String,
    pub citation: String,
    pub url: String,
}

/// A precedent case with its derived URL and relevance tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecedentReference {
    pub name: String,
    pub citation: String,
    pub relevance: RelevanceTier,
    pub year: String,
    pub url: String,
}

/// Relevance of a precedent, assigned by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelevanceTier {
    High,
    Medium,
    Moderate,
}

impl RelevanceTier {
    /// 1st → High, 2nd → Medium, rest → Moderate.
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            0 => RelevanceTier::High,
            1 => RelevanceTier::Medium,
            _ => RelevanceTier::Moderate,
        }
    }
}

/// Normalize a model-supplied win probability.
///
/// Accepts `"65%"`, `"65"` or `65`. Values are clamped to 0–100, never rescaled.
pub fn normalize_win_probability(value: Option<&Value>) -> String {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => PERCENT_RE
            .captures(s)
            .or_else(|| NUMBER_RE.captures(s))
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => format!("{}%", n.clamp(0.0, 100.0).round() as u32),
        _ => INSUFFICIENT_DATA.to_string(),
    }
}

fn non_empty(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Turn parsed model output into the capped, URL-enriched analysis.
pub fn build_analysis(raw: RawAnalysis, directory: &AttorneyDirectory) -> StructuredAnalysis {
    let legal_area = non_empty(raw.legal_area, DEFAULT_LEGAL_AREA);
    let jurisdiction = non_empty(raw.jurisdiction, DEFAULT_JURISDICTION);

    let laws = raw
        .relevant_laws
        .iter()
        .filter(|entry| !entry.citation().is_empty())
        .take(MAX_LAWS)
        .map(|entry| LawReference {
            title: entry.display_title(),
            citation: entry.citation().to_string(),
            url: law_url(entry.citation()),
        })
        .collect();

    let precedents = raw
        .precedent_cases
        .iter()
        .filter(|entry| !entry.citation().is_empty())
        .take(MAX_PRECEDENTS)
        .enumerate()
        .map(|(rank, entry)| PrecedentReference {
            name: entry.display_title(),
            citation: entry.citation().to_string(),
            relevance: RelevanceTier::for_rank(rank),
            year: PRECEDENT_YEAR.to_string(),
            url: case_url(entry.citation()),
        })
        .collect();

    let key_factors = raw
        .key_factors
        .into_iter()
        .filter_map(|factor| match factor {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect();

    let lawyers = directory.recommend(&legal_area, &jurisdiction);

    StructuredAnalysis {
        win_probability: normalize_win_probability(raw.win_probability.as_ref()),
        win_message: non_empty(raw.win_message, DEFAULT_WIN_MESSAGE),
        legal_area,
        jurisdiction,
        laws,
        precedents,
        lawyers,
        key_factors,
    }
}

/// Current message plus the trailing `window` prior user messages.
pub fn analysis_context(user_message: &str, history: &[Exchange], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .map(|exchange| exchange.user_message.as_str())
        .filter(|m| !m.trim().is_empty())
        .fold(user_message.to_string(), |mut context, message| {
            context.push('\n');
            context.push_str(message);
            context
        })
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Runs the analysis call through the fallback chain.
#[derive(Debug, Clone)]
pub struct AnalysisExtractor {
    chain: FallbackChain,
    directory: Arc<AttorneyDirectory>,
    context_window: usize,
    min_words: usize,
}

impl AnalysisExtractor {
    /// Create an extractor sharing the conversational chain.
    pub fn new(
        chain: FallbackChain,
        directory: Arc<AttorneyDirectory>,
        config: &OrchestrationConfig,
    ) -> Self {
        Self {
            chain,
            directory,
            context_window: config.analysis_context_window,
            min_words: config.analysis_min_words,
        }
    }

    /// Extract an analysis, or `None` when context is insufficient or anything fails.
    pub async fn extract(
        &self,
        user_message: &str,
        history: &[Exchange],
    ) -> Option<StructuredAnalysis> {
        match self.try_extract(user_message, history).await {
            Ok(analysis) => Some(analysis),
            Err(e @ AnalysisError::InsufficientContext { .. }) => {
                debug!(error = %e, "Skipping structured analysis");
                None
            }
            Err(e) => {
                warn!(error = %e, "Structured analysis unavailable");
                None
            }
        }
    }

    /// Same as [`extract`](Self::extract) but reports why no analysis was produced.
    pub async fn try_extract(
        &self,
        user_message: &str,
        history: &[Exchange],
    ) -> AnalysisResult<StructuredAnalysis> {
        let context = analysis_context(user_message, history, self.context_window);
        let words = word_count(&context);
        if words < self.min_words {
            return Err(AnalysisError::InsufficientContext {
                words,
                required: self.min_words,
            });
        }

        let request = InferenceRequest::new(vec![
            Message::system(ANALYSIS_SYSTEM_PROMPT),
            Message::user(analysis_prompt(&context)),
        ]);

        let completion = match self.chain.run(&request).await {
            InferenceOutcome::Answered { provider, text } => {
                debug!(provider = %provider, chars = text.len(), "Analysis completion received");
                text
            }
            InferenceOutcome::Fallback => return Err(AnalysisError::NoCompletion),
        };

        let raw = parse_analysis(&completion)?;
        let analysis = build_analysis(raw, &self.directory);

        info!(
            legal_area = %analysis.legal_area,
            laws = analysis.laws.len(),
            precedents = analysis.precedents.len(),
            lawyers = analysis.lawyers.len(),
            "Structured analysis extracted"
        );

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn exchange(user: &str) -> Exchange {
        Exchange {
            user_message: user.to_string(),
            system_response: "ok".to_string(),
        }
    }

    #[test]
    fn test_win_probability_shapes() {
        assert_eq!(normalize_win_probability(Some(&json!("65%"))), "65%");
        assert_eq!(normalize_win_probability(Some(&json!("65"))), "65%");
        assert_eq!(normalize_win_probability(Some(&json!(65))), "65%");
        assert_eq!(normalize_win_probability(Some(&json!(72.6))), "73%");
        assert_eq!(normalize_win_probability(Some(&json!("About 40-50%"))), "40%");
    }

    #[test]
    fn test_win_probability_ignores_hyphenated_words() {
        assert_eq!(
            normalize_win_probability(Some(&json!("COVID-19 claim: 60%"))),
            "60%"
        );
        assert_eq!(
            normalize_win_probability(Some(&json!("COVID-19 related, unclear"))),
            "Insufficient data"
        );
    }

    #[test]
    fn test_win_probability_clamped() {
        assert_eq!(normalize_win_probability(Some(&json!(150))), "100%");
        assert_eq!(normalize_win_probability(Some(&json!("-5%"))), "0%");
    }

    #[test]
    fn test_win_probability_insufficient() {
        assert_eq!(normalize_win_probability(None), "Insufficient data");
        assert_eq!(normalize_win_probability(Some(&json!("unknown"))), "Insufficient data");
        assert_eq!(normalize_win_probability(Some(&json!(null))), "Insufficient data");
    }

    #[test]
    fn test_relevance_tiers() {
        assert_eq!(RelevanceTier::for_rank(0), RelevanceTier::High);
        assert_eq!(RelevanceTier::for_rank(1), RelevanceTier::Medium);
        assert_eq!(RelevanceTier::for_rank(2), RelevanceTier::Moderate);
        assert_eq!(serde_json::to_value(RelevanceTier::High).unwrap(), "High");
    }

    #[test]
    fn test_build_analysis_caps_and_urls() {
        let raw = parse_analysis(
            r#"{
                "winProbability": 65,
                "winMessage": "Strong claim.",
                "legalArea": "Personal Injury",
                "jurisdiction": "Los Angeles, CA",
                "relevantLaws": ["18 U.S.C. § 1001", "a", "b", "c", "d", "e"],
                "precedentCases": ["p1", "p2", "p3", "p4", "p5"],
                "keyFactors": ["Witnesses", ""]
            }"#,
        )
        .unwrap();

        let analysis = build_analysis(raw, &AttorneyDirectory::builtin());

        assert_eq!(analysis.laws.len(), MAX_LAWS);
        assert_eq!(analysis.precedents.len(), MAX_PRECEDENTS);
        assert!(analysis.lawyers.len() <= MAX_ATTORNEYS);
        assert_eq!(
            analysis.laws[0].url,
            "https://www.law.cornell.edu/uscode/text/18/1001"
        );
        assert_eq!(analysis.precedents[0].relevance, RelevanceTier::High);
        assert_eq!(analysis.precedents[2].relevance, RelevanceTier::Moderate);
        assert_eq!(analysis.precedents[0].year, "Recent");
        assert_eq!(analysis.key_factors, vec!["Witnesses".to_string()]);
        assert_eq!(analysis.lawyers[0].specialty, "Personal Injury");
    }

    #[test]
    fn test_build_analysis_defaults() {
        let analysis = build_analysis(RawAnalysis::default(), &AttorneyDirectory::builtin());

        assert_eq!(analysis.win_probability, "Insufficient data");
        assert_eq!(
            analysis.win_message,
            "More information needed for accurate assessment"
        );
        assert_eq!(analysis.legal_area, "General");
        assert_eq!(analysis.jurisdiction, "Your area");
        assert!(analysis.laws.is_empty());
        assert!(!analysis.lawyers.is_empty());
    }

    #[test]
    fn test_analysis_serializes_camel_case() {
        let analysis = build_analysis(RawAnalysis::default(), &AttorneyDirectory::new());
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json.get("winProbability").is_some());
        assert!(json.get("keyFactors").is_some());
    }

    #[test]
    fn test_analysis_context_uses_trailing_window() {
        let history = vec![
            exchange("first"),
            exchange("second"),
            exchange("third"),
            exchange("fourth"),
        ];
        let context = analysis_context("now", &history, 3);
        assert_eq!(context, "now\nsecond\nthird\nfourth");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\nthree\tfour "), 4);
        assert_eq!(word_count(""), 0);
    }
}
