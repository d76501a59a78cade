//! Tolerant parsing of the analysis completion.
//!
//! Models wrap JSON in code fences or surround it with prose; both are
//! stripped before parsing. Dual-shape citation entries are resolved here into
//! [`CitationEntry`] so nothing downstream sees the ambiguity.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AnalysisError, AnalysisResult};

/// Analysis fields as returned by the model, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysis {
    #[serde(default)]
    pub win_probability: Option<Value>,
    #[serde(default)]
    pub win_message: Option<String>,
    #[serde(default)]
    pub legal_area: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub relevant_laws: Vec<CitationEntry>,
    #[serde(default)]
    pub precedent_cases: Vec<CitationEntry>,
    #[serde(default)]
    pub key_factors: Vec<Value>,
}

/// A law or precedent entry in either accepted shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CitationEntry {
    /// Bare citation string.
    Legacy(String),
    /// Citation with a plain-English description (laws) or summary (cases).
    Structured {
        #[serde(default)]
        citation: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        summary: Option<String>,
    },
}

impl CitationEntry {
    pub fn citation(&self) -> &str {
        match self {
            CitationEntry::Legacy(citation) => citation.trim(),
            CitationEntry::Structured { citation, .. } => citation.trim(),
        }
    }

    /// Description (laws) or summary (cases), whichever is present and non-blank.
    pub fn detail(&self) -> Option<&str> {
        match self {
            CitationEntry::Legacy(_) => None,
            CitationEntry::Structured {
                description,
                summary,
                ..
            } => [description, summary]
                .into_iter()
                .filter_map(|d| d.as_deref().map(str::trim))
                .find(|d| !d.is_empty()),
        }
    }

    /// `"{detail} ({citation})"` when a detail is present, else the bare citation.
    pub fn display_title(&self) -> String {
        match self.detail() {
            Some(detail) => format!("{} ({})", detail, self.citation()),
            None => self.citation().to_string(),
        }
    }
}

/// Locate the JSON object inside a completion.
///
/// Tries, in order: the trimmed text as-is, the body of the first code fence,
/// then the span from the first `{` to the last `}`.
pub fn recover_json(completion: &str) -> AnalysisResult<&str> {
    let trimmed = completion.trim();
    let candidate = fenced_body(trimmed).unwrap_or(trimmed);

    if candidate.starts_with('{') && candidate.ends_with('}') {
        return Ok(candidate);
    }

    match (candidate.find('{'), candidate.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&candidate[start..=end]),
        _ => Err(AnalysisError::Parse {
            message: format!(
                "No JSON object found in response. First 100 chars: '{}'",
                completion.chars().take(100).collect::<String>()
            ),
        }),
    }
}

fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];

    // Skip an optional language tag (```json) up to the end of the line.
    let body = if after.trim_start().starts_with('{') {
        after
    } else {
        match after.find('\n') {
            Some(newline) => &after[newline + 1..],
            None => return None,
        }
    };

    let end = body.find("```").unwrap_or(body.len());
    Some(body[..end].trim()).filter(|s| !s.is_empty())
}

/// Parse an analysis completion into its raw fields.
pub fn parse_analysis(completion: &str) -> AnalysisResult<RawAnalysis> {
    let json = recover_json(completion)?;
    serde_json::from_str(json).map_err(|e| AnalysisError::Parse {
        message: e.to_string(),
    })
}
