//! Coarse case-stage classification and response labels.

use serde::{Deserialize, Serialize};

/// Conversation progress, recomputed on every call from history length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStage {
    GatheringInfo,
    Analyzing,
}

impl CaseStage {
    /// `Analyzing` once the number of prior exchanges exceeds `threshold`.
    pub fn from_history_len(prior_exchanges: usize, threshold: usize) -> Self {
        if prior_exchanges > threshold {
            CaseStage::Analyzing
        } else {
            CaseStage::GatheringInfo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStage::GatheringInfo => "gathering_info",
            CaseStage::Analyzing => "analyzing",
        }
    }
}

/// Assessment label reported to callers. `Pending` marks the scripted fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseAssessment {
    GatheringInfo,
    Analyzing,
    Pending,
}

impl From<CaseStage> for CaseAssessment {
    fn from(stage: CaseStage) -> Self {
        match stage {
            CaseStage::GatheringInfo => CaseAssessment::GatheringInfo,
            CaseStage::Analyzing => CaseAssessment::Analyzing,
        }
    }
}

/// Confidence label reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
}
