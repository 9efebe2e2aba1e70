//! Match queries, results, and confidence tiers.

use serde::{Deserialize, Serialize};

use crate::config::constants::{
    HIGH_CONFIDENCE_THRESHOLD, LOW_CONFIDENCE_THRESHOLD, MEDIUM_CONFIDENCE_THRESHOLD,
};

/// A query string plus an optional domain-context tag.
///
/// The context tag (e.g. a declared cloud-provider or tactic context)
/// triggers domain weighting when it matches a candidate's tactic tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuery {
    /// Free-text attack-step description to match.
    pub text: String,
    /// Optional domain context tag for score weighting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl MatchQuery {
    /// Create an unweighted query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    /// Attach a domain-context tag.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Discrete confidence bucket derived from the adjusted score.
///
/// A pure function of the score against fixed thresholds; never stored
/// independently of the score that produced it. `None` only surfaces when
/// the caller lowers the similarity floor below the Low threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// Adjusted score above 0.7.
    High,
    /// Adjusted score in [0.5, 0.7].
    Medium,
    /// Adjusted score in [0.35, 0.5).
    Low,
    /// Adjusted score below 0.35.
    None,
}

impl ConfidenceTier {
    /// Derive the tier for an adjusted score.
    #[inline]
    pub fn from_score(score: f32) -> Self {
        if score > HIGH_CONFIDENCE_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_CONFIDENCE_THRESHOLD {
            Self::Medium
        } else if score >= LOW_CONFIDENCE_THRESHOLD {
            Self::Low
        } else {
            Self::None
        }
    }

    /// Lowercase label used in text output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked technique match for a query.
///
/// Produced fresh per matcher invocation; never persisted. Only technique
/// identifiers present in the loaded index can appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueMatch {
    /// Matched technique identifier.
    pub technique_id: String,
    /// Matched technique name.
    pub name: String,
    /// Raw cosine similarity in [-1, 1].
    pub similarity: f32,
    /// Similarity after domain weighting, clamped to 1.0.
    pub score: f32,
    /// Confidence tier derived from the adjusted score.
    pub confidence: ConfidenceTier,
    /// Position in the ranked result list (0 = best).
    pub rank: usize,
}
