//! Analysis outcome returned by every tier

use serde::{Deserialize, Serialize};

use super::{CanonicalReport, Tier};

/// Where a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Language model produced the report
    Model,
    /// Local heuristic produced the report
    Heuristic,
}

/// Report plus the message describing how it was produced
///
/// The message text is the user-facing signal: heuristic fallbacks always
/// say so and carry the original failure reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub tier: Tier,
    pub source: AnalysisSource,
    pub message: String,
    pub analysis: CanonicalReport,
}

impl AnalysisOutcome {
    pub fn is_fallback(&self) -> bool {
        self.source == AnalysisSource::Heuristic
    }
}
