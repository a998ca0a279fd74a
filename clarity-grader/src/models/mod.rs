//! Data models for the clarity grader
//!
//! - Analysis job state machine
//! - Canonical report shape
//! - Tier selection
//! - Fetched page content

pub mod analysis;
pub mod job;
pub mod report;
pub mod scrape;
pub mod tier;

pub use analysis::{AnalysisOutcome, AnalysisSource};
pub use job::{AnalysisJob, InvalidTransition, JobStatus, StateTransition};
pub use report::{
    CanonicalReport, Headings, Integrity, JargonTerm, LayoutAndDesign, NonNativeReadability,
    PlainLanguagePrinciple, ReadabilityScores, Scannability, SentenceAnalysis, StructuralAnalysis,
    TextWall, VisualAnalysis, Vocabulary, VoiceAndTone,
};
pub use scrape::ScrapeResult;
pub use tier::{Tier, TierFlags};
