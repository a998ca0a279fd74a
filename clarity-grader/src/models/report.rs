//! Canonical clarity report
//!
//! The one shape every analysis path produces. Scores are integers in
//! [0, 100], text fields are always strings, and every list is always
//! present (possibly empty), so consumers never branch on a missing field.
//! Construct it through [`crate::services::normalizer`].

use serde::{Deserialize, Serialize};

/// Fully populated analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalReport {
    pub overall_score: u8,
    pub readability_grade_level: String,

    pub total_words: u32,
    pub total_sentences: u32,
    pub total_paragraphs: u32,
    pub average_sentence_length: f64,
    pub total_images: u32,
    pub total_headings: u32,
    pub total_lists: u32,
    pub estimated_reading_time: String,

    pub text_clarity_score: u8,
    pub structure_clarity_score: u8,
    pub visual_clarity_score: u8,
    pub text_clarity_feedback: String,
    pub structure_clarity_feedback: String,
    pub visual_clarity_feedback: String,

    pub main_issues: Vec<String>,
    pub recommendations: Vec<String>,

    pub non_native_readability: NonNativeReadability,
    pub readability_scores: ReadabilityScores,
    pub voice_and_tone: VoiceAndTone,
    pub sentence_analysis: SentenceAnalysis,
    pub vocabulary: Vocabulary,
    pub integrity: Integrity,
    pub structural_analysis: StructuralAnalysis,
    pub scannability: Scannability,
    pub visual_analysis: VisualAnalysis,
    pub layout_and_design: LayoutAndDesign,
    pub plain_language_principles: Vec<PlainLanguagePrinciple>,
}

impl Default for CanonicalReport {
    fn default() -> Self {
        Self {
            overall_score: 0,
            readability_grade_level: "N/A".to_string(),
            total_words: 0,
            total_sentences: 1,
            total_paragraphs: 1,
            average_sentence_length: 1.0,
            total_images: 0,
            total_headings: 0,
            total_lists: 0,
            estimated_reading_time: "1 minute".to_string(),
            text_clarity_score: 0,
            structure_clarity_score: 0,
            visual_clarity_score: 0,
            text_clarity_feedback: String::new(),
            structure_clarity_feedback: String::new(),
            visual_clarity_feedback: String::new(),
            main_issues: Vec::new(),
            recommendations: Vec::new(),
            non_native_readability: NonNativeReadability::default(),
            readability_scores: ReadabilityScores::default(),
            voice_and_tone: VoiceAndTone::default(),
            sentence_analysis: SentenceAnalysis::default(),
            vocabulary: Vocabulary::default(),
            integrity: Integrity::default(),
            structural_analysis: StructuralAnalysis::default(),
            scannability: Scannability::default(),
            visual_analysis: VisualAnalysis::default(),
            layout_and_design: LayoutAndDesign::default(),
            plain_language_principles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonNativeReadability {
    pub score: u8,
    pub feedback: String,
}

impl Default for NonNativeReadability {
    fn default() -> Self {
        Self {
            score: 50,
            feedback: "Not evaluated".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityScores {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub gunning_fog_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAndTone {
    pub passive_voice_percentage: f64,
    pub active_voice_percentage: f64,
    pub tone: String,
    pub tone_confidence: f64,
    pub tone_consistency: f64,
    pub tone_consistency_feedback: String,
}

impl Default for VoiceAndTone {
    fn default() -> Self {
        Self {
            passive_voice_percentage: 0.0,
            active_voice_percentage: 0.0,
            tone: "Unknown".to_string(),
            tone_confidence: 0.0,
            tone_consistency: 0.0,
            tone_consistency_feedback: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceAnalysis {
    pub long_sentence_count: u32,
    pub complex_word_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JargonTerm {
    pub word: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub jargon: Vec<JargonTerm>,
    pub acronyms: Vec<String>,
    pub repetitive_words: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrity {
    pub ai_generated_content_percentage: f64,
    pub plagiarism_percentage: f64,
    pub bias_and_inclusivity_warnings: Vec<String>,
    pub internal_redundancy: Vec<String>,
}

/// Heading texts by level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub h4: Vec<String>,
    pub h5: Vec<String>,
    pub h6: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralAnalysis {
    pub headings: Headings,
    pub heading_hierarchy_issues: Vec<String>,
    pub list_and_bullet_issues: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextWall {
    pub text: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scannability {
    pub text_walls: Vec<TextWall>,
    pub paragraph_length_score: u8,
    pub logical_flow_feedback: String,
    pub heading_content_mismatch: Vec<String>,
}

impl Default for Scannability {
    fn default() -> Self {
        Self {
            text_walls: Vec::new(),
            paragraph_length_score: 100,
            logical_flow_feedback: String::new(),
            heading_content_mismatch: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAnalysis {
    pub images_with_alt_text: u32,
    pub images_without_alt_text: u32,
    pub ambiguous_icons: Vec<String>,
    pub ambiguous_link_text: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAndDesign {
    pub has_mobile_viewport: bool,
    pub viewport_tag_feedback: String,
}

impl Default for LayoutAndDesign {
    fn default() -> Self {
        Self {
            has_mobile_viewport: true,
            viewport_tag_feedback: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainLanguagePrinciple {
    pub name: String,
    pub is_met: bool,
    pub reasoning: String,
}
