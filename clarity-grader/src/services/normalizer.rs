//! Result normalizer
//!
//! Total function from any loosely typed analysis (full, lite, super-lite,
//! ultra-lite or heuristic, as JSON) to a [`CanonicalReport`]. Fields are
//! defaulted one by one, so a wrong type in one field never discards the rest.
//!
//! Defaulting rules:
//! - `overallScore` → 0; `textClarityScore` → overall; structure/visual → text clarity
//! - `totalWords` → `totalWordsGuess` → 0; reading time derived from words
//! - `totalSentences` → max(1, words / 12); `totalParagraphs` → 1
//! - `averageSentenceLength` → max(1, words / sentences)
//! - `textClarityFeedback` → `textClarity` → `shortFeedback` → ""
//! - nested sections → neutral defaults; the flat full-tier fields
//!   (`fleschReadingEase`, `tone`, `passiveVoicePercentage`, image counts)
//!   fill the matching nested section when it is absent

use serde_json::{Map, Value};

use crate::models::{
    CanonicalReport, Headings, Integrity, JargonTerm, LayoutAndDesign, NonNativeReadability,
    PlainLanguagePrinciple, ReadabilityScores, Scannability, SentenceAnalysis, StructuralAnalysis,
    TextWall, VisualAnalysis, Vocabulary, VoiceAndTone,
};
use crate::services::heuristic::reading_time_label;

/// Build a canonical report from any analysis shape
pub fn normalize(analysis: &Value) -> CanonicalReport {
    let doc = Loose::new(analysis);

    let overall_score = doc.score("overallScore").unwrap_or(0);
    let text_clarity_score = doc.score("textClarityScore").unwrap_or(overall_score);
    let structure_clarity_score = doc
        .score("structureClarityScore")
        .unwrap_or(text_clarity_score);
    let visual_clarity_score = doc.score("visualClarityScore").unwrap_or(text_clarity_score);

    let total_words = doc
        .count("totalWords")
        .or_else(|| doc.count("totalWordsGuess"))
        .unwrap_or(0);
    let estimated_reading_time = doc
        .text("estimatedReadingTime")
        .unwrap_or_else(|| reading_time_label(u64::from(total_words)));

    let reported_sentences = doc.count("totalSentences").filter(|n| *n > 0);
    let total_sentences =
        reported_sentences.unwrap_or_else(|| (((total_words as f64) / 12.0).round() as u32).max(1));
    let average_sentence_length = doc
        .number("averageSentenceLength")
        .filter(|n| *n > 0.0)
        .unwrap_or_else(|| {
            ((total_words as f64) / f64::from(reported_sentences.unwrap_or(1)))
                .round()
                .max(1.0)
        });

    let text_clarity_feedback = doc
        .text("textClarityFeedback")
        .or_else(|| doc.text("textClarity"))
        .or_else(|| doc.text("shortFeedback"))
        .unwrap_or_default();

    CanonicalReport {
        overall_score,
        readability_grade_level: doc
            .text("readabilityGradeLevel")
            .unwrap_or_else(|| "N/A".to_string()),
        total_words,
        total_sentences,
        total_paragraphs: doc.count("totalParagraphs").filter(|n| *n > 0).unwrap_or(1),
        average_sentence_length,
        total_images: doc.count("totalImages").unwrap_or(0),
        total_headings: doc.count("totalHeadings").unwrap_or(0),
        total_lists: doc.count("totalLists").unwrap_or(0),
        estimated_reading_time,
        text_clarity_score,
        structure_clarity_score,
        visual_clarity_score,
        text_clarity_feedback,
        structure_clarity_feedback: doc.text("structureClarityFeedback").unwrap_or_default(),
        visual_clarity_feedback: doc.text("visualClarityFeedback").unwrap_or_default(),
        main_issues: doc.strings("mainIssues"),
        recommendations: doc.strings("recommendations"),
        non_native_readability: non_native_readability(doc.section("nonNativeReadability")),
        readability_scores: readability_scores(&doc),
        voice_and_tone: voice_and_tone(&doc),
        sentence_analysis: sentence_analysis(doc.section("sentenceAnalysis")),
        vocabulary: vocabulary(doc.section("vocabulary")),
        integrity: integrity(doc.section("integrity")),
        structural_analysis: structural_analysis(doc.section("structuralAnalysis")),
        scannability: scannability(doc.section("scannability")),
        visual_analysis: visual_analysis(&doc),
        layout_and_design: layout_and_design(doc.section("layoutAndDesign")),
        plain_language_principles: doc
            .list("plainLanguagePrinciples")
            .filter_map(|item| {
                let item = Loose::new(item);
                let name = item.text("name")?;
                Some(PlainLanguagePrinciple {
                    name,
                    is_met: item.flag("isMet").unwrap_or(false),
                    reasoning: item.text("reasoning").unwrap_or_default(),
                })
            })
            .collect(),
    }
}

fn non_native_readability(section: Option<Loose<'_>>) -> NonNativeReadability {
    let Some(s) = section else {
        return NonNativeReadability::default();
    };
    let defaults = NonNativeReadability::default();
    NonNativeReadability {
        score: s.score("score").unwrap_or(defaults.score),
        feedback: s.text("feedback").unwrap_or(defaults.feedback),
    }
}

fn readability_scores(doc: &Loose<'_>) -> ReadabilityScores {
    let section = doc.section("readabilityScores");
    let field = |key: &str| {
        section
            .as_ref()
            .and_then(|s| s.number(key))
            .or_else(|| doc.number(key))
            .unwrap_or(0.0)
    };
    ReadabilityScores {
        flesch_reading_ease: field("fleschReadingEase"),
        flesch_kincaid_grade: field("fleschKincaidGrade"),
        gunning_fog_index: field("gunningFogIndex"),
    }
}

fn voice_and_tone(doc: &Loose<'_>) -> VoiceAndTone {
    let section = doc.section("voiceAndTone");
    let number = |key: &str| {
        section
            .as_ref()
            .and_then(|s| s.number(key))
            .or_else(|| doc.number(key))
    };
    let passive = number("passiveVoicePercentage").map(clamp_percentage);
    let active = number("activeVoicePercentage")
        .map(clamp_percentage)
        .or_else(|| passive.map(|p| 100.0 - p));

    VoiceAndTone {
        passive_voice_percentage: passive.unwrap_or(0.0),
        active_voice_percentage: active.unwrap_or(0.0),
        tone: section
            .as_ref()
            .and_then(|s| s.text("tone"))
            .or_else(|| doc.text("tone"))
            .unwrap_or_else(|| "Unknown".to_string()),
        tone_confidence: number("toneConfidence").unwrap_or(0.0),
        tone_consistency: number("toneConsistency").unwrap_or(0.0),
        tone_consistency_feedback: section
            .as_ref()
            .and_then(|s| s.text("toneConsistencyFeedback"))
            .unwrap_or_default(),
    }
}

fn sentence_analysis(section: Option<Loose<'_>>) -> SentenceAnalysis {
    let Some(s) = section else {
        return SentenceAnalysis::default();
    };
    SentenceAnalysis {
        long_sentence_count: s.count("longSentenceCount").unwrap_or(0),
        complex_word_count: s.count("complexWordCount").unwrap_or(0),
    }
}

fn vocabulary(section: Option<Loose<'_>>) -> Vocabulary {
    let Some(s) = section else {
        return Vocabulary::default();
    };
    Vocabulary {
        jargon: s
            .list("jargon")
            .filter_map(|item| match item {
                Value::String(word) if !word.trim().is_empty() => Some(JargonTerm {
                    word: word.trim().to_string(),
                    suggestion: String::new(),
                }),
                Value::Object(_) => {
                    let item = Loose::new(item);
                    Some(JargonTerm {
                        word: item.text("word")?,
                        suggestion: item.text("suggestion").unwrap_or_default(),
                    })
                }
                _ => None,
            })
            .collect(),
        acronyms: s.strings("acronyms"),
        repetitive_words: s.strings("repetitiveWords"),
    }
}

fn integrity(section: Option<Loose<'_>>) -> Integrity {
    let Some(s) = section else {
        return Integrity::default();
    };
    Integrity {
        ai_generated_content_percentage: s
            .number("aiGeneratedContentPercentage")
            .map(clamp_percentage)
            .unwrap_or(0.0),
        plagiarism_percentage: s
            .number("plagiarismPercentage")
            .map(clamp_percentage)
            .unwrap_or(0.0),
        bias_and_inclusivity_warnings: s.strings("biasAndInclusivityWarnings"),
        internal_redundancy: s.strings("internalRedundancy"),
    }
}

fn structural_analysis(section: Option<Loose<'_>>) -> StructuralAnalysis {
    let Some(s) = section else {
        return StructuralAnalysis::default();
    };
    let headings = match s.section("headings") {
        Some(h) => Headings {
            h1: h.strings("h1"),
            h2: h.strings("h2"),
            h3: h.strings("h3"),
            h4: h.strings("h4"),
            h5: h.strings("h5"),
            h6: h.strings("h6"),
        },
        None => Headings::default(),
    };
    StructuralAnalysis {
        headings,
        heading_hierarchy_issues: s.strings("headingHierarchyIssues"),
        list_and_bullet_issues: s.strings("listAndBulletIssues"),
    }
}

fn scannability(section: Option<Loose<'_>>) -> Scannability {
    let Some(s) = section else {
        return Scannability::default();
    };
    Scannability {
        text_walls: s
            .list("textWalls")
            .filter_map(|item| {
                let item = Loose::new(item);
                Some(TextWall {
                    text: item.text("text")?,
                    summary: item.text("summary").unwrap_or_default(),
                })
            })
            .collect(),
        paragraph_length_score: s.score("paragraphLengthScore").unwrap_or(100),
        logical_flow_feedback: s.text("logicalFlowFeedback").unwrap_or_default(),
        heading_content_mismatch: s.strings("headingContentMismatch"),
    }
}

fn visual_analysis(doc: &Loose<'_>) -> VisualAnalysis {
    let section = doc.section("visualAnalysis");
    let count = |key: &str| {
        section
            .as_ref()
            .and_then(|s| s.count(key))
            .or_else(|| doc.count(key))
            .unwrap_or(0)
    };
    VisualAnalysis {
        images_with_alt_text: count("imagesWithAltText"),
        images_without_alt_text: count("imagesWithoutAltText"),
        ambiguous_icons: section
            .as_ref()
            .map(|s| s.strings("ambiguousIcons"))
            .unwrap_or_default(),
        ambiguous_link_text: section
            .as_ref()
            .map(|s| s.strings("ambiguousLinkText"))
            .unwrap_or_default(),
    }
}

fn layout_and_design(section: Option<Loose<'_>>) -> LayoutAndDesign {
    let Some(s) = section else {
        return LayoutAndDesign::default();
    };
    LayoutAndDesign {
        has_mobile_viewport: s.flag("hasMobileViewport").unwrap_or(true),
        viewport_tag_feedback: s.text("viewportTagFeedback").unwrap_or_default(),
    }
}

fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Read-only view over a JSON object that coerces instead of failing
#[derive(Clone, Copy)]
struct Loose<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Loose<'a> {
    fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.and_then(|f| f.get(key)).filter(|v| !v.is_null())
    }

    /// Finite number; numeric strings ("85") are accepted
    fn number(&self, key: &str) -> Option<f64> {
        let n = match self.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Rounded and clamped to [0, 100]
    fn score(&self, key: &str) -> Option<u8> {
        self.number(key).map(|n| n.round().clamp(0.0, 100.0) as u8)
    }

    /// Rounded non-negative count
    fn count(&self, key: &str) -> Option<u32> {
        self.number(key)
            .map(|n| n.round().clamp(0.0, f64::from(u32::MAX)) as u32)
    }

    /// Non-blank string
    fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn section(&self, key: &str) -> Option<Loose<'a>> {
        self.get(key).filter(|v| v.is_object()).map(Loose::new)
    }

    fn list(&self, key: &str) -> impl Iterator<Item = &'a Value> {
        self.get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }

    /// List of strings; object elements are reduced to their description text
    fn strings(&self, key: &str) -> Vec<String> {
        self.list(key).filter_map(loose_string).collect()
    }
}

fn loose_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.as_str(),
        Value::Object(fields) => ["description", "text", "issue", "recommendation", "word"]
            .iter()
            .find_map(|k| fields.get(*k).and_then(Value::as_str))?,
        _ => return None,
    };
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
