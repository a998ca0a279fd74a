//! Local heuristic clarity analysis
//!
//! Deterministic, dependency-free approximation used when the model cannot
//! answer in time. Total over its input: any string (including empty) yields
//! in-range scores and a non-empty feedback line.

use serde::Serialize;
use serde_json::{json, Value};

/// Baseline sentence length before the clarity penalty starts
const BASELINE_WORDS_PER_SENTENCE: f64 = 12.0;
/// Points lost per word above the baseline
const PENALTY_PER_EXTRA_WORD: f64 = 4.0;
/// Word count above which long pages are penalized
const LENGTH_PENALTY_THRESHOLD: usize = 2000;
const MAX_LENGTH_PENALTY: i64 = 40;
/// Average sentence length reported as "long"
const LONG_SENTENCE_AVERAGE: f64 = 20.0;
const WORDS_PER_MINUTE: f64 = 200.0;

/// Heuristic analysis result
///
/// Serializes with the same field names the model tiers use so the
/// normalizer treats it like any other loose analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicReport {
    pub overall_score: u8,
    pub text_clarity_score: u8,
    pub text_clarity_feedback: String,
    pub total_words: u32,
    pub total_sentences: u32,
    pub average_sentence_length: f64,
    pub estimated_reading_time: String,
}

impl HeuristicReport {
    /// Loose JSON form consumed by the normalizer
    pub fn to_value(&self) -> Value {
        json!({
            "overallScore": self.overall_score,
            "textClarityScore": self.text_clarity_score,
            "textClarityFeedback": self.text_clarity_feedback,
            "totalWords": self.total_words,
            "totalSentences": self.total_sentences,
            "averageSentenceLength": self.average_sentence_length,
            "estimatedReadingTime": self.estimated_reading_time,
        })
    }
}

/// Score raw text without any external call
pub fn analyze_text(text: &str) -> HeuristicReport {
    let trimmed = text.trim();
    let words = trimmed.split_whitespace().count();
    let sentences = count_sentence_terminators(trimmed).max(1);
    let avg_words_per_sentence = words as f64 / sentences as f64;

    let sentence_score = (100.0
        - (avg_words_per_sentence - BASELINE_WORDS_PER_SENTENCE) * PENALTY_PER_EXTRA_WORD)
        .round()
        .clamp(0.0, 100.0) as i64;

    let length_penalty = if words > LENGTH_PENALTY_THRESHOLD {
        (((words - LENGTH_PENALTY_THRESHOLD) as f64 / 100.0).round() as i64).min(MAX_LENGTH_PENALTY)
    } else {
        0
    };

    let text_clarity_score = (sentence_score - length_penalty).max(0);
    let overall_score = ((text_clarity_score as f64 * 0.8) + 10.0).round().max(0.0) as i64;

    let feedback = if words == 0 {
        "No text extracted to analyze.".to_string()
    } else if avg_words_per_sentence > LONG_SENTENCE_AVERAGE {
        format!(
            "Sentences are long (avg {:.1} words); consider splitting.",
            avg_words_per_sentence
        )
    } else {
        "Text length and sentence structure look reasonable.".to_string()
    };

    HeuristicReport {
        overall_score: clamp_score(overall_score),
        text_clarity_score: clamp_score(text_clarity_score),
        text_clarity_feedback: feedback,
        total_words: u32::try_from(words).unwrap_or(u32::MAX),
        total_sentences: u32::try_from(sentences).unwrap_or(u32::MAX),
        average_sentence_length: (avg_words_per_sentence * 10.0).round() / 10.0,
        estimated_reading_time: reading_time_label(words as u64),
    }
}

/// "N minute(s)" at 200 words per minute, never below one minute
pub fn reading_time_label(words: u64) -> String {
    let minutes = ((words as f64 / WORDS_PER_MINUTE).round() as u64).max(1);
    if minutes > 1 {
        format!("{} minutes", minutes)
    } else {
        "1 minute".to_string()
    }
}

/// Count runs of `.`, `!` and `?` ("Wait?!..." is one terminator)
fn count_sentence_terminators(text: &str) -> usize {
    let mut count = 0;
    let mut in_run = false;
    for c in text.chars() {
        let is_terminator = matches!(c, '.' | '!' | '?');
        if is_terminator && !in_run {
            count += 1;
        }
        in_run = is_terminator;
    }
    count
}

fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}
