//! Basic text statistics framework

use serde_json::{json, Value};

use super::Framework;

/// Words per minute used for the reading-time estimate
const READING_WPM: f64 = 200.0;

/// Counts words, sentences and paragraphs
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStatistics;

impl TextStatistics {
    pub const NAME: &'static str = "text-stats";
}

impl Framework for TextStatistics {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(&self, content: &str) -> anyhow::Result<Value> {
        let words = content.split_whitespace().count();
        let sentences = content
            .split(&['.', '!', '?'][..])
            .filter(|s| !s.trim().is_empty())
            .count();
        let paragraphs = content
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();

        let avg_sentence_words = if sentences > 0 {
            crate::round_to(words as f64 / sentences as f64, 2)
        } else {
            0.0
        };

        Ok(json!({
            "characters": content.chars().count(),
            "words": words,
            "sentences": sentences,
            "paragraphs": paragraphs,
            "avg_words_per_sentence": avg_sentence_words,
            "reading_time_minutes": crate::round_to(words as f64 / READING_WPM, 2),
        }))
    }
}
