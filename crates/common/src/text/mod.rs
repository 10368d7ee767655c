//! Text normalization for titles, venue names, keywords and affiliations
//!
//! Every text field passes through a [`Normalizer`] before it reaches a
//! similarity metric.

use crate::errors::{AppError, Result};
use regex_lite::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// Extra stop-words for conference names
pub const CONFERENCE_STOP_WORDS: &[&str] = &[
    "conference", "international", "workshop", "systems", "ieee", "symposium",
];

/// Extra stop-words for journal names
pub const JOURNAL_STOP_WORDS: &[&str] = &[
    "journal", "international", "research", "science", "review", "engineering",
];

/// Common English stop-words
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your",
    "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she",
    "her", "hers", "herself", "it", "its", "itself", "they", "them", "their",
    "theirs", "themselves", "what", "which", "who", "whom", "this", "that",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of",
    "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again",
    "further", "then", "once", "here", "there", "when", "where", "why", "how",
    "all", "any", "both", "each", "few", "more", "most", "other", "some",
    "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
    "very", "s", "t", "can", "will", "just", "don", "should", "now",
];

fn non_alpha() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[^a-z ]").expect("static pattern"))
}

/// Lowercases, strips everything outside `[a-z ]` and drops stop-words
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    stop_words: HashSet<String>,
}

impl Normalizer {
    /// Create a normalizer from an explicit stop-word list
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stop_words: stop_words.into_iter().map(Into::into).collect(),
        }
    }

    /// Normalizer using the built-in English list
    pub fn english() -> Self {
        Self::new(ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Load a newline-separated stop-word file; blank lines and `#` comments are ignored
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| AppError::MissingInput {
            path: path.to_path_buf(),
        })?;

        let words = content
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        Ok(Self::new(words))
    }

    /// Copy of this normalizer with additional stop-words
    pub fn with_extra(&self, extra: &[&str]) -> Self {
        let mut stop_words = self.stop_words.clone();
        stop_words.extend(extra.iter().map(|w| w.to_string()));
        Self { stop_words }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Normalize one text field
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let lowered = text.to_lowercase();
        let filtered = non_alpha().replace_all(&lowered, "");

        filtered
            .split_whitespace()
            .filter(|word| !self.is_stop_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
