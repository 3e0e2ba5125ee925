//! Profanity statistics over rendered page text
//!
//! Counting happens on the original, unredacted text: redaction rewrites the
//! markup afterwards, so masking never skews the numbers.

use crate::{Config, Dictionary};
use regex::{Regex, RegexBuilder};
use tracing::info;

/// Statistics for one page.
///
/// `profanity_makeup` is a percentage rounded to two decimal places. For a
/// page with zero words it is NaN — reported as such, never a division panic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfanityStats {
    pub word_count: usize,
    pub profanity_count: usize,
    pub profanity_makeup: f64,
}

impl ProfanityStats {
    fn from_counts(word_count: usize, profanity_count: usize) -> Self {
        let profanity_makeup = if word_count == 0 {
            f64::NAN
        } else {
            round2(profanity_count as f64 / word_count as f64 * 100.0)
        };

        Self {
            word_count,
            profanity_count,
            profanity_makeup,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Tokenize rendered text for counting: strip non-word characters, then
/// split on whitespace/newline runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Profanity counter bound to one dictionary.
///
/// Two counting policies exist. The canonical one, used for every reported
/// statistic, is whole-token membership: a token counts only when its
/// lowercase form is a dictionary word. The substring policy counts
/// case-insensitive occurrences of each dictionary word anywhere in the raw
/// text, which overcounts words embedded in longer ones; it is kept for the
/// verbose console report only.
pub struct ProfanityAnalyzer {
    dictionary: Dictionary,
    substring_patterns: Vec<Regex>,
}

impl ProfanityAnalyzer {
    pub fn new(dictionary: &Dictionary) -> Self {
        let substring_patterns = dictionary
            .words()
            .iter()
            .filter_map(|word| {
                RegexBuilder::new(&regex::escape(word))
                    .case_insensitive(true)
                    .build()
                    .ok()
            })
            .collect();

        Self {
            dictionary: dictionary.clone(),
            substring_patterns,
        }
    }

    /// Canonical statistics: whole-token membership over tokenized text.
    pub fn analyze(&self, text: &str) -> ProfanityStats {
        let tokens = tokenize(text);
        let word_count = tokens.len();
        let profanity_count = tokens
            .iter()
            .filter(|token| self.dictionary.contains(token))
            .count();

        ProfanityStats::from_counts(word_count, profanity_count)
    }

    /// Reporting variant: total substring matches of every dictionary word
    /// against the raw text.
    pub fn substring_count(&self, text: &str) -> usize {
        self.substring_patterns
            .iter()
            .map(|re| re.find_iter(text).count())
            .sum()
    }
}

/// Print the per-capture report between configured separator lines.
pub fn log_report(config: &Config, stats: &ProfanityStats) {
    info!("{}", config.log_separator);
    info!("Word Count: {}", stats.word_count);
    info!("Profanity Count: {}", stats.profanity_count);
    info!("Profanity Makeup: {}", stats.profanity_makeup);
    info!("{}", config.log_separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(words: &str) -> ProfanityAnalyzer {
        ProfanityAnalyzer::new(&Dictionary::from_contents(words))
    }

    #[test]
    fn tokenize_strips_punctuation_and_splits_on_whitespace() {
        assert_eq!(
            tokenize("Hello, world!\n  again."),
            vec!["Hello", "world", "again"]
        );
    }

    #[test]
    fn counts_whole_tokens_only() {
        let a = analyzer("hell\n");
        let stats = a.analyze("hello hell hellish");
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.profanity_count, 1);
    }

    #[test]
    fn makeup_rounds_to_two_decimals() {
        let a = analyzer("damn\n");
        let stats = a.analyze("damn foo bar");
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.profanity_count, 1);
        assert_eq!(stats.profanity_makeup, 33.33);
    }

    #[test]
    fn zero_words_reports_nan_without_panicking() {
        let a = analyzer("damn\n");
        let stats = a.analyze("   \n\t ");
        assert_eq!(stats.word_count, 0);
        assert!(stats.profanity_makeup.is_nan());
    }

    #[test]
    fn counting_ignores_case_and_punctuation() {
        let a = analyzer("damn\n");
        let stats = a.analyze("This is DAMN annoying");
        assert_eq!(stats.word_count, 4);
        assert_eq!(stats.profanity_count, 1);
        assert_eq!(stats.profanity_makeup, 25.0);
    }

    #[test]
    fn substring_policy_counts_embedded_occurrences() {
        let a = analyzer("hell\n");
        assert_eq!(a.substring_count("hello hell hellish"), 3);

        // ...which is exactly why it is not the canonical policy
        assert_eq!(a.analyze("hello hell hellish").profanity_count, 1);
    }
}
