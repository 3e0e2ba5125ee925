//! Length-preserving profanity redaction
//!
//! Each dictionary word becomes a case-insensitive, word-boundary-anchored
//! pattern; every match is replaced by a run of `*` of the same length.
//! Because nothing is inserted or removed, redacted markup keeps its exact
//! layout and remains re-renderable.

use crate::Dictionary;
use regex::{Regex, RegexBuilder};
use tracing::warn;

const MASK: char = '*';

/// Compiled redaction patterns for one dictionary.
///
/// Patterns are applied sequentially in dictionary order, each pass over the
/// whole content. A later word can in principle touch text already masked by
/// an earlier one; mask characters are not word characters, so `\b`-anchored
/// letter patterns never match inside a masked run and the cascade is inert.
///
/// # Examples
///
/// ```
/// use profanity_capture::{Dictionary, Redactor};
///
/// let dict = Dictionary::from_contents("damn\n");
/// let redactor = Redactor::new(&dict);
/// assert_eq!(redactor.redact("This is DAMN annoying"), "This is **** annoying");
/// ```
pub struct Redactor {
    patterns: Vec<Regex>,
}

impl Redactor {
    /// Compile one word-boundary pattern per dictionary word.
    ///
    /// Words are escaped first so regex metacharacters in a dictionary entry
    /// match literally. A word whose pattern still fails to compile is
    /// skipped with a warning rather than failing construction.
    pub fn new(dictionary: &Dictionary) -> Self {
        let patterns = dictionary
            .words()
            .iter()
            .filter_map(|word| {
                let pattern = format!(r"\b{}\b", regex::escape(word));
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!("Skipping unredactable dictionary word {word:?}: {e}");
                        None
                    }
                }
            })
            .collect();

        Self { patterns }
    }

    /// Replace every whole-word match with a same-length mask run.
    pub fn redact(&self, content: &str) -> String {
        self.patterns
            .iter()
            .fold(content.to_string(), |acc, re| {
                re.replace_all(&acc, |caps: &regex::Captures<'_>| {
                    MASK.to_string().repeat(caps[0].chars().count())
                })
                .into_owned()
            })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
