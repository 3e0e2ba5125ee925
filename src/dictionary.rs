//! Prohibited-word dictionary, loaded once at startup
//!
//! The on-disk format is a plain newline-separated word list. The loaded
//! dictionary is immutable for the process lifetime and shared read-only by
//! every capture.

use crate::CaptureError;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Immutable set of prohibited words.
///
/// Keeps both the original ordered list (redaction passes apply words in file
/// order, which keeps test output deterministic) and a lowercase set for
/// whole-token membership checks.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: Vec<String>,
    lookup: HashSet<String>,
}

impl Dictionary {
    /// Load the dictionary from `path`.
    ///
    /// Normalizes `\r\n` line endings, splits on newlines, and drops blank
    /// lines (the file usually ends with a trailing newline). Fails with
    /// [`CaptureError::DictionaryUnavailable`] if the file cannot be read —
    /// the service cannot redact correctly without it, so callers should
    /// treat this as fatal at startup.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            CaptureError::DictionaryUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let dictionary = Self::from_contents(&raw);
        info!(
            "Loaded {} dictionary words from {}",
            dictionary.len(),
            path.display()
        );
        Ok(dictionary)
    }

    /// Build a dictionary from raw file contents. Split out so tests can
    /// construct one without touching the filesystem.
    pub fn from_contents(raw: &str) -> Self {
        let words: Vec<String> = raw
            .replace("\r\n", "\n")
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let lookup = words.iter().map(|w| w.to_lowercase()).collect();

        Self { words, lookup }
    }

    /// Words in file order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Whole-token membership test, case-insensitive.
    pub fn contains(&self, token: &str) -> bool {
        self.lookup.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_normalizes_line_endings() {
        let dict = Dictionary::from_contents("damn\r\nheck\ncrud\n");
        assert_eq!(dict.words(), &["damn", "heck", "crud"]);
    }

    #[test]
    fn drops_blank_lines() {
        let dict = Dictionary::from_contents("damn\n\nheck\n");
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn membership_is_case_insensitive() {
        let dict = Dictionary::from_contents("damn\n");
        assert!(dict.contains("DAMN"));
        assert!(dict.contains("Damn"));
        assert!(!dict.contains("damnation"));
    }

    #[test]
    fn preserves_file_order() {
        let dict = Dictionary::from_contents("zeta\nalpha\nmid\n");
        assert_eq!(dict.words(), &["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn load_missing_file_is_dictionary_unavailable() {
        let err = Dictionary::load("/nonexistent/bad-words").await.unwrap_err();
        assert!(matches!(err, CaptureError::DictionaryUnavailable(_)));
    }
}
