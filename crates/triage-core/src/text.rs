// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case folding and phrase matching shared by the classifier and the
//! retrieval strategy selector.

/// Lowercase `text` and replace every non-alphanumeric character with a
/// single space. Letters with diacritics count as alphanumeric.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Whitespace tokens of already-normalized text.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}

/// Normalized text padded with spaces, ready for whole-phrase lookups.
#[derive(Debug, Clone)]
pub struct PhraseIndex {
    padded: String,
    token_count: usize,
}

impl PhraseIndex {
    pub fn new(text: &str) -> Self {
        let normalized = normalize(text);
        let token_count = tokens(&normalized).count();
        Self {
            padded: format!(" {normalized} "),
            token_count,
        }
    }

    /// True when `phrase` occurs as a run of whole tokens.
    ///
    /// `phrase` must already be lowercase and space-separated.
    pub fn contains(&self, phrase: &str) -> bool {
        !phrase.is_empty() && self.padded.contains(&format!(" {phrase} "))
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn is_empty(&self) -> bool {
        self.token_count == 0
    }

    /// The normalized text without padding.
    pub fn as_str(&self) -> &str {
        self.padded.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_punctuation() {
        assert_eq!(normalize("  Bàn NHỎ, gọn!! "), "bàn nhỏ gọn");
        assert_eq!(normalize("F42"), "f42");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn phrase_matches_whole_tokens_only() {
        let index = PhraseIndex::new("Tôi muốn hủy đơn hàng #123");
        assert!(index.contains("đơn hàng"));
        assert!(index.contains("hủy đơn"));
        assert!(!index.contains("đơn hàn"));
        assert!(!index.contains("hàng 12"));
        assert_eq!(index.token_count(), 6);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        let index = PhraseIndex::new("   ");
        assert!(index.is_empty());
        assert!(!index.contains(""));
    }
}
