use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Minimum number of letters a word needs to count
pub const MIN_WORD_LENGTH: usize = 4;

/// How an accepted word is classified
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WordCategory {
    Theme,
    Spangram,
    NonTheme,
}

impl WordCategory {
    /// Theme words and the spangram count toward completion; bonus words do not
    pub fn counts_toward_completion(self) -> bool {
        matches!(self, WordCategory::Theme | WordCategory::Spangram)
    }
}

/// The word lists of one puzzle.
///
/// All words are stored trimmed and uppercased. The lists are not required to
/// be disjoint; classification order is decided by the validator.
#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    theme_words: Vec<String>,
    spangram: Option<String>,
    non_theme_words: HashSet<String>,
}

fn normalize(word: &str) -> String {
    word.trim().to_uppercase()
}

impl WordCatalog {
    pub fn new<I, J>(theme_words: I, spangram: &str, non_theme_words: J) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let theme_words = theme_words
            .into_iter()
            .map(|w| normalize(w.as_ref()))
            .filter(|w| !w.is_empty() && seen.insert(w.clone()))
            .collect();

        let spangram = Some(normalize(spangram)).filter(|s| !s.is_empty());

        let non_theme_words = non_theme_words
            .into_iter()
            .map(|w| normalize(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();

        Self {
            theme_words,
            spangram,
            non_theme_words,
        }
    }

    /// Theme words in puzzle order, without duplicates
    pub fn theme_words(&self) -> &[String] {
        &self.theme_words
    }

    pub fn spangram(&self) -> Option<&str> {
        self.spangram.as_deref()
    }

    pub fn is_spangram(&self, word: &str) -> bool {
        self.spangram.as_deref() == Some(word)
    }

    pub fn is_theme_word(&self, word: &str) -> bool {
        self.theme_words.iter().any(|w| w == word)
    }

    pub fn is_non_theme_word(&self, word: &str) -> bool {
        self.non_theme_words.contains(word)
    }

    /// Words that must all be found to complete the puzzle:
    /// every theme word plus the spangram.
    pub fn required_words(&self) -> impl Iterator<Item = &str> {
        let spangram = self
            .spangram
            .as_deref()
            .filter(|s| !self.is_theme_word(s));

        self.theme_words
            .iter()
            .map(String::as_str)
            .chain(spangram)
    }

    pub fn required_count(&self) -> usize {
        self.required_words().count()
    }

    /// Every catalog word shorter than the minimum length
    pub fn short_words(&self) -> Vec<&str> {
        self.theme_words
            .iter()
            .chain(self.spangram.iter())
            .chain(self.non_theme_words.iter())
            .map(String::as_str)
            .filter(|w| w.chars().count() < MIN_WORD_LENGTH)
            .collect()
    }
}
