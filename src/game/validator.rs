use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    catalog::{WordCatalog, WordCategory, MIN_WORD_LENGTH},
    grid::{Cell, LetterGrid},
    progress::PuzzleProgress,
};

/// Why a candidate word was not accepted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooShort,
    AlreadyFound,
    NotInList,
}

impl RejectReason {
    /// Short status line shown to the player
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::TooShort => "Too short!",
            RejectReason::AlreadyFound => "Word already found!",
            RejectReason::NotInList => "Not in word list",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted { word: String, category: WordCategory },
    Rejected { word: String, reason: RejectReason },
}

pub struct WordValidator;

impl WordValidator {
    /// Classify the word spelled by `path` against the catalog and the words
    /// already found. Does not mutate anything.
    ///
    /// The spangram check comes before the theme check, so a word that is
    /// both is classified as the spangram.
    pub fn validate(
        grid: &LetterGrid,
        catalog: &WordCatalog,
        progress: &PuzzleProgress,
        path: &[Cell],
    ) -> Verdict {
        let word = Self::extract_word(grid, path);
        let too_short = word.chars().count() < MIN_WORD_LENGTH;
        let already_found = progress.is_found(&word);

        let category = if catalog.is_spangram(&word) {
            Some(WordCategory::Spangram)
        } else if catalog.is_theme_word(&word) {
            Some(WordCategory::Theme)
        } else if catalog.is_non_theme_word(&word) {
            Some(WordCategory::NonTheme)
        } else {
            None
        };

        if already_found {
            return Verdict::Rejected {
                word,
                reason: RejectReason::AlreadyFound,
            };
        }

        match category {
            // Bonus words are accepted whatever their length
            Some(WordCategory::NonTheme) => Verdict::Accepted {
                word,
                category: WordCategory::NonTheme,
            },
            Some(category) if !too_short => Verdict::Accepted { word, category },
            _ if too_short => Verdict::Rejected {
                word,
                reason: RejectReason::TooShort,
            },
            _ => Verdict::Rejected {
                word,
                reason: RejectReason::NotInList,
            },
        }
    }

    /// Validate that positions form a well-formed path on the grid
    pub fn is_valid_path(grid: &LetterGrid, positions: &[Cell]) -> bool {
        if positions.is_empty() {
            return false;
        }

        // Check that each position is adjacent to the previous one
        for window in positions.windows(2) {
            if !grid.is_adjacent(window[0], window[1]) {
                return false;
            }
        }

        // Check that no position is used twice
        let unique_positions: HashSet<_> = positions.iter().collect();
        if unique_positions.len() != positions.len() {
            return false;
        }

        positions.iter().all(|pos| grid.contains(*pos))
    }

    /// Extract the uppercase word from grid positions. Cells off the grid
    /// contribute nothing.
    pub fn extract_word(grid: &LetterGrid, positions: &[Cell]) -> String {
        positions
            .iter()
            .filter_map(|pos| grid.letter_at(pos.row, pos.col).ok())
            .collect::<String>()
            .to_uppercase()
    }
}
