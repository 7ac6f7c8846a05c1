use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{catalog::WordCategory, grid::Cell};
use crate::palette::ColorTag;

/// Hints a player starts every puzzle with
pub const STARTING_HINTS: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoundWord {
    pub word: String,
    pub path: Vec<Cell>,
    pub category: WordCategory,
    /// Highlight color; bonus words are not drawn and carry none
    pub color: Option<ColorTag>,
}

/// Per-puzzle progress of one player session
#[derive(Debug, Clone)]
pub struct PuzzleProgress {
    found_words: Vec<FoundWord>,
    found_cells: HashSet<Cell>,
    pub hints_remaining: u32,
    pub hints_used: u32,
}

impl Default for PuzzleProgress {
    fn default() -> Self {
        Self::new(STARTING_HINTS)
    }
}

impl PuzzleProgress {
    pub fn new(starting_hints: u32) -> Self {
        Self {
            found_words: Vec::new(),
            found_cells: HashSet::new(),
            hints_remaining: starting_hints,
            hints_used: 0,
        }
    }

    pub fn found_words(&self) -> &[FoundWord] {
        &self.found_words
    }

    pub fn is_found(&self, word: &str) -> bool {
        self.found_words.iter().any(|f| f.word == word)
    }

    /// Cells covered by a found theme word or the spangram
    pub fn is_cell_found(&self, cell: Cell) -> bool {
        self.found_cells.contains(&cell)
    }

    pub fn found_cells(&self) -> &HashSet<Cell> {
        &self.found_cells
    }

    /// Record an accepted word. Only completion-counting words claim cells.
    pub fn record(&mut self, found: FoundWord) {
        if found.category.counts_toward_completion() {
            self.found_cells.extend(found.path.iter().copied());
        }
        self.found_words.push(found);
    }

    pub fn completion_count(&self) -> usize {
        self.found_words
            .iter()
            .filter(|f| f.category.counts_toward_completion())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(word: &str, category: WordCategory, path: Vec<Cell>) -> FoundWord {
        FoundWord {
            word: word.to_string(),
            path,
            category,
            color: None,
        }
    }

    #[test]
    fn test_new_progress_has_starting_hints() {
        let progress = PuzzleProgress::default();
        assert_eq!(progress.hints_remaining, STARTING_HINTS);
        assert_eq!(progress.hints_used, 0);
        assert!(progress.found_words().is_empty());
    }

    #[test]
    fn test_bonus_words_do_not_claim_cells() {
        let mut progress = PuzzleProgress::default();
        progress.record(found("RING", WordCategory::NonTheme, vec![Cell::new(0, 0)]));
        progress.record(found("LION", WordCategory::Theme, vec![Cell::new(1, 1)]));

        assert!(!progress.is_cell_found(Cell::new(0, 0)));
        assert!(progress.is_cell_found(Cell::new(1, 1)));
        assert!(progress.is_found("RING"));
        assert_eq!(progress.completion_count(), 1);
    }
}
