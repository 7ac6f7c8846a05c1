use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    game::{
        catalog::{WordCatalog, WordCategory},
        grid::{Cell, LetterGrid},
        progress::FoundWord,
        validator::WordValidator,
    },
    palette::ColorTag,
};

/// Reasons a stored snapshot cannot be restored
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot lists {words} words but {paths} paths and {colors} colors")]
    LengthMismatch {
        words: usize,
        paths: usize,
        colors: usize,
    },
    #[error("snapshot grid is {rows}x{cols}, puzzle grid is {expected_rows}x{expected_cols}")]
    GridShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
    #[error("snapshot path for {0} is not a valid path on this grid")]
    InvalidPath(String),
    #[error("snapshot cell ({}, {}) is outside the grid", .0.row, .0.col)]
    CellOutOfBounds(Cell),
    #[error("snapshot word {0} is not part of this puzzle")]
    UnknownWord(String),
}

/// Durable per-puzzle progress, in the camelCase shape stored on disk.
///
/// `foundWords`, `foundWordPositions`, `wordColors` and `wordCategories` are
/// parallel lists. The trailing fields were added later and default when
/// absent so older snapshots still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub found_words: Vec<String>,
    pub found_word_positions: Vec<Vec<Cell>>,
    pub word_colors: Vec<Option<ColorTag>>,
    pub cell_colors: Vec<Vec<Option<ColorTag>>>,
    pub found_cells: Vec<Cell>,
    #[serde(default)]
    pub word_categories: Vec<WordCategory>,
    #[serde(default)]
    pub hints_remaining: Option<u32>,
    #[serde(default)]
    pub hints_used: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub active_hint: Option<String>,
}

impl ProgressSnapshot {
    /// Parse and structurally check a stored snapshot against the puzzle grid
    pub fn parse(raw: &str, grid: &LetterGrid) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        snapshot.check(grid)?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Verify list lengths, grid shape and that every path and cell fits the grid
    pub fn check(&self, grid: &LetterGrid) -> Result<(), SnapshotError> {
        let words = self.found_words.len();
        let categories_ok = self.word_categories.is_empty() || self.word_categories.len() == words;
        if self.found_word_positions.len() != words || self.word_colors.len() != words || !categories_ok
        {
            return Err(SnapshotError::LengthMismatch {
                words,
                paths: self.found_word_positions.len(),
                colors: self.word_colors.len(),
            });
        }

        let rows = self.cell_colors.len();
        let cols = self.cell_colors.first().map(Vec::len).unwrap_or(0);
        let ragged = self.cell_colors.iter().any(|row| row.len() != cols);
        if rows != grid.rows() || cols != grid.cols() || ragged {
            return Err(SnapshotError::GridShape {
                rows,
                cols,
                expected_rows: grid.rows(),
                expected_cols: grid.cols(),
            });
        }

        for (word, path) in self.found_words.iter().zip(&self.found_word_positions) {
            if !WordValidator::is_valid_path(grid, path) {
                return Err(SnapshotError::InvalidPath(word.clone()));
            }
        }

        if let Some(cell) = self.found_cells.iter().find(|cell| !grid.contains(**cell)) {
            return Err(SnapshotError::CellOutOfBounds(*cell));
        }

        Ok(())
    }

    /// Rebuild the found words. Categories missing from older snapshots are
    /// looked up in the catalog; paths are trusted as stored.
    pub fn restore_found_words(&self, catalog: &WordCatalog) -> Result<Vec<FoundWord>, SnapshotError> {
        let mut seen = HashSet::new();
        let mut found = Vec::with_capacity(self.found_words.len());

        for (i, word) in self.found_words.iter().enumerate() {
            if !seen.insert(word.as_str()) {
                continue;
            }

            let category = match self.word_categories.get(i) {
                Some(category) => *category,
                None if catalog.is_spangram(word) => WordCategory::Spangram,
                None if catalog.is_theme_word(word) => WordCategory::Theme,
                None if catalog.is_non_theme_word(word) => WordCategory::NonTheme,
                None => return Err(SnapshotError::UnknownWord(word.clone())),
            };

            found.push(FoundWord {
                word: word.clone(),
                path: self.found_word_positions[i].clone(),
                category,
                color: self.word_colors[i],
            });
        }

        Ok(found)
    }
}
