use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single cell coordinate on the letter grid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check if two cells touch (including diagonals).
    /// A cell is never adjacent to itself.
    pub fn is_adjacent(self, other: Cell) -> bool {
        let row_diff = self.row.abs_diff(other.row);
        let col_diff = self.col.abs_diff(other.col);

        row_diff <= 1 && col_diff <= 1 && (row_diff + col_diff > 0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("grid has no letters")]
    Empty,
    #[error("row {row} has {found} letters, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("cell ({row}, {col}) must hold exactly one letter, got {value:?}")]
    InvalidLetter { row: usize, col: usize, value: String },
}

/// Immutable letter matrix for one puzzle.
///
/// Dimensions come from the puzzle data; nothing here assumes a fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterGrid {
    rows: usize,
    cols: usize,
    letters: Vec<char>,
}

impl LetterGrid {
    /// Build a grid from the puzzle's `letters` rows (one string per cell)
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, GridError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(GridError::Empty);
        }

        let mut letters = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Ragged {
                    row: r,
                    expected: cols,
                    found: row.len(),
                });
            }

            for (c, value) in row.iter().enumerate() {
                let value = value.as_ref().trim();
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) if letter.is_alphabetic() => {
                        letters.push(letter.to_ascii_uppercase());
                    }
                    _ => {
                        return Err(GridError::InvalidLetter {
                            row: r,
                            col: c,
                            value: value.to_string(),
                        })
                    }
                }
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            letters,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn letter_at(&self, row: usize, col: usize) -> Result<char, GridError> {
        if !self.contains(Cell::new(row, col)) {
            return Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.letters[row * self.cols + col])
    }

    pub fn is_adjacent(&self, a: Cell, b: Cell) -> bool {
        a.is_adjacent(b)
    }

    /// Letters as display rows, for the client view
    pub fn to_rows(&self) -> Vec<Vec<char>> {
        self.letters
            .chunks(self.cols)
            .map(|row| row.to_vec())
            .collect()
    }
}
