use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};

use super::{
    catalog::WordCatalog,
    grid::{Cell, LetterGrid},
    progress::PuzzleProgress,
};

/// Scan directions as (row step, col step), in tie-break order:
/// E, S, W, N, SE, SW, NE, NW
pub const DIRECTIONS: [(isize, isize); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// A hinted theme word and where it lies, if it lies on a straight line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHint {
    pub word: String,
    pub path: Option<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    /// No hints left in the budget
    NoHintsLeft,
    /// The previous hint has not been found yet
    Pending,
    /// A hint was spent but every theme word is already found
    Exhausted,
    Revealed(ActiveHint),
}

#[derive(Debug, Clone, Default)]
pub struct HintEngine {
    active: Option<ActiveHint>,
}

impl HintEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveHint> {
        self.active.as_ref()
    }

    /// Restore a hint that was showing when progress was saved
    pub fn restore(&mut self, grid: &LetterGrid, word: String) {
        let path = locate_word(grid, &word);
        self.active = Some(ActiveHint { word, path });
    }

    /// Spend a hint on a random unfound theme word
    pub fn request_hint(
        &mut self,
        grid: &LetterGrid,
        catalog: &WordCatalog,
        progress: &mut PuzzleProgress,
        rng: &mut impl Rng,
    ) -> HintOutcome {
        if progress.hints_remaining == 0 {
            return HintOutcome::NoHintsLeft;
        }

        if let Some(active) = &self.active {
            if !progress.is_found(&active.word) {
                return HintOutcome::Pending;
            }
        }

        progress.hints_remaining -= 1;
        progress.hints_used += 1;

        let unfound: Vec<&String> = catalog
            .theme_words()
            .iter()
            .filter(|word| !progress.is_found(word))
            .collect();

        let Some(word) = unfound.choose(rng) else {
            self.active = None;
            return HintOutcome::Exhausted;
        };

        let hint = ActiveHint {
            word: (*word).clone(),
            path: locate_word(grid, word),
        };
        tracing::debug!("Revealed hint for {} (path found: {})", hint.word, hint.path.is_some());

        self.active = Some(hint.clone());
        HintOutcome::Revealed(hint)
    }

    /// Clear the active hint if it is `word`. Returns true when cleared.
    pub fn clear_if(&mut self, word: &str) -> bool {
        if self.active.as_ref().is_some_and(|hint| hint.word == word) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
    }
}

/// Find `word` on the grid as a straight line.
///
/// Start cells are scanned in row-major order and directions in
/// [`DIRECTIONS`] order; the first match is returned, so repeated calls on
/// the same grid always give the same path.
pub fn locate_word(grid: &LetterGrid, word: &str) -> Option<Vec<Cell>> {
    let letters: Vec<char> = word.chars().collect();
    if letters.is_empty() {
        return None;
    }

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            for &(dr, dc) in &DIRECTIONS {
                if let Some(path) = walk(grid, Cell::new(row, col), (dr, dc), &letters) {
                    return Some(path);
                }
            }
        }
    }

    None
}

fn walk(grid: &LetterGrid, start: Cell, (dr, dc): (isize, isize), letters: &[char]) -> Option<Vec<Cell>> {
    let mut path = Vec::with_capacity(letters.len());

    for (i, &expected) in letters.iter().enumerate() {
        let step = i as isize;
        let row = start.row.checked_add_signed(dr * step)?;
        let col = start.col.checked_add_signed(dc * step)?;
        if grid.letter_at(row, col).ok()? != expected {
            return None;
        }
        path.push(Cell::new(row, col));
    }

    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{catalog::WordCategory, progress::FoundWord};
    use rand::{rngs::StdRng, SeedableRng};

    fn grid(rows: &[&str]) -> LetterGrid {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.chars().map(|c| c.to_string()).collect())
            .collect();
        LetterGrid::from_rows(&rows).unwrap()
    }

    fn mark_found(progress: &mut PuzzleProgress, word: &str) {
        progress.record(FoundWord {
            word: word.to_string(),
            path: Vec::new(),
            category: WordCategory::Theme,
            color: None,
        });
    }

    #[test]
    fn test_locate_word_is_deterministic_with_duplicates() {
        // CAT appears reading south from (0,0) and reading east from (2,1)
        let g = grid(&["CXXX", "AXXX", "TCAT"]);

        let first = locate_word(&g, "CAT");
        assert_eq!(
            first,
            Some(vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)])
        );
        for _ in 0..10 {
            assert_eq!(locate_word(&g, "CAT"), first);
        }
    }

    #[test]
    fn test_locate_word_prefers_direction_order_at_same_start() {
        // From (0,0) CAT reads both east and south; east comes first
        let g = grid(&["CAT", "AXX", "TXX"]);
        assert_eq!(
            locate_word(&g, "CAT"),
            Some(vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(0, 2)])
        );
    }

    #[test]
    fn test_locate_word_reads_backwards_and_diagonally() {
        let g = grid(&["TXX", "XAX", "XXC"]);
        assert_eq!(
            locate_word(&g, "CAT"),
            Some(vec![Cell::new(2, 2), Cell::new(1, 1), Cell::new(0, 0)])
        );
        assert_eq!(locate_word(&g, "DOG"), None);
    }

    #[test]
    fn test_hint_spends_budget_and_reveals() {
        let g = grid(&["LION", "XXXX"]);
        let catalog = WordCatalog::new(["LION"], "", Vec::<String>::new());
        let mut progress = PuzzleProgress::default();
        let mut engine = HintEngine::new();
        let mut rng = StdRng::seed_from_u64(7);

        let outcome = engine.request_hint(&g, &catalog, &mut progress, &mut rng);
        let HintOutcome::Revealed(hint) = outcome else {
            panic!("expected a revealed hint, got {:?}", outcome);
        };
        assert_eq!(hint.word, "LION");
        assert_eq!(hint.path.map(|p| p.len()), Some(4));
        assert_eq!(progress.hints_remaining, 1);
        assert_eq!(progress.hints_used, 1);
    }

    #[test]
    fn test_pending_hint_blocks_new_request() {
        let g = grid(&["LION", "BEAR"]);
        let catalog = WordCatalog::new(["LION", "BEAR"], "", Vec::<String>::new());
        let mut progress = PuzzleProgress::default();
        let mut engine = HintEngine::new();
        let mut rng = StdRng::seed_from_u64(1);

        engine.request_hint(&g, &catalog, &mut progress, &mut rng);
        let again = engine.request_hint(&g, &catalog, &mut progress, &mut rng);

        assert_eq!(again, HintOutcome::Pending);
        assert_eq!(progress.hints_remaining, 1, "pending request costs nothing");

        // Once the hinted word is found, a new hint may be requested
        let hinted = engine.active().unwrap().word.clone();
        mark_found(&mut progress, &hinted);
        let next = engine.request_hint(&g, &catalog, &mut progress, &mut rng);
        let HintOutcome::Revealed(hint) = next else {
            panic!("expected a revealed hint, got {:?}", next);
        };
        assert_ne!(hint.word, hinted);
    }

    #[test]
    fn test_no_hints_left() {
        let g = grid(&["LION"]);
        let catalog = WordCatalog::new(["LION"], "", Vec::<String>::new());
        let mut progress = PuzzleProgress::new(0);
        let mut engine = HintEngine::new();

        let outcome = engine.request_hint(&g, &catalog, &mut progress, &mut rand::rng());
        assert_eq!(outcome, HintOutcome::NoHintsLeft);
        assert_eq!(progress.hints_used, 0);
    }

    #[test]
    fn test_exhausted_when_all_theme_words_found() {
        let g = grid(&["LION"]);
        let catalog = WordCatalog::new(["LION"], "", Vec::<String>::new());
        let mut progress = PuzzleProgress::default();
        mark_found(&mut progress, "LION");
        let mut engine = HintEngine::new();

        let outcome = engine.request_hint(&g, &catalog, &mut progress, &mut rand::rng());
        assert_eq!(outcome, HintOutcome::Exhausted);
        assert!(engine.active().is_none());
        assert_eq!(progress.hints_remaining, 1);
    }

    #[test]
    fn test_clear_if_only_matches_active_word() {
        let g = grid(&["LION"]);
        let mut engine = HintEngine::new();
        engine.restore(&g, "LION".to_string());

        assert!(!engine.clear_if("BEAR"));
        assert!(engine.clear_if("LION"));
        assert!(engine.active().is_none());
    }
}
