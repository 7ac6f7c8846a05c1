use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::fs;

use crate::game::{
    catalog::WordCatalog,
    grid::{GridError, LetterGrid},
};
use crate::models::puzzle::{PuzzleDefinition, PuzzleSummary, PuzzleView};

#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("puzzle has no id")]
    MissingId,
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("puzzle has no theme words")]
    NoThemeWords,
    #[error("word {0} is too short")]
    ShortWord(String),
}

/// A loaded, checked puzzle
#[derive(Debug)]
pub struct Puzzle {
    pub id: String,
    pub theme: String,
    pub grid: LetterGrid,
    pub catalog: WordCatalog,
}

impl Puzzle {
    pub fn from_definition(def: PuzzleDefinition) -> Result<Self, PuzzleError> {
        if def.id.is_empty() {
            return Err(PuzzleError::MissingId);
        }

        let grid = LetterGrid::from_rows(&def.letters)?;
        let catalog = WordCatalog::new(&def.words, &def.spangram, &def.non_theme_words);

        if catalog.theme_words().is_empty() {
            return Err(PuzzleError::NoThemeWords);
        }
        if let Some(word) = catalog.short_words().first() {
            return Err(PuzzleError::ShortWord(word.to_string()));
        }

        Ok(Self {
            id: def.id,
            theme: def.theme.trim().to_string(),
            grid,
            catalog,
        })
    }

    pub fn summary(&self) -> PuzzleSummary {
        PuzzleSummary {
            id: self.id.clone(),
            theme: self.theme.clone(),
            rows: self.grid.rows(),
            cols: self.grid.cols(),
        }
    }

    pub fn view(&self) -> PuzzleView {
        PuzzleView {
            id: self.id.clone(),
            theme: self.theme.clone(),
            letters: self.grid.to_rows(),
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            theme_word_count: self.catalog.theme_words().len(),
            has_spangram: self.catalog.spangram().is_some(),
        }
    }
}

/// Every puzzle the server can host, keyed by id
#[derive(Debug, Default)]
pub struct PuzzleLibrary {
    puzzles: HashMap<String, Arc<Puzzle>>,
    order: Vec<String>,
}

impl PuzzleLibrary {
    /// Load puzzles from a JSON file holding an array of definitions.
    /// Definitions that fail to check are skipped with a warning.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read puzzles from {}", path.display()))?;
        let definitions: Vec<PuzzleDefinition> =
            serde_json::from_str(&content).context("Puzzles file is not a JSON array of puzzles")?;

        let library = Self::from_definitions(definitions);
        tracing::info!("Loaded {} puzzles from {}", library.len(), path.display());

        Ok(library)
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = PuzzleDefinition>) -> Self {
        let mut library = Self::empty();

        for def in definitions {
            let id = def.id.clone();
            match Puzzle::from_definition(def) {
                Ok(puzzle) => library.insert(puzzle),
                Err(e) => tracing::warn!("Skipping puzzle {:?}: {}", id, e),
            }
        }

        library
    }

    /// Create an empty library
    pub fn empty() -> Self {
        Self::default()
    }

    fn insert(&mut self, puzzle: Puzzle) {
        if self.puzzles.contains_key(&puzzle.id) {
            tracing::warn!("Duplicate puzzle id {}, keeping the first", puzzle.id);
            return;
        }
        self.order.push(puzzle.id.clone());
        self.puzzles.insert(puzzle.id.clone(), Arc::new(puzzle));
    }

    pub fn get(&self, id: &str) -> Option<Arc<Puzzle>> {
        self.puzzles.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.puzzles.contains_key(id)
    }

    /// Summaries in file order
    pub fn summaries(&self) -> Vec<PuzzleSummary> {
        self.order
            .iter()
            .filter_map(|id| self.puzzles.get(id))
            .map(|puzzle| puzzle.summary())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// LION and TIGER read across the first two rows, the bonus word LOIN
    /// across the third
    pub(crate) fn lion_tiger_definition() -> PuzzleDefinition {
        PuzzleDefinition {
            id: "1".to_string(),
            theme: "Big cats".to_string(),
            spangram: String::new(),
            words: vec!["LION".to_string(), "TIGER".to_string()],
            non_theme_words: vec!["LOIN".to_string()],
            letters: ["LIONX", "TIGER", "LOINX"]
                .iter()
                .map(|row| row.chars().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_valid_definition_loads() {
        let puzzle = Puzzle::from_definition(lion_tiger_definition()).unwrap();
        assert_eq!(puzzle.grid.rows(), 3);
        assert_eq!(puzzle.grid.cols(), 5);
        assert_eq!(puzzle.catalog.required_count(), 2);
    }

    #[test]
    fn test_view_hides_answers() {
        let puzzle = Puzzle::from_definition(lion_tiger_definition()).unwrap();
        let json = serde_json::to_string(&puzzle.view()).unwrap();

        assert!(!json.contains("TIGER"), "view leaked a theme word: {}", json);
        assert!(json.contains("\"theme_word_count\":2"));
    }

    #[test]
    fn test_invalid_definitions_are_skipped() {
        let mut ragged = lion_tiger_definition();
        ragged.id = "2".to_string();
        ragged.letters[1].pop();

        let mut short = lion_tiger_definition();
        short.id = "3".to_string();
        short.words.push("CAT".to_string());

        let duplicate = lion_tiger_definition();

        let library = PuzzleLibrary::from_definitions([
            lion_tiger_definition(),
            ragged,
            short,
            duplicate,
        ]);

        assert_eq!(library.len(), 1);
        assert!(library.contains("1"));
        assert!(library.get("2").is_none());
        assert!(matches!(
            Puzzle::from_definition({
                let mut d = lion_tiger_definition();
                d.words.push("CAT".to_string());
                d
            }),
            Err(PuzzleError::ShortWord(word)) if word == "CAT"
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("puzzles-{}.json", uuid::Uuid::new_v4()));
        let json = serde_json::to_string(&vec![lion_tiger_definition()]).unwrap();
        tokio::fs::write(&path, json).await.unwrap();

        let library = PuzzleLibrary::load(&path).await.unwrap();
        assert_eq!(library.summaries().len(), 1);
        assert_eq!(library.summaries()[0].theme, "Big cats");

        let _ = tokio::fs::remove_file(&path).await;
        assert!(PuzzleLibrary::load(&path).await.is_err());
    }
}
