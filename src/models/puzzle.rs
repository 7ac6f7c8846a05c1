use serde::{Deserialize, Deserializer, Serialize};

/// A puzzle as authored and stored in the puzzles file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleDefinition {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub theme: String,
    #[serde(default)]
    pub spangram: String,
    pub words: Vec<String>,
    #[serde(default)]
    pub non_theme_words: Vec<String>,
    pub letters: Vec<Vec<String>>,
}

/// Puzzle ids are numbers in older files and strings in newer ones
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s.trim().to_string(),
    })
}

/// Listing entry for the puzzle picker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleSummary {
    pub id: String,
    pub theme: String,
    pub rows: usize,
    pub cols: usize,
}

/// What a player is allowed to see of a puzzle: no answers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleView {
    pub id: String,
    pub theme: String,
    pub letters: Vec<Vec<char>>,
    pub rows: usize,
    pub cols: usize,
    pub theme_word_count: usize,
    pub has_spangram: bool,
}
