use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    game::{
        catalog::WordCategory, grid::Cell, hint::ActiveHint, progress::FoundWord,
        validator::RejectReason,
    },
    models::{LeaderboardEntryView, PuzzleView},
    palette::{ColorScheme, ColorTag, Palette},
};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Fetch a puzzle's ranking and follow it
    RequestLeaderboard {
        puzzle_id: String,
    },
    UnsubscribeLeaderboard {
        puzzle_id: String,
    },
    SubmitScore {
        puzzle_id: String,
        username: String,
        time_seconds: u32,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        hints_used: u32,
    },
    SelectPuzzle {
        puzzle_id: String,
        #[serde(default)]
        color_scheme: ColorScheme,
    },
    Press {
        row: usize,
        col: usize,
    },
    Drag {
        row: usize,
        col: usize,
    },
    Release,
    PointerLeft,
    RequestHint,
    ResetTimer,
    ResetProgress,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        player_key: Uuid,
        /// The key is new; the client should store it
        issued: bool,
    },
    LeaderboardSnapshot {
        puzzle_id: String,
        entries: Vec<LeaderboardEntryView>,
    },
    ScoreAck {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        leaderboard: Option<Vec<LeaderboardEntryView>>,
    },
    PuzzleLoaded {
        puzzle: PuzzleView,
        palette: Palette,
        found_words: Vec<FoundWord>,
        cell_colors: Vec<Vec<Option<ColorTag>>>,
        found_count: usize,
        total_count: usize,
        hints_remaining: u32,
        hints_used: u32,
        elapsed_seconds: u64,
        completed: bool,
        active_hint: Option<ActiveHint>,
    },
    SelectionChanged {
        path: Vec<Cell>,
    },
    WordAccepted {
        word: String,
        path: Vec<Cell>,
        category: WordCategory,
        color: Option<ColorTag>,
        found_count: usize,
        total_count: usize,
    },
    WordRejected {
        word: String,
        reason: RejectReason,
        message: String,
    },
    HintRevealed {
        word: String,
        path: Option<Vec<Cell>>,
        hints_remaining: u32,
    },
    HintCleared,
    HintsChanged {
        hints_remaining: u32,
    },
    TimerTick {
        elapsed_seconds: u64,
    },
    PuzzleCompleted {
        elapsed_seconds: u64,
        hints_used: u32,
    },
    Error {
        message: String,
    },
}
