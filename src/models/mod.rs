pub mod leaderboard;
pub mod puzzle;

pub use leaderboard::{LeaderboardEntry, LeaderboardEntryView, LeaderboardRow, ScoreSubmission};
pub use puzzle::{PuzzleDefinition, PuzzleSummary, PuzzleView};
