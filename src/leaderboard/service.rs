use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};

use super::store::LeaderboardStore;
use crate::{
    models::{LeaderboardEntry, ScoreSubmission},
    puzzles::PuzzleLibrary,
};

/// Longest username a board accepts, in characters
pub const MAX_USERNAME_CHARS: usize = 32;

pub type Ranking = Arc<Vec<LeaderboardEntry>>;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Username must be 1-32 characters")]
    InvalidUsername,
    #[error("Puzzle {0} not found")]
    PuzzleNotFound(String),
    #[error("Username {0} is already on this leaderboard")]
    UsernameTaken(String),
    #[error("Leaderboard storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Sort fastest first; equal times rank by who finished first
pub fn rank(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        a.time_seconds
            .cmp(&b.time_seconds)
            .then(a.completed_at.cmp(&b.completed_at))
    });
}

/// Live state of one puzzle's board
struct PuzzleBoard {
    /// Held for the whole read-rank-persist-publish sequence of a submission
    write_gate: Mutex<()>,
    /// Published ranking; `None` until first loaded from the store
    ranking: RwLock<Option<Ranking>>,
    updates: broadcast::Sender<Ranking>,
}

impl PuzzleBoard {
    fn new(capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity.max(1));
        Self {
            write_gate: Mutex::new(()),
            ranking: RwLock::new(None),
            updates,
        }
    }
}

/// Receives every new ranking of one puzzle until dropped
#[derive(Debug)]
pub struct LeaderboardSubscription {
    puzzle_id: String,
    receiver: broadcast::Receiver<Ranking>,
}

impl LeaderboardSubscription {
    pub fn puzzle_id(&self) -> &str {
        &self.puzzle_id
    }

    /// Wait for the next ranking. Rankings missed while lagging are skipped,
    /// since each one supersedes the last.
    pub async fn next(&mut self) -> Option<Ranking> {
        loop {
            match self.receiver.recv().await {
                Ok(ranking) => return Some(ranking),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        "Subscriber to puzzle {} skipped {} rankings",
                        self.puzzle_id,
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stop following the ranking. Dropping the subscription does the same.
    pub fn unsubscribe(self) {}
}

/// Ranks finished runs per puzzle and fans new rankings out to subscribers.
///
/// Submissions to the same puzzle run one at a time; different puzzles do
/// not wait on each other. Readers always see a complete ranking.
pub struct LeaderboardService {
    store: Arc<dyn LeaderboardStore>,
    puzzles: Arc<PuzzleLibrary>,
    boards: DashMap<String, Arc<PuzzleBoard>>,
    max_entries: usize,
    broadcast_capacity: usize,
}

impl LeaderboardService {
    pub fn new(
        store: Arc<dyn LeaderboardStore>,
        puzzles: Arc<PuzzleLibrary>,
        max_entries: usize,
        broadcast_capacity: usize,
    ) -> Self {
        Self {
            store,
            puzzles,
            boards: DashMap::new(),
            max_entries,
            broadcast_capacity,
        }
    }

    fn board(&self, puzzle_id: &str) -> Arc<PuzzleBoard> {
        self.boards
            .entry(puzzle_id.to_string())
            .or_insert_with(|| Arc::new(PuzzleBoard::new(self.broadcast_capacity)))
            .clone()
    }

    async fn current(&self, puzzle_id: &str, board: &PuzzleBoard) -> Result<Ranking, LeaderboardError> {
        if let Some(ranking) = board.ranking.read().await.as_ref() {
            return Ok(ranking.clone());
        }

        let mut slot = board.ranking.write().await;
        if let Some(ranking) = slot.as_ref() {
            return Ok(ranking.clone());
        }

        let mut entries = self.store.load(puzzle_id).await?;
        rank(&mut entries);
        entries.truncate(self.max_entries);
        tracing::debug!("Loaded {} leaderboard entries for puzzle {}", entries.len(), puzzle_id);

        let ranking = Arc::new(entries);
        *slot = Some(ranking.clone());
        Ok(ranking)
    }

    /// Current ranking of a puzzle, fastest first. Unknown puzzles have an
    /// empty board.
    pub async fn get_leaderboard(&self, puzzle_id: &str) -> Result<Ranking, LeaderboardError> {
        if !self.puzzles.contains(puzzle_id) {
            return Ok(Arc::new(Vec::new()));
        }

        let board = self.board(puzzle_id);
        self.current(puzzle_id, &board).await
    }

    /// Add a finished run, completed now
    pub async fn submit_score(&self, submission: ScoreSubmission) -> Result<Ranking, LeaderboardError> {
        self.submit_score_at(submission, Utc::now()).await
    }

    pub(crate) async fn submit_score_at(
        &self,
        submission: ScoreSubmission,
        completed_at: DateTime<Utc>,
    ) -> Result<Ranking, LeaderboardError> {
        let username = submission.username.trim();
        let username_chars = username.chars().count();
        if username_chars == 0 || username_chars > MAX_USERNAME_CHARS {
            return Err(LeaderboardError::InvalidUsername);
        }

        let puzzle = self
            .puzzles
            .get(&submission.puzzle_id)
            .ok_or_else(|| LeaderboardError::PuzzleNotFound(submission.puzzle_id.clone()))?;

        let board = self.board(&puzzle.id);
        let _gate = board.write_gate.lock().await;

        let current = self.current(&puzzle.id, &board).await?;
        if current.iter().any(|entry| entry.username == username) {
            return Err(LeaderboardError::UsernameTaken(username.to_string()));
        }

        let email = submission
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string);

        let mut next = current.as_ref().clone();
        next.push(LeaderboardEntry {
            username: username.to_string(),
            email,
            time_seconds: submission.time_seconds,
            hints_used: submission.hints_used,
            completed_at,
        });
        rank(&mut next);
        next.truncate(self.max_entries);

        // The published ranking only changes once the store has it
        self.store.replace(&puzzle.id, &puzzle.theme, &next).await?;

        let next = Arc::new(next);
        *board.ranking.write().await = Some(next.clone());

        let receivers = board.updates.send(next.clone()).unwrap_or(0);
        tracing::info!(
            "{} finished puzzle {} in {}s; broadcast to {} subscribers",
            username,
            puzzle.id,
            submission.time_seconds,
            receivers
        );

        Ok(next)
    }

    /// Follow a puzzle's ranking as it changes
    pub fn subscribe(&self, puzzle_id: &str) -> Result<LeaderboardSubscription, LeaderboardError> {
        if !self.puzzles.contains(puzzle_id) {
            return Err(LeaderboardError::PuzzleNotFound(puzzle_id.to_string()));
        }

        Ok(LeaderboardSubscription {
            puzzle_id: puzzle_id.to_string(),
            receiver: self.board(puzzle_id).updates.subscribe(),
        })
    }
}
