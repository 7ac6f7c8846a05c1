use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    models::{LeaderboardEntryView, PuzzleSummary, PuzzleView},
    AppState,
};

/// List every hosted puzzle
pub async fn list_puzzles(State(state): State<Arc<AppState>>) -> Json<Vec<PuzzleSummary>> {
    Json(state.puzzles.summaries())
}

/// A puzzle's public view: letters and counts, no answers
pub async fn get_puzzle(
    State(state): State<Arc<AppState>>,
    Path(puzzle_id): Path<String>,
) -> Result<Json<PuzzleView>, StatusCode> {
    let puzzle = state.puzzles.get(&puzzle_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(puzzle.view()))
}

/// A puzzle's current ranking
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(puzzle_id): Path<String>,
) -> Result<Json<Vec<LeaderboardEntryView>>, StatusCode> {
    let ranking = state
        .leaderboard
        .get_leaderboard(&puzzle_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load leaderboard for puzzle {}: {}", puzzle_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(LeaderboardEntryView::ranked(&ranking)))
}
