use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;

use crate::{db::queries, models::LeaderboardEntry};

/// Durable storage of each puzzle's bounded ranking
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    async fn load(&self, puzzle_id: &str) -> Result<Vec<LeaderboardEntry>>;

    /// Replace everything stored for `puzzle_id` with `entries`
    async fn replace(
        &self,
        puzzle_id: &str,
        puzzle_theme: &str,
        entries: &[LeaderboardEntry],
    ) -> Result<()>;
}

pub struct PgLeaderboardStore {
    pool: PgPool,
}

impl PgLeaderboardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaderboardStore for PgLeaderboardStore {
    async fn load(&self, puzzle_id: &str) -> Result<Vec<LeaderboardEntry>> {
        queries::get_leaderboard(&self.pool, puzzle_id)
            .await
            .with_context(|| format!("Failed to load leaderboard for puzzle {}", puzzle_id))
    }

    async fn replace(
        &self,
        puzzle_id: &str,
        puzzle_theme: &str,
        entries: &[LeaderboardEntry],
    ) -> Result<()> {
        queries::replace_leaderboard(&self.pool, puzzle_id, puzzle_theme, entries)
            .await
            .with_context(|| format!("Failed to save leaderboard for puzzle {}", puzzle_id))
    }
}

/// Keeps rankings for the life of the process only
#[derive(Default)]
pub struct MemoryLeaderboardStore {
    boards: DashMap<String, Vec<LeaderboardEntry>>,
}

impl MemoryLeaderboardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaderboardStore for MemoryLeaderboardStore {
    async fn load(&self, puzzle_id: &str) -> Result<Vec<LeaderboardEntry>> {
        Ok(self
            .boards
            .get(puzzle_id)
            .map(|entries| entries.value().clone())
            .unwrap_or_default())
    }

    async fn replace(
        &self,
        puzzle_id: &str,
        _puzzle_theme: &str,
        entries: &[LeaderboardEntry],
    ) -> Result<()> {
        self.boards.insert(puzzle_id.to_string(), entries.to_vec());
        Ok(())
    }
}
