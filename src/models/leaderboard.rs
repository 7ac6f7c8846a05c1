use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::game::timer::format_time;

/// One finished run on a puzzle's board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub username: String,
    /// Contact address; informational only, never shown to other players
    pub email: Option<String>,
    pub time_seconds: u32,
    pub hints_used: u32,
    pub completed_at: DateTime<Utc>,
}

/// Row shape of `leaderboard_entries`
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub username: String,
    pub email: Option<String>,
    pub time_seconds: i32,
    pub hints_used: i32,
    pub completed_at: DateTime<Utc>,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            username: row.username,
            email: row.email,
            time_seconds: u32::try_from(row.time_seconds).unwrap_or(0),
            hints_used: u32::try_from(row.hints_used).unwrap_or(0),
            completed_at: row.completed_at,
        }
    }
}

/// A ranked entry as sent to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntryView {
    pub rank: usize,
    pub username: String,
    pub time_seconds: u32,
    /// `m:ss`
    pub time_formatted: String,
    pub hints_used: u32,
    pub completed_at: DateTime<Utc>,
}

impl LeaderboardEntryView {
    /// Views for a ranking that is already in order
    pub fn ranked(entries: &[LeaderboardEntry]) -> Vec<Self> {
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| Self {
                rank: i + 1,
                username: entry.username.clone(),
                time_seconds: entry.time_seconds,
                time_formatted: format_time(u64::from(entry.time_seconds)),
                hints_used: entry.hints_used,
                completed_at: entry.completed_at,
            })
            .collect()
    }
}

/// A player's request to put a finished run on the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub puzzle_id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub time_seconds: u32,
    #[serde(default)]
    pub hints_used: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_are_ranked_and_hide_email() {
        let entry = LeaderboardEntry {
            username: "Alice".to_string(),
            email: Some("alice@example.com".to_string()),
            time_seconds: 125,
            hints_used: 1,
            completed_at: Utc::now(),
        };

        let views = LeaderboardEntryView::ranked(&[entry.clone(), entry]);
        assert_eq!(views[0].rank, 1);
        assert_eq!(views[1].rank, 2);
        assert_eq!(views[0].time_formatted, "2:05");

        let json = serde_json::to_string(&views).unwrap();
        assert!(!json.contains("alice@example.com"), "email leaked: {}", json);
    }

    #[test]
    fn test_negative_row_values_clamp_to_zero() {
        let row = LeaderboardRow {
            username: "Bob".to_string(),
            email: None,
            time_seconds: -5,
            hints_used: 2,
            completed_at: Utc::now(),
        };
        let entry = LeaderboardEntry::from(row);
        assert_eq!(entry.time_seconds, 0);
        assert_eq!(entry.hints_used, 2);
    }
}
