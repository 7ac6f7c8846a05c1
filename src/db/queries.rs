use sqlx::{PgPool, Result};

use crate::models::{LeaderboardEntry, LeaderboardRow};

// Leaderboard queries

/// Fetch a puzzle's stored entries, fastest first
pub async fn get_leaderboard(pool: &PgPool, puzzle_id: &str) -> Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT username, email, time_seconds, hints_used, completed_at
        FROM leaderboard_entries
        WHERE puzzle_id = $1
        ORDER BY time_seconds ASC, completed_at ASC
        "#,
    )
    .bind(puzzle_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
}

/// Replace a puzzle's stored entries with `entries`.
///
/// Runs in one transaction so readers never see a half-written board.
pub async fn replace_leaderboard(
    pool: &PgPool,
    puzzle_id: &str,
    puzzle_theme: &str,
    entries: &[LeaderboardEntry],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM leaderboard_entries WHERE puzzle_id = $1")
        .bind(puzzle_id)
        .execute(&mut *tx)
        .await?;

    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO leaderboard_entries
                (puzzle_id, puzzle_theme, username, email, time_seconds, hints_used, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(puzzle_id)
        .bind(puzzle_theme)
        .bind(&entry.username)
        .bind(entry.email.as_deref())
        .bind(i32::try_from(entry.time_seconds).unwrap_or(i32::MAX))
        .bind(i32::try_from(entry.hints_used).unwrap_or(i32::MAX))
        .bind(entry.completed_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
