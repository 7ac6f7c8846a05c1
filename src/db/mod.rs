use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool, Result};

pub mod queries;

/// Connect to Postgres, where leaderboards are kept
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}
