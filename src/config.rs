use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

use crate::game::progress::STARTING_HINTS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub game: GameConfig,
    pub leaderboard: LeaderboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Leaderboards are kept in memory when unset
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub puzzles_path: String,
    /// Where progress snapshots are written; `None` keeps them in memory
    pub progress_dir: Option<String>,
    pub starting_hints: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    pub max_entries: usize,
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
        };

        let server = ServerConfig {
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a number")?,
        };

        // An explicitly empty PROGRESS_DIR disables writing to disk
        let progress_dir = match env::var("PROGRESS_DIR") {
            Ok(dir) if dir.trim().is_empty() => None,
            Ok(dir) => Some(dir),
            Err(_) => Some("./progress".to_string()),
        };

        let game = GameConfig {
            puzzles_path: env::var("PUZZLES_PATH")
                .unwrap_or_else(|_| "./data/puzzles.json".to_string()),
            progress_dir,
            starting_hints: env::var("STARTING_HINTS")
                .unwrap_or_else(|_| STARTING_HINTS.to_string())
                .parse()
                .unwrap_or(STARTING_HINTS),
        };

        let leaderboard = LeaderboardConfig {
            max_entries: env::var("LEADERBOARD_MAX_ENTRIES")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("LEADERBOARD_MAX_ENTRIES must be a number")?,
            broadcast_capacity: env::var("LEADERBOARD_BROADCAST_CAPACITY")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .unwrap_or(64),
        };

        Ok(Config {
            database,
            server,
            game,
            leaderboard,
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database.url.as_deref()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
impl Config {
    /// In-memory everything, for handler tests
    pub fn for_tests() -> Self {
        Config {
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            game: GameConfig {
                puzzles_path: String::new(),
                progress_dir: None,
                starting_hints: STARTING_HINTS,
            },
            leaderboard: LeaderboardConfig {
                max_entries: 100,
                broadcast_capacity: 16,
            },
        }
    }
}
