// Per-puzzle ranking service and its storage

pub mod service;
pub mod store;

pub use service::{LeaderboardError, LeaderboardService, LeaderboardSubscription, Ranking};
pub use store::{LeaderboardStore, MemoryLeaderboardStore, PgLeaderboardStore};
