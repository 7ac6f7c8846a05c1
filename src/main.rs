mod config;
mod db;
mod game;
mod leaderboard;
mod models;
mod palette;
mod player;
mod progress;
mod puzzles;
mod routes;
mod websocket;

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use config::Config;
use leaderboard::{LeaderboardService, LeaderboardStore, MemoryLeaderboardStore, PgLeaderboardStore};
use progress::{FileProgressStore, MemoryProgressStore, ProgressStore};
use puzzles::PuzzleLibrary;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub puzzles: Arc<PuzzleLibrary>,
    pub leaderboard: LeaderboardService,
    pub progress: Arc<dyn ProgressStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        puzzles: Arc<PuzzleLibrary>,
        leaderboard_store: Arc<dyn LeaderboardStore>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        let leaderboard = LeaderboardService::new(
            leaderboard_store,
            puzzles.clone(),
            config.leaderboard.max_entries,
            config.leaderboard.broadcast_capacity,
        );

        Self {
            config,
            puzzles,
            leaderboard,
            progress,
        }
    }

    /// State with nothing written outside the process
    #[cfg(test)]
    pub fn in_memory(config: Config, puzzles: Arc<PuzzleLibrary>) -> Arc<Self> {
        Arc::new(Self::new(
            config,
            puzzles,
            Arc::new(MemoryLeaderboardStore::new()),
            Arc::new(MemoryProgressStore::new()),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spangram_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting spangram server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Connect to database, or keep leaderboards in memory
    let leaderboard_store: Arc<dyn LeaderboardStore> = match config.database_url() {
        Some(url) => {
            let db = db::create_pool(url, config.database.max_connections).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations").run(&db).await?;
            tracing::info!("Database migrations completed");

            Arc::new(PgLeaderboardStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; leaderboards will not survive a restart");
            Arc::new(MemoryLeaderboardStore::new())
        }
    };

    // Load puzzles
    let puzzles = match PuzzleLibrary::load(&config.game.puzzles_path).await {
        Ok(library) => library,
        Err(e) => {
            tracing::warn!("Failed to load puzzles: {:#}. Starting with no puzzles.", e);
            tracing::warn!(
                "Put a puzzles file at {} for full functionality",
                config.game.puzzles_path
            );
            PuzzleLibrary::empty()
        }
    };
    if puzzles.is_empty() {
        tracing::warn!("No playable puzzles loaded");
    }

    let progress: Arc<dyn ProgressStore> = match &config.game.progress_dir {
        Some(dir) => {
            let store = FileProgressStore::new(dir);
            tracing::info!("Saving progress under {}", store.root().display());
            Arc::new(store)
        }
        None => {
            tracing::warn!("PROGRESS_DIR is empty; progress is kept in memory only");
            Arc::new(MemoryProgressStore::new())
        }
    };

    // Create application state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(puzzles),
        leaderboard_store,
        progress,
    ));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // WebSocket endpoint
        .route("/ws", get(websocket::handle_websocket))
        // API routes
        .merge(routes::create_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
