pub mod health;
pub mod puzzles;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/puzzles", get(puzzles::list_puzzles))
        .route("/puzzles/{puzzle_id}", get(puzzles::get_puzzle))
        .route("/puzzles/{puzzle_id}/leaderboard", get(puzzles::get_leaderboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::ScoreSubmission,
        puzzles::{tests::lion_tiger_definition, PuzzleLibrary},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let puzzles = Arc::new(PuzzleLibrary::from_definitions([lion_tiger_definition()]));
        let state = AppState::in_memory(Config::for_tests(), puzzles);
        (create_routes().with_state(state.clone()), state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_and_view_puzzles() {
        let (app, _) = app();

        let (status, body) = get_json(app.clone(), "/api/puzzles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "1");
        assert_eq!(body[0]["rows"], 3);

        let (status, body) = get_json(app.clone(), "/api/puzzles/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["theme"], "Big cats");
        assert_eq!(body["letters"][1][4], "R");
        assert!(body.get("words").is_none(), "answers must not be exposed");

        let (status, _) = get_json(app, "/api/puzzles/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_leaderboard_route() {
        let (app, state) = app();
        state
            .leaderboard
            .submit_score(ScoreSubmission {
                puzzle_id: "1".to_string(),
                username: "Alice".to_string(),
                email: Some("alice@example.com".to_string()),
                time_seconds: 42,
                hints_used: 0,
            })
            .await
            .unwrap();

        let (status, body) = get_json(app.clone(), "/api/puzzles/1/leaderboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["rank"], 1);
        assert_eq!(body[0]["username"], "Alice");
        assert!(body[0].get("email").is_none());

        let (status, body) = get_json(app, "/api/puzzles/404/leaderboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(Vec::new()));
    }
}
