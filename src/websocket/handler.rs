use crate::{
    game::{grid::Cell, GameSession, SessionEvent},
    leaderboard::{LeaderboardError, LeaderboardSubscription},
    models::{LeaderboardEntryView, ScoreSubmission},
    palette::{palette_for, ColorScheme},
    player::PlayerKey,
    progress::{load_snapshot, save_snapshot, ProgressKey},
    websocket::messages::{ClientMessage, ServerMessage},
    AppState,
};
use anyhow::anyhow;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{Stream, StreamExt},
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

/// How often a running timer is reported to the client
pub const TIMER_TICK: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler
pub async fn handle_websocket(
    player: PlayerKey,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket upgrade for player {} (new: {})", player.key, player.issued);
    ws.on_upgrade(move |socket| handle_socket(socket, state, player))
}

/// Per-connection state, owned by the receive task
struct Connection {
    player: Uuid,
    session: Option<GameSession>,
    /// Forwarding tasks for followed leaderboards, by puzzle id
    subscriptions: HashMap<String, JoinHandle<()>>,
}

impl Connection {
    fn new(player: Uuid) -> Self {
        Self {
            player,
            session: None,
            subscriptions: HashMap::new(),
        }
    }

    fn session_mut(&mut self) -> anyhow::Result<&mut GameSession> {
        self.session.as_mut().ok_or_else(|| anyhow!("No puzzle selected"))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        for (_, task) in self.subscriptions.drain() {
            task.abort();
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, player: PlayerKey) {
    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(100);

    tracing::info!("WebSocket connection established for player {}", player.key);

    let _ = tx
        .send(ServerMessage::Welcome {
            player_key: player.key,
            issued: player.issued,
        })
        .await;

    // Spawn a task to send messages to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Handle incoming messages and timer ticks
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        state,
        tx,
        Connection::new(player.key),
    ));

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            // The receive loop sees the closed channel and saves progress
            let _ = recv_task.await;
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    tracing::info!("WebSocket connection closed for player {}", player.key);
}

/// Drive one connection until the client leaves or the outgoing channel
/// closes, then save where the player left off
async fn receive_loop<S>(
    mut receiver: S,
    state: Arc<AppState>,
    tx: mpsc::Sender<ServerMessage>,
    mut conn: Connection,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut ticker = tokio::time::interval(TIMER_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            if let Err(e) =
                                handle_client_message(client_msg, &state, &tx, &mut conn).await
                            {
                                tracing::warn!("Error handling message from {}: {}", conn.player, e);
                                let error_msg = ServerMessage::Error {
                                    message: e.to_string(),
                                };
                                let _ = tx.send(error_msg).await;
                            }
                        }
                        Err(e) => {
                            tracing::error!("Failed to parse message: {}", e);
                            let error_msg = ServerMessage::Error {
                                message: format!("Invalid message format: {}", e),
                            };
                            let _ = tx.send(error_msg).await;
                        }
                    },
                    Message::Close(_) => {
                        tracing::info!("Client disconnected: {}", conn.player);
                        break;
                    }
                    _ => {}
                }
            }
            _ = ticker.tick() => {
                if let Some(session) = conn.session.as_ref().filter(|s| s.is_timer_running()) {
                    let elapsed_seconds = session.elapsed_seconds(Instant::now());
                    let _ = tx.send(ServerMessage::TimerTick { elapsed_seconds }).await;
                }
            }
            _ = tx.closed() => {
                tracing::debug!("Outgoing channel closed for {}", conn.player);
                break;
            }
        }
    }

    // Keep the clock where the player left it
    if let Some(session) = &conn.session {
        persist(&state, conn.player, session).await;
    }
}

/// Handle individual client messages
async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    tx: &mpsc::Sender<ServerMessage>,
    conn: &mut Connection,
) -> anyhow::Result<()> {
    match msg {
        ClientMessage::RequestLeaderboard { puzzle_id } => {
            // Subscribe before reading so no ranking published in between is
            // lost; the forwarder starts after the snapshot to keep order.
            let subscription = if state.puzzles.contains(&puzzle_id)
                && !conn.subscriptions.contains_key(&puzzle_id)
            {
                Some(state.leaderboard.subscribe(&puzzle_id)?)
            } else {
                None
            };

            let ranking = state.leaderboard.get_leaderboard(&puzzle_id).await?;
            tx.send(ServerMessage::LeaderboardSnapshot {
                puzzle_id: puzzle_id.clone(),
                entries: LeaderboardEntryView::ranked(&ranking),
            })
            .await?;

            if let Some(subscription) = subscription {
                let task = follow_leaderboard(subscription, tx.clone());
                conn.subscriptions.insert(puzzle_id, task);
            }
        }
        ClientMessage::UnsubscribeLeaderboard { puzzle_id } => {
            if let Some(task) = conn.subscriptions.remove(&puzzle_id) {
                task.abort();
                tracing::debug!("Player {} stopped following puzzle {}", conn.player, puzzle_id);
            }
        }
        ClientMessage::SubmitScore {
            puzzle_id,
            username,
            time_seconds,
            email,
            hints_used,
        } => {
            let submission = ScoreSubmission {
                puzzle_id,
                username,
                email,
                time_seconds,
                hints_used,
            };

            let ack = match state.leaderboard.submit_score(submission).await {
                Ok(ranking) => ServerMessage::ScoreAck {
                    success: true,
                    error: None,
                    leaderboard: Some(LeaderboardEntryView::ranked(&ranking)),
                },
                Err(e) => {
                    if let LeaderboardError::Storage(inner) = &e {
                        tracing::error!("Failed to save score: {:#}", inner);
                    }
                    ServerMessage::ScoreAck {
                        success: false,
                        error: Some(e.to_string()),
                        leaderboard: None,
                    }
                }
            };
            tx.send(ack).await?;
        }
        ClientMessage::SelectPuzzle {
            puzzle_id,
            color_scheme,
        } => {
            if let Some(previous) = conn.session.take() {
                persist(state, conn.player, &previous).await;
            }

            let session = open_session(state, conn.player, &puzzle_id, color_scheme).await?;
            tx.send(puzzle_loaded(&session)).await?;
            conn.session = Some(session);
        }
        ClientMessage::Press { row, col } => {
            let events = conn.session_mut()?.press(Cell::new(row, col), Instant::now());
            dispatch(events, state, tx, conn).await?;
        }
        ClientMessage::Drag { row, col } => {
            let events = conn.session_mut()?.drag(Cell::new(row, col), Instant::now());
            dispatch(events, state, tx, conn).await?;
        }
        ClientMessage::Release => {
            let events = conn.session_mut()?.release(Instant::now());
            dispatch(events, state, tx, conn).await?;
        }
        ClientMessage::PointerLeft => {
            let events = conn.session_mut()?.pointer_left(Instant::now());
            dispatch(events, state, tx, conn).await?;
        }
        ClientMessage::RequestHint => {
            let events = conn.session_mut()?.request_hint(&mut rand::rng());
            dispatch(events, state, tx, conn).await?;
        }
        ClientMessage::ResetTimer => {
            let session = conn.session_mut()?;
            if session.reset_timer() {
                let elapsed_seconds = session.elapsed_seconds(Instant::now());
                tx.send(ServerMessage::TimerTick { elapsed_seconds }).await?;
            }
        }
        ClientMessage::ResetProgress => {
            let player = conn.player;
            let session = conn.session_mut()?;
            let events = session.reset_progress();
            let key = ProgressKey::new(player, session.puzzle().id.clone());
            if let Err(e) = state.progress.remove(&key).await {
                tracing::warn!("Failed to remove progress for player {}: {:#}", player, e);
            }
            dispatch(events, state, tx, conn).await?;
            if let Some(session) = &conn.session {
                tx.send(puzzle_loaded(session)).await?;
            }
        }
    }

    Ok(())
}

/// Start forwarding a puzzle's new rankings to this connection
fn follow_leaderboard(
    mut subscription: LeaderboardSubscription,
    tx: mpsc::Sender<ServerMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ranking) = subscription.next().await {
            let msg = ServerMessage::LeaderboardSnapshot {
                puzzle_id: subscription.puzzle_id().to_string(),
                entries: LeaderboardEntryView::ranked(&ranking),
            };
            if tx.send(msg).await.is_err() {
                break;
            }
        }
    })
}

/// Build a session for `puzzle_id`, resuming saved progress when there is any
async fn open_session(
    state: &AppState,
    player: Uuid,
    puzzle_id: &str,
    color_scheme: ColorScheme,
) -> anyhow::Result<GameSession> {
    let puzzle = state
        .puzzles
        .get(puzzle_id)
        .ok_or_else(|| anyhow!("Puzzle {} not found", puzzle_id))?;
    let palette = palette_for(color_scheme);
    let starting_hints = state.config.game.starting_hints;

    let key = ProgressKey::new(player, puzzle.id.clone());
    let Some(snapshot) = load_snapshot(state.progress.as_ref(), &key, &puzzle.grid).await else {
        return Ok(GameSession::new(puzzle, palette, starting_hints));
    };

    match GameSession::restore(puzzle.clone(), palette, starting_hints, &snapshot) {
        Ok(session) => {
            tracing::info!(
                "Restored {} found words for player {} on puzzle {}",
                session.progress().found_words().len(),
                player,
                puzzle_id
            );
            Ok(session)
        }
        Err(e) => {
            tracing::warn!(
                "Discarding progress for player {} on puzzle {}: {}",
                player,
                puzzle_id,
                e
            );
            Ok(GameSession::new(puzzle, palette, starting_hints))
        }
    }
}

fn puzzle_loaded(session: &GameSession) -> ServerMessage {
    let now = Instant::now();
    let progress = session.progress();
    let (found_count, total_count) = session.completion_progress();

    ServerMessage::PuzzleLoaded {
        puzzle: session.puzzle().view(),
        palette: session.palette(),
        found_words: progress.found_words().to_vec(),
        cell_colors: session.cell_colors(),
        found_count,
        total_count,
        hints_remaining: progress.hints_remaining,
        hints_used: progress.hints_used,
        elapsed_seconds: session.elapsed_seconds(now),
        completed: session.is_completed(),
        active_hint: session.active_hint().cloned(),
    }
}

/// Send session events to the client, saving progress when it changed
async fn dispatch(
    events: Vec<SessionEvent>,
    state: &AppState,
    tx: &mpsc::Sender<ServerMessage>,
    conn: &Connection,
) -> anyhow::Result<()> {
    let Some(session) = &conn.session else {
        return Ok(());
    };

    for event in events {
        let msg = match event {
            SessionEvent::SelectionChanged(path) => ServerMessage::SelectionChanged { path },
            SessionEvent::WordAccepted(found) => {
                let (found_count, total_count) = session.completion_progress();
                ServerMessage::WordAccepted {
                    word: found.word,
                    path: found.path,
                    category: found.category,
                    color: found.color,
                    found_count,
                    total_count,
                }
            }
            SessionEvent::WordRejected { word, reason } => ServerMessage::WordRejected {
                word,
                reason,
                message: reason.message().to_string(),
            },
            SessionEvent::HintsChanged(hints_remaining) => {
                ServerMessage::HintsChanged { hints_remaining }
            }
            SessionEvent::HintRevealed(hint) => ServerMessage::HintRevealed {
                word: hint.word,
                path: hint.path,
                hints_remaining: session.progress().hints_remaining,
            },
            SessionEvent::HintCleared => ServerMessage::HintCleared,
            SessionEvent::PuzzleCompleted {
                elapsed_seconds,
                hints_used,
            } => ServerMessage::PuzzleCompleted {
                elapsed_seconds,
                hints_used,
            },
            SessionEvent::ProgressChanged => {
                persist(state, conn.player, session).await;
                continue;
            }
        };
        tx.send(msg).await?;
    }

    Ok(())
}

/// Save a session's progress. Failures are logged and play continues.
async fn persist(state: &AppState, player: Uuid, session: &GameSession) {
    let key = ProgressKey::new(player, session.puzzle().id.clone());
    let snapshot = session.snapshot(Instant::now());

    if let Err(e) = save_snapshot(state.progress.as_ref(), &key, &snapshot).await {
        tracing::warn!(
            "Failed to save progress for player {} on puzzle {}: {:#}",
            player,
            key.puzzle_id,
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzles::tests::lion_tiger_definition;
    use crate::puzzles::PuzzleLibrary;

    fn test_state() -> Arc<AppState> {
        let puzzles = Arc::new(PuzzleLibrary::from_definitions([lion_tiger_definition()]));
        AppState::in_memory(crate::config::Config::for_tests(), puzzles)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    async fn send(
        msg: ClientMessage,
        state: &AppState,
        tx: &mpsc::Sender<ServerMessage>,
        conn: &mut Connection,
    ) {
        handle_client_message(msg, state, tx, conn).await.unwrap();
    }

    async fn trace_row(
        row: usize,
        len: usize,
        state: &AppState,
        tx: &mpsc::Sender<ServerMessage>,
        conn: &mut Connection,
    ) {
        send(ClientMessage::Press { row, col: 0 }, state, tx, conn).await;
        for col in 1..len {
            send(ClientMessage::Drag { row, col }, state, tx, conn).await;
        }
        send(ClientMessage::Release, state, tx, conn).await;
    }

    fn select(puzzle_id: &str) -> ClientMessage {
        ClientMessage::SelectPuzzle {
            puzzle_id: puzzle_id.to_string(),
            color_scheme: ColorScheme::Ocean,
        }
    }

    #[tokio::test]
    async fn test_gestures_require_a_puzzle() {
        let state = test_state();
        let (tx, _rx) = mpsc::channel(100);
        let mut conn = Connection::new(Uuid::new_v4());

        let result = handle_client_message(ClientMessage::Release, &state, &tx, &mut conn).await;
        assert!(result.is_err(), "release without a puzzle should fail");

        let result = handle_client_message(select("404"), &state, &tx, &mut conn).await;
        assert!(result.is_err(), "unknown puzzle should fail");
    }

    #[tokio::test]
    async fn test_play_through_to_completion() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(100);
        let mut conn = Connection::new(Uuid::new_v4());

        send(select("1"), &state, &tx, &mut conn).await;
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::PuzzleLoaded { found_count: 0, total_count: 2, .. }]
        ));

        trace_row(0, 4, &state, &tx, &mut conn).await;
        let messages = drain(&mut rx);
        assert!(messages.iter().any(|m| matches!(
            m,
            ServerMessage::WordAccepted { word, found_count: 1, .. } if word == "LION"
        )));

        trace_row(1, 5, &state, &tx, &mut conn).await;
        let messages = drain(&mut rx);
        let completed = messages
            .iter()
            .filter(|m| matches!(m, ServerMessage::PuzzleCompleted { .. }))
            .count();
        assert_eq!(completed, 1);
    }

    #[tokio::test]
    async fn test_progress_survives_reconnect() {
        let state = test_state();
        let player = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(100);

        let mut first = Connection::new(player);
        send(select("1"), &state, &tx, &mut first).await;
        trace_row(0, 4, &state, &tx, &mut first).await;
        drop(first);
        drain(&mut rx);

        let mut second = Connection::new(player);
        send(select("1"), &state, &tx, &mut second).await;
        let messages = drain(&mut rx);
        let Some(ServerMessage::PuzzleLoaded { found_words, found_count, .. }) = messages.first() else {
            panic!("expected puzzle_loaded, got {:?}", messages);
        };
        assert_eq!(*found_count, 1);
        assert_eq!(found_words[0].word, "LION");

        // Another player starts fresh
        let mut stranger = Connection::new(Uuid::new_v4());
        send(select("1"), &state, &tx, &mut stranger).await;
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::PuzzleLoaded { found_count: 0, .. }]
        ));
    }

    #[tokio::test]
    async fn test_reset_progress_forgets_saved_words() {
        let state = test_state();
        let player = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(100);

        let mut conn = Connection::new(player);
        send(select("1"), &state, &tx, &mut conn).await;
        trace_row(0, 4, &state, &tx, &mut conn).await;
        send(ClientMessage::ResetProgress, &state, &tx, &mut conn).await;
        drain(&mut rx);

        let mut again = Connection::new(player);
        send(select("1"), &state, &tx, &mut again).await;
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::PuzzleLoaded { found_count: 0, .. }]
        ));
    }

    #[tokio::test]
    async fn test_score_submission_and_leaderboard_follow() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(100);
        let mut conn = Connection::new(Uuid::new_v4());

        send(
            ClientMessage::RequestLeaderboard {
                puzzle_id: "1".to_string(),
            },
            &state,
            &tx,
            &mut conn,
        )
        .await;
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::LeaderboardSnapshot { entries, .. }] if entries.is_empty()
        ));

        let submit = |username: &str| ClientMessage::SubmitScore {
            puzzle_id: "1".to_string(),
            username: username.to_string(),
            time_seconds: 75,
            email: Some("a@example.com".to_string()),
            hints_used: 1,
        };

        send(submit("Alice"), &state, &tx, &mut conn).await;

        // The ack and the pushed ranking of the followed board may arrive in
        // either order
        let mut received = Vec::new();
        for _ in 0..2 {
            let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            received.push(msg);
        }
        assert!(received
            .iter()
            .any(|m| matches!(m, ServerMessage::ScoreAck { success: true, .. })));
        let pushed = received
            .iter()
            .find_map(|m| match m {
                ServerMessage::LeaderboardSnapshot { entries, .. } => Some(entries.clone()),
                _ => None,
            })
            .expect("followed board should be pushed");
        assert_eq!(pushed[0].username, "Alice");
        assert_eq!(pushed[0].time_formatted, "1:15");

        send(submit("Alice"), &state, &tx, &mut conn).await;
        let ack = rx.recv().await.unwrap();
        assert!(matches!(
            ack,
            ServerMessage::ScoreAck { success: false, error: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_score_during_slow_snapshot_still_reaches_viewer() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(1);
        // Fill the channel so the snapshot send has to wait
        tx.send(ServerMessage::HintCleared).await.unwrap();

        let request = {
            let state = state.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut conn = Connection::new(Uuid::new_v4());
                let msg = ClientMessage::RequestLeaderboard {
                    puzzle_id: "1".to_string(),
                };
                handle_client_message(msg, &state, &tx, &mut conn).await.unwrap();
                conn
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        state
            .leaderboard
            .submit_score(ScoreSubmission {
                puzzle_id: "1".to_string(),
                username: "Alice".to_string(),
                email: None,
                time_seconds: 75,
                hints_used: 0,
            })
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(ServerMessage::HintCleared)));
        let _conn = request.await.unwrap();

        let mut seen = Vec::new();
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("viewer should receive Alice's ranking")
                .unwrap();
            let ServerMessage::LeaderboardSnapshot { entries, .. } = msg else {
                panic!("expected leaderboard_snapshot, got {:?}", msg);
            };
            let names: Vec<String> = entries.into_iter().map(|e| e.username).collect();
            let done = names.iter().any(|n| n == "Alice");
            seen.push(names);
            if done {
                break;
            }
        }
        assert_eq!(seen.last().unwrap(), &vec!["Alice".to_string()]);
    }

    #[tokio::test]
    async fn test_progress_saved_when_outgoing_channel_closes() {
        let state = test_state();
        let player = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(100);

        let mut conn = Connection::new(player);
        send(select("1"), &state, &tx, &mut conn).await;
        trace_row(0, 4, &state, &tx, &mut conn).await;

        let key = ProgressKey::new(player, "1".to_string());
        state.progress.remove(&key).await.unwrap();

        // The writer side is gone, as when the socket send fails
        drop(rx);
        let incoming = futures::stream::pending::<Result<Message, axum::Error>>();
        tokio::time::timeout(
            Duration::from_secs(1),
            receive_loop(incoming, state.clone(), tx, conn),
        )
        .await
        .expect("receive loop should stop once the channel closes");

        let puzzle = state.puzzles.get("1").unwrap();
        let snapshot = load_snapshot(state.progress.as_ref(), &key, &puzzle.grid)
            .await
            .expect("progress should be saved on the way out");
        assert_eq!(snapshot.found_words, vec!["LION".to_string()]);
    }
}
