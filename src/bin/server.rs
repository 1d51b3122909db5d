use std::path::PathBuf;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tictactoe_lobby_server::hub::{
    OpError, OutboundMessage, ServerState, SharedState, OUTBOUND_QUEUE_DEPTH,
};
use tictactoe_lobby_server::rng::Rng;

#[derive(Debug, Parser)]
#[command(name = "tictactoe-lobby-server", about = "Multiplayer tic-tac-toe lobby server")]
struct Args {
    /// Port to listen on; the PORT env var wins when set.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Directory with the built client bundle.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Fixed seed for the opponent engine's random source.
    #[arg(long)]
    ai_seed: Option<u32>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(args.port);

    let rng = match args.ai_seed {
        Some(seed) => Rng::new(seed),
        None => Rng::from_entropy(),
    };
    let state = ServerState::shared(rng);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/games", get(list_games_handler).post(create_game_handler))
        .route("/games/{id}", get(get_game_handler))
        .route("/games/{id}/move", post(move_handler))
        .route("/games/{id}/reset", post(reset_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .route("/ws/lobby", get(lobby_ws_handler))
        .route("/ws/games/{id}", get(game_ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(args.static_dir) {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("no static file root found; serving the API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    info!(port, "listening");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir(flag: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = flag {
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }
    let candidates = [PathBuf::from("dist/client"), PathBuf::from("../dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

// ---- REST fallback: the same operations, synchronously ----

async fn list_games_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.games_list_value())
}

async fn create_game_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let mut guard = state.lock().await;
    let (_, view) = guard.create_game_op();
    Json(view)
}

async fn get_game_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    match guard.game_view_value(&id) {
        Some(view) => (StatusCode::OK, Json(view)),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Game not found" })),
        ),
    }
}

async fn move_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let position = body.get("position").and_then(Value::as_i64);
    let mut guard = state.lock().await;
    match guard.make_move(&id, position) {
        Ok(payload) => (StatusCode::OK, Json(payload)),
        Err(OpError::NotFound(payload)) => (StatusCode::NOT_FOUND, Json(payload)),
        Err(OpError::InvalidMove(payload)) => (StatusCode::BAD_REQUEST, Json(payload)),
    }
}

async fn reset_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut guard = state.lock().await;
    match guard.reset_game(&id) {
        Some(payload) => (StatusCode::OK, Json(payload)),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Game not found" })),
        ),
    }
}

async fn leaderboard_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.leaderboard_response())
}

// ---- WebSocket channels ----

async fn lobby_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket, Channel::Lobby))
}

async fn game_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket, Channel::Game(id)))
}

enum Channel {
    Lobby,
    Game(String),
}

async fn handle_socket(state: SharedState, socket: WebSocket, channel: Channel) {
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_DEPTH);

    let client_id = {
        let mut guard = state.lock().await;
        let client_id = guard.register_client(tx.clone());
        match &channel {
            Channel::Lobby => guard.attach_lobby(client_id),
            Channel::Game(id) => {
                // Unknown ids still get the queued error and close frame
                // delivered by the writer before the socket drops.
                guard.attach_game(client_id, id);
            }
        }
        client_id
    };

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                dispatch(&state, client_id, &channel, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    dispatch(&state, client_id, &channel, text).await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.disconnect(client_id);
    }
    drop(tx);
    let _ = writer.await;
}

async fn dispatch(state: &SharedState, client_id: u64, channel: &Channel, raw: String) {
    let mut guard = state.lock().await;
    match channel {
        Channel::Lobby => guard.lobby_message(client_id, &raw),
        Channel::Game(id) => guard.game_message(client_id, id, &raw),
    }
}
