use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::ai::best_move;
use crate::game::MoveError;
use crate::game_store::GameStore;
use crate::rating_store::RatingStore;
use crate::rng::Rng;
use crate::server_protocol::{
    parse_game_message, parse_lobby_message, GameClientMessage, LobbyClientMessage,
};
use crate::subscriptions::SubscriptionRegistry;
use crate::types::{Difficulty, GameView, Seat};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

pub const OUTBOUND_QUEUE_DEPTH: usize = 256;
pub const CLOSE_NOT_FOUND: u16 = 4004;

#[derive(Clone, Debug)]
pub enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

pub type SharedState = Arc<Mutex<ServerState>>;

/// Rejections from a move operation, each carrying the payload the acting
/// connection should see.
#[derive(Debug)]
pub enum OpError {
    NotFound(Value),
    InvalidMove(Value),
}

impl OpError {
    pub fn into_payload(self) -> Value {
        match self {
            Self::NotFound(payload) | Self::InvalidMove(payload) => payload,
        }
    }
}

/// All process-wide state: connected clients, subscription sets, the game
/// table, and the rating table. One instance lives behind a single mutex,
/// so every inbound message (and its fan-out) runs to completion before the
/// next one touches any game.
pub struct ServerState {
    clients: HashMap<u64, ClientContext>,
    subscriptions: SubscriptionRegistry,
    pub games: GameStore,
    pub ratings: RatingStore,
    rng: Rng,
}

impl ServerState {
    pub fn new(rng: Rng) -> Self {
        Self {
            clients: HashMap::new(),
            subscriptions: SubscriptionRegistry::new(),
            games: GameStore::new(),
            ratings: RatingStore::new(),
            rng,
        }
    }

    pub fn shared(rng: Rng) -> SharedState {
        Arc::new(Mutex::new(Self::new(rng)))
    }

    pub fn register_client(&mut self, tx: mpsc::Sender<OutboundMessage>) -> u64 {
        let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
        self.clients.insert(client_id, ClientContext { tx });
        client_id
    }

    /// Removes the connection from every registry it appears in. The only
    /// teardown signal; game records persist.
    pub fn disconnect(&mut self, client_id: u64) {
        self.drop_client(client_id);
        debug!(client_id, "client disconnected");
    }

    // ---- lobby channel ----

    pub fn attach_lobby(&mut self, client_id: u64) {
        self.subscriptions.subscribe_lobby(client_id);
        let games_list = json!({ "type": "games_list", "games": self.games.views() });
        self.send_to(client_id, &games_list);
        let leaderboard = self.leaderboard_message();
        self.send_to(client_id, &leaderboard);
    }

    pub fn lobby_message(&mut self, client_id: u64, raw: &str) {
        // Unrecognized or unusable messages are dropped without a reply.
        let Some(message) = parse_lobby_message(raw) else {
            return;
        };

        match message {
            LobbyClientMessage::Create => {
                let (id, game) = self.create_game_op();
                let reply = json!({ "type": "game_created", "id": id, "game": game });
                self.send_to(client_id, &reply);
            }
            LobbyClientMessage::CreateAiGame {
                username,
                difficulty,
            } => {
                let (id, game) = self.create_ai_game_op(&username, difficulty);
                let notice = json!({ "type": "game_created", "id": id, "game": game });
                self.broadcast_lobby(&notice);
            }
            LobbyClientMessage::JoinGame { game_id, username } => {
                self.handle_join(&game_id, &username);
            }
            LobbyClientMessage::GetLeaderboard => {
                let leaderboard = self.leaderboard_message();
                self.send_to(client_id, &leaderboard);
            }
        }
    }

    fn handle_join(&mut self, game_id: &str, username: &str) {
        self.ratings.ensure(username);

        let payload = {
            let Some(record) = self.games.get_mut(game_id) else {
                return;
            };
            if record.players.values().any(|name| name == username) {
                return;
            }
            let open_seat = [Seat::X, Seat::O]
                .into_iter()
                .find(|seat| !record.players.contains_key(seat));
            let Some(seat) = open_seat else {
                return;
            };
            record.players.insert(seat, username.to_string());
            info!(game = game_id, username, seat = ?seat, "player joined");
            to_payload(record.view())
        };
        self.broadcast_game(game_id, &payload);
    }

    // ---- game channel ----

    /// Registers a connection on a game channel and sends the current
    /// record. Unknown ids get an error payload and a close frame instead.
    pub fn attach_game(&mut self, client_id: u64, game_id: &str) -> bool {
        let Some(record) = self.games.get(game_id) else {
            self.send_to(client_id, &json!({ "error": "Game not found" }));
            if let Some(client) = self.clients.get(&client_id) {
                let _ = client.tx.try_send(OutboundMessage::Close {
                    code: CLOSE_NOT_FOUND,
                    reason: "game not found".to_string(),
                });
            }
            return false;
        };

        let payload = to_payload(record.view());
        self.subscriptions.subscribe_game(game_id, client_id);
        self.send_to(client_id, &payload);
        true
    }

    pub fn game_message(&mut self, client_id: u64, game_id: &str, raw: &str) {
        let Some(message) = parse_game_message(raw) else {
            return;
        };

        match message {
            GameClientMessage::Move { position } => {
                if let Err(rejection) = self.make_move(game_id, position) {
                    self.send_to(client_id, &rejection.into_payload());
                }
            }
            GameClientMessage::AiMove => self.handle_ai_move(client_id, game_id),
            GameClientMessage::Reset => {
                self.reset_game(game_id);
            }
        }
    }

    /// Applies one move against a game record. On success the updated
    /// record is broadcast to the game's subscribers; if the move completed
    /// the game between two named seats, rating deltas are folded into the
    /// payload and a fresh leaderboard goes to the lobby. Rejections carry
    /// the unmodified record plus an `error` field and are never broadcast.
    pub fn make_move(&mut self, game_id: &str, position: Option<i64>) -> Result<Value, OpError> {
        let (mut payload, seats, winner, done) = {
            let Some(record) = self.games.get_mut(game_id) else {
                return Err(OpError::NotFound(
                    json!({ "id": game_id, "error": "Game not found" }),
                ));
            };
            let result = match position {
                None => Err(MoveError::NotAnInteger),
                Some(position) => record.state.apply_move(position),
            };
            match result {
                Err(error) => {
                    let mut payload = to_payload(record.view());
                    payload["error"] = json!(error.to_string());
                    return Err(OpError::InvalidMove(payload));
                }
                Ok(next) => {
                    record.state = next;
                    let winner = record.state.winner();
                    let done = winner.is_some() || record.state.is_full();
                    let seats = (
                        record.players.get(&Seat::X).cloned(),
                        record.players.get(&Seat::O).cloned(),
                    );
                    (to_payload(record.view()), seats, winner, done)
                }
            }
        };

        let mut rating_updated = false;
        if done {
            if let (Some(x_name), Some(o_name)) = seats {
                let deltas = self.ratings.record_result(&x_name, &o_name, winner);
                if !deltas.is_empty() {
                    payload["ratingChange"] = json!(deltas);
                    rating_updated = true;
                }
            }
            info!(game = game_id, winner = ?winner, "game completed");
        }

        self.broadcast_game(game_id, &payload);
        if rating_updated {
            let leaderboard = self.leaderboard_message();
            self.broadcast_lobby(&leaderboard);
        }
        Ok(payload)
    }

    fn handle_ai_move(&mut self, client_id: u64, game_id: &str) {
        let decision = {
            let Some(record) = self.games.get(game_id) else {
                return;
            };
            if !record.is_ai {
                return;
            }
            if record.state.winner().is_some() || record.state.is_full() {
                let mut payload = to_payload(record.view());
                payload["error"] = json!(MoveError::GameOver.to_string());
                Err(payload)
            } else {
                Ok((
                    record.state.clone(),
                    record.state.current_player,
                    record.difficulty.unwrap_or(Difficulty::Impossible),
                ))
            }
        };

        match decision {
            Err(payload) => self.send_to(client_id, &payload),
            Ok((state, seat, difficulty)) => {
                let Some(position) = best_move(&state, seat, difficulty, &mut self.rng) else {
                    return;
                };
                if let Err(rejection) = self.make_move(game_id, Some(position as i64)) {
                    self.send_to(client_id, &rejection.into_payload());
                }
            }
        }
    }

    /// Fresh board, same seats and difficulty. Broadcast to the room.
    pub fn reset_game(&mut self, game_id: &str) -> Option<Value> {
        let payload = {
            let record = self.games.reset(game_id)?;
            to_payload(record.view())
        };
        self.broadcast_game(game_id, &payload);
        Some(payload)
    }

    // ---- REST-facing operations ----

    pub fn create_game_op(&mut self) -> (String, Value) {
        let record = self.games.create();
        let id = record.id.clone();
        let view = to_payload(record.view());
        info!(game = %id, "created game");
        (id, view)
    }

    pub fn create_ai_game_op(&mut self, username: &str, difficulty: Difficulty) -> (String, Value) {
        self.ratings.ensure(username);
        let record = self.games.create_ai(username, difficulty);
        let id = record.id.clone();
        let view = to_payload(record.view());
        info!(game = %id, username, difficulty = ?difficulty, "created AI game");
        (id, view)
    }

    pub fn games_list_value(&self) -> Value {
        json!(self.games.views())
    }

    pub fn game_view_value(&self, game_id: &str) -> Option<Value> {
        self.games.get(game_id).map(|record| to_payload(record.view()))
    }

    pub fn leaderboard_response(&self) -> Value {
        self.ratings.build_response()
    }

    fn leaderboard_message(&self) -> Value {
        json!({ "type": "leaderboard", "ratings": self.ratings.leaderboard() })
    }

    // ---- fan-out ----

    fn send_to(&mut self, client_id: u64, payload: &Value) {
        let failed = match self.clients.get(&client_id) {
            Some(client) => client
                .tx
                .try_send(OutboundMessage::Text(payload.to_string()))
                .is_err(),
            None => false,
        };
        if failed {
            self.drop_client(client_id);
        }
    }

    fn broadcast_lobby(&mut self, payload: &Value) {
        let members = self.subscriptions.lobby_members();
        self.fan_out(&members, payload);
    }

    fn broadcast_game(&mut self, game_id: &str, payload: &Value) {
        let members = self.subscriptions.game_members(game_id);
        self.fan_out(&members, payload);
    }

    /// One serialized payload to every member. A full or dead queue drops
    /// that client only; the rest of the fan-out proceeds.
    fn fan_out(&mut self, members: &[u64], payload: &Value) {
        let text = payload.to_string();
        let mut failed = Vec::new();
        for &client_id in members {
            let Some(client) = self.clients.get(&client_id) else {
                continue;
            };
            if client
                .tx
                .try_send(OutboundMessage::Text(text.clone()))
                .is_err()
            {
                failed.push(client_id);
            }
        }
        for client_id in failed {
            self.drop_client(client_id);
        }
    }

    fn drop_client(&mut self, client_id: u64) {
        self.clients.remove(&client_id);
        self.subscriptions.remove_client(client_id);
    }
}

fn to_payload(view: GameView) -> Value {
    serde_json::to_value(view).expect("game view serializes")
}
