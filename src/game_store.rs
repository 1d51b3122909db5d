use std::collections::{BTreeMap, HashMap};

use rand::distr::Alphanumeric;
use rand::Rng as _;

use crate::game::{create_game, GameState};
use crate::types::{Difficulty, GameView, Seat};

/// Display name shown on the engine-driven seat of a computer-opponent game.
pub const AI_SEAT_NAME: &str = "AI";

const GAME_ID_LEN: usize = 24;

/// One tic-tac-toe match plus its lobby metadata. Records are created by
/// the lobby and never deleted.
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub id: String,
    pub state: GameState,
    pub players: BTreeMap<Seat, String>,
    pub is_ai: bool,
    pub difficulty: Option<Difficulty>,
}

impl GameRecord {
    /// Wire form of this record. The winner is derived from the board here
    /// so it can never desync from the canonical cells.
    pub fn view(&self) -> GameView {
        GameView {
            id: self.id.clone(),
            board: self.state.board,
            current_player: self.state.current_player,
            winner: self.state.winner(),
            players: self.players.clone(),
            is_ai: self.is_ai,
            difficulty: self.difficulty,
        }
    }
}

/// In-memory table of all games, keyed by id. No eviction.
#[derive(Debug, Default)]
pub struct GameStore {
    games: HashMap<String, GameRecord>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a plain two-seat game with both seats open.
    pub fn create(&mut self) -> &GameRecord {
        let id = make_game_id();
        let record = GameRecord {
            id: id.clone(),
            state: create_game(),
            players: BTreeMap::new(),
            is_ai: false,
            difficulty: None,
        };
        self.games.entry(id).or_insert(record)
    }

    /// Creates a computer-opponent game: seat X is the human, seat O is the
    /// engine.
    pub fn create_ai(&mut self, player1_name: &str, difficulty: Difficulty) -> &GameRecord {
        let id = make_game_id();
        let mut players = BTreeMap::new();
        players.insert(Seat::X, player1_name.to_string());
        players.insert(Seat::O, AI_SEAT_NAME.to_string());
        let record = GameRecord {
            id: id.clone(),
            state: create_game(),
            players,
            is_ai: true,
            difficulty: Some(difficulty),
        };
        self.games.entry(id).or_insert(record)
    }

    pub fn get(&self, id: &str) -> Option<&GameRecord> {
        self.games.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut GameRecord> {
        self.games.get_mut(id)
    }

    pub fn set(&mut self, id: &str, record: GameRecord) {
        self.games.insert(id.to_string(), record);
    }

    pub fn list(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.values()
    }

    /// Wire map of every record, id -> view.
    pub fn views(&self) -> BTreeMap<String, GameView> {
        self.games
            .iter()
            .map(|(id, record)| (id.clone(), record.view()))
            .collect()
    }

    /// Replaces the board/currentPlayer/winner with a fresh game while
    /// preserving players, the AI flag, and the difficulty.
    pub fn reset(&mut self, id: &str) -> Option<&GameRecord> {
        let record = self.games.get_mut(id)?;
        record.state = create_game();
        Some(record)
    }
}

fn make_game_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(GAME_ID_LEN)
        .map(char::from)
        .collect()
}
