use std::collections::BTreeMap;

use serde::Serialize;

/// One of the two game roles. `X` always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Seat {
    X,
    O,
}

impl Seat {
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

/// A board slot: occupied by a seat or empty. Serializes as `"X"`, `"O"`
/// or `null` on the wire.
pub type Cell = Option<Seat>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
    Impossible,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            "expert" => Some(Self::Expert),
            "impossible" => Some(Self::Impossible),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerRating {
    pub username: String,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// Wire form of a game record. `winner` is re-derived from the board at
/// build time, never stored.
#[derive(Clone, Debug, Serialize)]
pub struct GameView {
    pub id: String,
    pub board: [Cell; 9],
    #[serde(rename = "currentPlayer")]
    pub current_player: Seat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Seat>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub players: BTreeMap<Seat, String>,
    #[serde(rename = "isAI", skip_serializing_if = "is_false")]
    pub is_ai: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

fn is_false(value: &bool) -> bool {
    !value
}
