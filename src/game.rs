use thiserror::Error;

use crate::types::{Cell, Seat};

/// Indices map to positions:
///  0 | 1 | 2
///  ---------
///  3 | 4 | 5
///  ---------
///  6 | 7 | 8
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Position must be an integer")]
    NotAnInteger,
    #[error("Position must be between 0 and 8")]
    OutOfRange,
    #[error("Position is already occupied")]
    Occupied,
    #[error("Game is already over")]
    GameOver,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub board: [Cell; 9],
    pub current_player: Seat,
}

pub fn create_game() -> GameState {
    GameState {
        board: [None; 9],
        current_player: Seat::X,
    }
}

impl GameState {
    /// Validates and applies one move, returning the successor state. The
    /// receiver is never mutated.
    pub fn apply_move(&self, position: i64) -> Result<GameState, MoveError> {
        if !(0..9).contains(&position) {
            return Err(MoveError::OutOfRange);
        }
        let index = position as usize;
        if self.board[index].is_some() {
            return Err(MoveError::Occupied);
        }
        if self.winner().is_some() {
            return Err(MoveError::GameOver);
        }
        Ok(self.place(index))
    }

    /// Unchecked successor state. Callers must have verified the slot is
    /// empty and the game has no winner.
    pub fn place(&self, index: usize) -> GameState {
        let mut next = self.clone();
        next.board[index] = Some(self.current_player);
        next.current_player = self.current_player.other();
        next
    }

    pub fn winner(&self) -> Option<Seat> {
        for [a, b, c] in LINES {
            let cell = self.board[a];
            if cell.is_some() && cell == self.board[b] && cell == self.board[c] {
                return cell;
            }
        }
        None
    }

    pub fn is_full(&self) -> bool {
        self.board.iter().all(|cell| cell.is_some())
    }

    /// Empty slot indices in increasing order.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..9).filter(|&index| self.board[index].is_none()).collect()
    }
}
