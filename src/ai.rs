use crate::game::GameState;
use crate::rng::Rng;
use crate::types::{Difficulty, Seat};

/// Probability that the engine plays a random empty slot instead of
/// searching. Checked once per call, before the search.
fn mistake_rate(difficulty: Difficulty) -> f32 {
    match difficulty {
        Difficulty::Easy => 0.5,
        Difficulty::Medium => 0.3,
        Difficulty::Hard => 0.15,
        Difficulty::Expert => 0.05,
        Difficulty::Impossible => 0.0,
    }
}

/// Best position for `seat` to play, or `None` on a terminal state.
///
/// Exhaustive minimax over the remaining tree; ties go to the lowest slot
/// index. Lower difficulties occasionally return a random empty slot
/// instead, giving the human a chance to win.
pub fn best_move(
    state: &GameState,
    seat: Seat,
    difficulty: Difficulty,
    rng: &mut Rng,
) -> Option<usize> {
    if state.winner().is_some() {
        return None;
    }
    let empty_cells = state.empty_cells();
    if empty_cells.is_empty() {
        return None;
    }

    if rng.chance(mistake_rate(difficulty)) {
        return Some(empty_cells[rng.pick_index(empty_cells.len())]);
    }

    let mut best_score = i32::MIN;
    let mut best_position = None;
    for &position in &empty_cells {
        let score = minimax(&state.place(position), false, seat);
        if score > best_score {
            best_score = score;
            best_position = Some(position);
        }
    }
    best_position
}

/// Scores every possible continuation from the perspective of `seat`:
/// +1 when `seat` wins the terminal state, -1 when the opponent does,
/// 0 for a full board. Maximizes on `seat`'s turns, minimizes otherwise.
fn minimax(state: &GameState, maximizing: bool, seat: Seat) -> i32 {
    if let Some(winner) = state.winner() {
        return if winner == seat { 1 } else { -1 };
    }
    if state.is_full() {
        return 0;
    }

    let mut best_score = if maximizing { i32::MIN } else { i32::MAX };
    for position in state.empty_cells() {
        let score = minimax(&state.place(position), !maximizing, seat);
        best_score = if maximizing {
            best_score.max(score)
        } else {
            best_score.min(score)
        };
    }
    best_score
}
