use crate::types::{Outcome, PlayerRating};

const K_FACTOR: f64 = 32.0;
pub const DEFAULT_RATING: i32 = 1000;

pub fn create_player_rating(username: &str) -> PlayerRating {
    PlayerRating {
        username: username.to_string(),
        rating: DEFAULT_RATING,
        wins: 0,
        losses: 0,
        draws: 0,
    }
}

/// Probability that `player` beats `opponent` given current ratings.
/// `expected_score(a, b) + expected_score(b, a) == 1` by construction.
pub fn expected_score(player: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent - player) / 400.0))
}

/// New ratings for both sides of one completed game. Inputs are read-only
/// snapshots; callers replace their table entries wholesale.
pub fn apply_outcome(
    player: &PlayerRating,
    opponent: &PlayerRating,
    outcome: Outcome,
) -> (PlayerRating, PlayerRating) {
    let actual = match outcome {
        Outcome::Win => 1.0,
        Outcome::Loss => 0.0,
        Outcome::Draw => 0.5,
    };
    let opponent_actual = 1.0 - actual;

    let player_expected = expected_score(player.rating, opponent.rating);
    let opponent_expected = expected_score(opponent.rating, player.rating);

    let updated_player = PlayerRating {
        username: player.username.clone(),
        rating: (f64::from(player.rating) + K_FACTOR * (actual - player_expected)).round() as i32,
        wins: player.wins + u32::from(outcome == Outcome::Win),
        losses: player.losses + u32::from(outcome == Outcome::Loss),
        draws: player.draws + u32::from(outcome == Outcome::Draw),
    };
    let updated_opponent = PlayerRating {
        username: opponent.username.clone(),
        rating: (f64::from(opponent.rating) + K_FACTOR * (opponent_actual - opponent_expected))
            .round() as i32,
        wins: opponent.wins + u32::from(outcome == Outcome::Loss),
        losses: opponent.losses + u32::from(outcome == Outcome::Win),
        draws: opponent.draws + u32::from(outcome == Outcome::Draw),
    };
    (updated_player, updated_opponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating_of(username: &str, rating: i32) -> PlayerRating {
        PlayerRating {
            rating,
            ..create_player_rating(username)
        }
    }

    #[test]
    fn expected_score_is_half_for_equal_ratings() {
        for rating in [0, 800, 1000, 1500, 2400] {
            assert!((expected_score(rating, rating) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn expected_score_favors_the_higher_rating() {
        let favorite = expected_score(1200, 1000);
        assert!((favorite - 0.76).abs() < 0.01);
        assert!(expected_score(1000, 1200) < 0.5);
    }

    #[test]
    fn expected_scores_of_both_sides_sum_to_one() {
        for (a, b) in [(1000, 1000), (1200, 1000), (900, 2100), (1543, 1276)] {
            let total = expected_score(a, b) + expected_score(b, a);
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn equal_ratings_win_moves_both_by_sixteen() {
        let (winner, loser) = apply_outcome(
            &rating_of("a", 1000),
            &rating_of("b", 1000),
            Outcome::Win,
        );
        assert_eq!(winner.rating, 1016);
        assert_eq!(loser.rating, 984);
        assert_eq!(winner.wins, 1);
        assert_eq!(winner.losses, 0);
        assert_eq!(loser.losses, 1);
        assert_eq!(loser.wins, 0);
    }

    #[test]
    fn equal_ratings_draw_changes_nothing_but_counters() {
        let (player, opponent) = apply_outcome(
            &rating_of("a", 1000),
            &rating_of("b", 1000),
            Outcome::Draw,
        );
        assert_eq!(player.rating, 1000);
        assert_eq!(opponent.rating, 1000);
        assert_eq!(player.draws, 1);
        assert_eq!(opponent.draws, 1);
    }

    #[test]
    fn draw_between_unequal_ratings_pulls_them_together() {
        let (lower, higher) = apply_outcome(
            &rating_of("low", 1000),
            &rating_of("high", 1200),
            Outcome::Draw,
        );
        assert!(lower.rating > 1000);
        assert!(higher.rating < 1200);
    }

    #[test]
    fn loss_mirrors_win_for_the_opponent() {
        let (player, opponent) = apply_outcome(
            &rating_of("a", 1100),
            &rating_of("b", 900),
            Outcome::Loss,
        );
        assert!(player.rating < 1100);
        assert!(opponent.rating > 900);
        assert_eq!(player.losses, 1);
        assert_eq!(opponent.wins, 1);
    }

    #[test]
    fn apply_outcome_leaves_inputs_untouched() {
        let player = rating_of("a", 1000);
        let opponent = rating_of("b", 1000);
        let _ = apply_outcome(&player, &opponent, Outcome::Win);
        assert_eq!(player.rating, 1000);
        assert_eq!(player.wins, 0);
        assert_eq!(opponent.rating, 1000);
        assert_eq!(opponent.losses, 0);
    }
}
