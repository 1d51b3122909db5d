use std::collections::{BTreeMap, HashMap};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::elo::{apply_outcome, create_player_rating};
use crate::types::{Outcome, PlayerRating, Seat};

/// In-memory table of one rating entry per distinct display name. Entries
/// are created lazily and never deleted.
#[derive(Debug, Default)]
pub struct RatingStore {
    players: HashMap<String, PlayerRating>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, username: &str) -> Option<&PlayerRating> {
        self.players.get(username)
    }

    pub fn ensure(&mut self, username: &str) -> &PlayerRating {
        self.players
            .entry(username.to_string())
            .or_insert_with(|| create_player_rating(username))
    }

    /// Applies one completed game between the named seats. Both deltas come
    /// from the same rating snapshot and both entries are replaced wholesale.
    /// Returns the per-seat rating deltas for the broadcast payload.
    pub fn record_result(
        &mut self,
        x_name: &str,
        o_name: &str,
        winner: Option<Seat>,
    ) -> BTreeMap<Seat, i32> {
        if x_name == o_name {
            // A name cannot win and lose the same game against itself.
            return BTreeMap::new();
        }

        let x_before = self.ensure(x_name).clone();
        let o_before = self.ensure(o_name).clone();
        let x_outcome = match winner {
            Some(Seat::X) => Outcome::Win,
            Some(Seat::O) => Outcome::Loss,
            None => Outcome::Draw,
        };

        let (x_after, o_after) = apply_outcome(&x_before, &o_before, x_outcome);
        let mut deltas = BTreeMap::new();
        deltas.insert(Seat::X, x_after.rating - x_before.rating);
        deltas.insert(Seat::O, o_after.rating - o_before.rating);
        self.players.insert(x_name.to_string(), x_after);
        self.players.insert(o_name.to_string(), o_after);
        deltas
    }

    /// Every rating ordered by rating descending, then name ascending so
    /// the ordering is stable across broadcasts.
    pub fn leaderboard(&self) -> Vec<PlayerRating> {
        let mut entries: Vec<PlayerRating> = self.players.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.username.to_lowercase().cmp(&b.username.to_lowercase()))
        });
        entries
    }

    /// REST response body with a generation timestamp.
    pub fn build_response(&self) -> Value {
        json!({
            "generatedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "ratings": self.leaderboard(),
        })
    }
}
