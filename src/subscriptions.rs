use std::collections::{HashMap, HashSet};

/// Which open connections are listening where: the shared lobby set plus one
/// set per game id. Pure bookkeeping; the hub owns the actual send handles.
///
/// Per-game sets are created on first subscriber and discarded on last
/// unsubscribe. The game record itself is never touched here, so empty rooms
/// can be rejoined later.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    lobby: HashSet<u64>,
    rooms: HashMap<String, HashSet<u64>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_lobby(&mut self, client_id: u64) {
        self.lobby.insert(client_id);
    }

    pub fn unsubscribe_lobby(&mut self, client_id: u64) {
        self.lobby.remove(&client_id);
    }

    pub fn subscribe_game(&mut self, game_id: &str, client_id: u64) {
        self.rooms
            .entry(game_id.to_string())
            .or_default()
            .insert(client_id);
    }

    pub fn unsubscribe_game(&mut self, game_id: &str, client_id: u64) {
        if let Some(members) = self.rooms.get_mut(game_id) {
            members.remove(&client_id);
            if members.is_empty() {
                self.rooms.remove(game_id);
            }
        }
    }

    /// Removes the client from the lobby and every room it appears in.
    pub fn remove_client(&mut self, client_id: u64) {
        self.lobby.remove(&client_id);
        self.rooms.retain(|_, members| {
            members.remove(&client_id);
            !members.is_empty()
        });
    }

    /// Snapshot of the lobby members, safe to iterate while the registry
    /// is mutated by send-failure cleanup.
    pub fn lobby_members(&self) -> Vec<u64> {
        self.lobby.iter().copied().collect()
    }

    pub fn game_members(&self, game_id: &str) -> Vec<u64> {
        self.rooms
            .get(game_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn has_game_set(&self, game_id: &str) -> bool {
        self.rooms.contains_key(game_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobby_membership_is_idempotent() {
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe_lobby(1);
        registry.subscribe_lobby(1);
        registry.subscribe_lobby(2);
        assert_eq!(registry.lobby_members().len(), 2);
        registry.unsubscribe_lobby(1);
        assert_eq!(registry.lobby_members(), vec![2]);
    }

    #[test]
    fn first_game_subscriber_creates_the_set() {
        let mut registry = SubscriptionRegistry::new();
        assert!(!registry.has_game_set("g1"));
        registry.subscribe_game("g1", 1);
        assert!(registry.has_game_set("g1"));
        assert_eq!(registry.game_members("g1"), vec![1]);
    }

    #[test]
    fn last_unsubscribe_discards_the_set() {
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe_game("g1", 1);
        registry.subscribe_game("g1", 2);
        registry.unsubscribe_game("g1", 1);
        assert!(registry.has_game_set("g1"));
        registry.unsubscribe_game("g1", 2);
        assert!(!registry.has_game_set("g1"));
    }

    #[test]
    fn unknown_game_members_are_empty_not_an_error() {
        let registry = SubscriptionRegistry::new();
        assert!(registry.game_members("missing").is_empty());
    }

    #[test]
    fn remove_client_clears_every_registry() {
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe_lobby(1);
        registry.subscribe_game("g1", 1);
        registry.subscribe_game("g2", 1);
        registry.subscribe_game("g2", 2);

        registry.remove_client(1);
        assert!(registry.lobby_members().is_empty());
        assert!(!registry.has_game_set("g1"));
        assert_eq!(registry.game_members("g2"), vec![2]);
    }
}
