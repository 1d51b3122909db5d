pub mod ai;
pub mod elo;
pub mod game;
pub mod game_store;
pub mod hub;
pub mod rating_store;
pub mod rng;
pub mod server_protocol;
pub mod subscriptions;
pub mod types;
