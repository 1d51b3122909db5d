use serde_json::Value;

use crate::types::Difficulty;

/// Inbound lobby-channel messages. Unrecognized or unusable payloads parse
/// to `None` and are ignored, keeping the protocol forward-compatible.
#[derive(Debug, PartialEq, Eq)]
pub enum LobbyClientMessage {
    Create,
    CreateAiGame {
        username: String,
        difficulty: Difficulty,
    },
    JoinGame {
        game_id: String,
        username: String,
    },
    GetLeaderboard,
}

/// Inbound game-channel messages. A recognized `move` with a missing or
/// non-integer position still parses; the handler rejects it as an invalid
/// move rather than dropping it.
#[derive(Debug, PartialEq, Eq)]
pub enum GameClientMessage {
    Move { position: Option<i64> },
    AiMove,
    Reset,
}

pub fn parse_lobby_message(raw: &str) -> Option<LobbyClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "create" => Some(LobbyClientMessage::Create),
        "create_ai_game" => {
            let username = object.get("username")?.as_str()?.to_string();
            let difficulty = object
                .get("difficulty")
                .and_then(Value::as_str)
                .and_then(Difficulty::parse)
                .unwrap_or(Difficulty::Impossible);
            Some(LobbyClientMessage::CreateAiGame {
                username,
                difficulty,
            })
        }
        "join_game" => {
            let game_id = object.get("gameId")?.as_str()?.to_string();
            let username = object.get("username")?.as_str()?.to_string();
            Some(LobbyClientMessage::JoinGame { game_id, username })
        }
        "get_leaderboard" => Some(LobbyClientMessage::GetLeaderboard),
        _ => None,
    }
}

pub fn parse_game_message(raw: &str) -> Option<GameClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "move" => Some(GameClientMessage::Move {
            position: object.get("position").and_then(Value::as_i64),
        }),
        "ai_move" => Some(GameClientMessage::AiMove),
        "reset" => Some(GameClientMessage::Reset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_create_message() {
        assert_eq!(
            parse_lobby_message(r#"{"type":"create"}"#),
            Some(LobbyClientMessage::Create)
        );
    }

    #[test]
    fn parse_create_ai_game_message() {
        let parsed =
            parse_lobby_message(r#"{"type":"create_ai_game","username":"A","difficulty":"easy"}"#)
                .expect("create_ai_game should parse");
        assert_eq!(
            parsed,
            LobbyClientMessage::CreateAiGame {
                username: "A".to_string(),
                difficulty: Difficulty::Easy,
            }
        );
    }

    #[test]
    fn create_ai_game_defaults_to_impossible_difficulty() {
        let parsed = parse_lobby_message(r#"{"type":"create_ai_game","username":"A"}"#)
            .expect("create_ai_game should parse");
        assert_eq!(
            parsed,
            LobbyClientMessage::CreateAiGame {
                username: "A".to_string(),
                difficulty: Difficulty::Impossible,
            }
        );
    }

    #[test]
    fn create_ai_game_without_username_is_dropped() {
        assert_eq!(parse_lobby_message(r#"{"type":"create_ai_game"}"#), None);
    }

    #[test]
    fn parse_join_game_message() {
        let parsed = parse_lobby_message(r#"{"type":"join_game","gameId":"g1","username":"B"}"#)
            .expect("join_game should parse");
        assert_eq!(
            parsed,
            LobbyClientMessage::JoinGame {
                game_id: "g1".to_string(),
                username: "B".to_string(),
            }
        );
    }

    #[test]
    fn unknown_lobby_types_parse_to_none() {
        assert_eq!(parse_lobby_message(r#"{"type":"dance"}"#), None);
        assert_eq!(parse_lobby_message("not json"), None);
        assert_eq!(parse_lobby_message(r#"[1,2,3]"#), None);
    }

    #[test]
    fn parse_move_message() {
        assert_eq!(
            parse_game_message(r#"{"type":"move","position":4}"#),
            Some(GameClientMessage::Move { position: Some(4) })
        );
    }

    #[test]
    fn move_without_integer_position_still_parses() {
        // The handler rejects these as invalid moves instead of silently
        // dropping the message.
        assert_eq!(
            parse_game_message(r#"{"type":"move"}"#),
            Some(GameClientMessage::Move { position: None })
        );
        assert_eq!(
            parse_game_message(r#"{"type":"move","position":2.5}"#),
            Some(GameClientMessage::Move { position: None })
        );
        assert_eq!(
            parse_game_message(r#"{"type":"move","position":"4"}"#),
            Some(GameClientMessage::Move { position: None })
        );
    }

    #[test]
    fn parse_ai_move_and_reset_messages() {
        assert_eq!(
            parse_game_message(r#"{"type":"ai_move"}"#),
            Some(GameClientMessage::AiMove)
        );
        assert_eq!(
            parse_game_message(r#"{"type":"reset"}"#),
            Some(GameClientMessage::Reset)
        );
    }

    #[test]
    fn unknown_game_types_parse_to_none() {
        assert_eq!(parse_game_message(r#"{"type":"undo"}"#), None);
        assert_eq!(parse_game_message("{}"), None);
    }
}
