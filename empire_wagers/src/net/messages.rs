//! Wire messages exchanged with the game server.
//!
//! Every frame is a JSON text frame tagged by a `type` field, except the bare
//! keepalive token. Field names vary between server builds, so inbound
//! shapes accept the camelCase and snake_case spellings.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use super::{
    super::game::{
        entities::{Card, ChatMessage, PlayerId, RoundResult},
        modifier::ModifierKey,
    },
    errors::Result,
};

/// Liveness token sent on the keepalive timer. Not JSON.
pub const KEEPALIVE_TOKEN: &str = "ping";

/// A roster entry as sent by the server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct PlayerEntry {
    #[serde(default, alias = "player_id", alias = "playerId")]
    pub id: Option<PlayerId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hp: Option<u32>,
}

/// A full roster, either as a list of entries or as an object keyed by id.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum RosterUpdate {
    List(Vec<PlayerEntry>),
    Keyed(BTreeMap<PlayerId, PlayerEntry>),
}

impl RosterUpdate {
    /// Pair every entry with its id. List entries without an id are skipped.
    #[must_use]
    pub fn into_entries(self) -> Vec<(PlayerId, PlayerEntry)> {
        match self {
            Self::List(entries) => entries
                .into_iter()
                .filter_map(|entry| match entry.id.clone() {
                    Some(id) => Some((id, entry)),
                    None => {
                        log::warn!("skipping roster entry without an id: {entry:?}");
                        None
                    }
                })
                .collect(),
            Self::Keyed(entries) => entries
                .into_iter()
                .map(|(key, entry)| (entry.id.clone().unwrap_or(key), entry))
                .collect(),
        }
    }
}

/// A decoded server event.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The room is still forming.
    Waiting {
        #[serde(alias = "roomId")]
        room_id: String,
        #[serde(alias = "playerCount", alias = "players")]
        player_count: u32,
        #[serde(default)]
        roster: Option<RosterUpdate>,
    },
    /// A round (and on the first one, the session) begins.
    Start {
        #[serde(default, alias = "localPlayerId", alias = "playerId")]
        player_id: Option<PlayerId>,
        #[serde(default)]
        roster: Option<RosterUpdate>,
    },
    /// A card was dealt to the local player.
    DrawResult { card: Card },
    /// Full replacement of the local hand.
    UpdateHand { hand: Vec<Card> },
    /// The server resolved the round.
    RoundResult {
        results: Vec<RoundResult>,
        #[serde(default)]
        hands: Option<BTreeMap<PlayerId, Vec<Card>>>,
    },
    /// Roster replacement, independent of the round.
    PlayersList {
        #[serde(alias = "players")]
        roster: RosterUpdate,
    },
    /// The game is over.
    GameOver {
        #[serde(default)]
        results: Option<Vec<RoundResult>>,
        #[serde(default, alias = "winnerIds", alias = "winners")]
        winner_ids: Option<Vec<PlayerId>>,
    },
    /// Chat line for the UI.
    Chat(ChatMessage),
}

impl ServerEvent {
    /// The wire discriminant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Waiting { .. } => "waiting",
            Self::Start { .. } => "start",
            Self::DrawResult { .. } => "draw_result",
            Self::UpdateHand { .. } => "update_hand",
            Self::RoundResult { .. } => "round_result",
            Self::PlayersList { .. } => "players_list",
            Self::GameOver { .. } => "game_over",
            Self::Chat(_) => "chat",
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// The local player's decision for the round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Draw,
    Stand,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Draw => "draw",
            Self::Stand => "stand",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionData {
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ModifierKey>,
}

/// Everything the client can send besides the keepalive token.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientIntent {
    Action { action: ActionData },
    Chat(ChatMessage),
}

impl ClientIntent {
    #[must_use]
    pub const fn action(decision: Decision, modifier: Option<ModifierKey>) -> Self {
        Self::Action {
            action: ActionData { decision, modifier },
        }
    }

    #[must_use]
    pub fn chat(user: &str, text: &str) -> Self {
        Self::Chat(ChatMessage {
            user: user.to_string(),
            text: text.to_string(),
        })
    }
}

impl fmt::Display for ClientIntent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Action { action } => match action.modifier {
                Some(modifier) => write!(f, "{} with {modifier}", action.decision),
                None => write!(f, "{}", action.decision),
            },
            Self::Chat(message) => write!(f, "said \"{}\"", message.text),
        }
    }
}

/// Decode an inbound text frame.
///
/// Returns `None` for anything that isn't a recognized event with all of
/// its required fields, including the bare keepalive tokens.
#[must_use]
pub fn decode(frame: &str) -> Option<ServerEvent> {
    match serde_json::from_str::<ServerEvent>(frame.trim()) {
        Ok(event) => Some(event),
        Err(error) => {
            log::debug!("dropping frame {frame:?}: {error}");
            None
        }
    }
}

/// Encode an outbound intent as a text frame.
pub fn encode(intent: &ClientIntent) -> Result<String> {
    Ok(serde_json::to_string(intent)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Rank;
    use serde_json::{Value, json};

    // === Decode: recognized events ===

    #[test]
    fn test_decode_waiting() {
        let event = decode(r#"{"type":"waiting","roomId":"R1","players":1}"#);
        assert_eq!(
            event,
            Some(ServerEvent::Waiting {
                room_id: "R1".to_string(),
                player_count: 1,
                roster: None,
            })
        );
    }

    #[test]
    fn test_decode_start_with_player_id() {
        let event = decode(r#"{"type":"start","player_id":"p1"}"#);
        assert_eq!(
            event,
            Some(ServerEvent::Start {
                player_id: Some(PlayerId::new("p1")),
                roster: None,
            })
        );
    }

    #[test]
    fn test_decode_start_without_fields() {
        let event = decode(r#"{"type":"start"}"#);
        assert_eq!(
            event,
            Some(ServerEvent::Start {
                player_id: None,
                roster: None,
            })
        );
    }

    #[test]
    fn test_decode_draw_result() {
        match decode(r#"{"type":"draw_result","card":{"name":"A"}}"#) {
            Some(ServerEvent::DrawResult { card }) => assert_eq!(card.rank, Rank::Ace),
            other => panic!("Expected draw_result, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_round_result_with_hands() {
        let frame = json!({
            "type": "round_result",
            "results": [{"player_id": "p1", "total": 11, "hp": 60}],
            "hands": {"p1": [{"rank": "A"}], "p2": ["K", "9"]},
        })
        .to_string();
        match decode(&frame) {
            Some(ServerEvent::RoundResult { results, hands }) => {
                assert_eq!(results.len(), 1);
                let hands = hands.unwrap();
                assert_eq!(hands[&PlayerId::new("p2")].len(), 2);
            }
            other => panic!("Expected round_result, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_players_list_keyed() {
        let frame = r#"{"type":"players_list","roster":{"p1":{"name":"Ana","hp":80}}}"#;
        match decode(frame) {
            Some(ServerEvent::PlayersList { roster }) => {
                let entries = roster.into_entries();
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].0, PlayerId::new("p1"));
                assert_eq!(entries[0].1.hp, Some(80));
            }
            other => panic!("Expected players_list, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_players_list_skips_entries_without_id() {
        let frame = r#"{"type":"players_list","players":[{"id":"p1"},{"name":"ghost"}]}"#;
        match decode(frame) {
            Some(ServerEvent::PlayersList { roster }) => {
                assert_eq!(roster.into_entries().len(), 1);
            }
            other => panic!("Expected players_list, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_game_over_minimal() {
        assert_eq!(
            decode(r#"{"type":"game_over"}"#),
            Some(ServerEvent::GameOver {
                results: None,
                winner_ids: None,
            })
        );
    }

    #[test]
    fn test_decode_game_over_winners() {
        match decode(r#"{"type":"game_over","winnerIds":["p2",3]}"#) {
            Some(ServerEvent::GameOver { winner_ids, .. }) => assert_eq!(
                winner_ids,
                Some(vec![PlayerId::new("p2"), PlayerId::new("3")])
            ),
            other => panic!("Expected game_over, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_chat() {
        assert_eq!(
            decode(r#"{"type":"chat","user":"ana","text":"gl"}"#),
            Some(ServerEvent::Chat(ChatMessage {
                user: "ana".to_string(),
                text: "gl".to_string(),
            }))
        );
    }

    // === Decode: dropped frames ===

    #[test]
    fn test_decode_keepalive_tokens() {
        assert_eq!(decode("ping"), None);
        assert_eq!(decode("pong"), None);
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_decode_unknown_discriminant() {
        assert_eq!(decode(r#"{"type":"shuffle"}"#), None);
        assert_eq!(decode(r#"{"roomId":"R1"}"#), None);
    }

    #[test]
    fn test_decode_missing_required_fields() {
        assert_eq!(decode(r#"{"type":"waiting","players":1}"#), None);
        assert_eq!(decode(r#"{"type":"draw_result"}"#), None);
        assert_eq!(decode(r#"{"type":"update_hand"}"#), None);
        assert_eq!(decode(r#"{"type":"round_result"}"#), None);
        assert_eq!(decode(r#"{"type":"chat","user":"ana"}"#), None);
    }

    #[test]
    fn test_decode_negative_hp_is_malformed() {
        let frame = r#"{"type":"round_result","results":[{"player_id":"p1","total":3,"hp":-5}]}"#;
        assert_eq!(decode(frame), None);
    }

    #[test]
    fn test_decode_malformed_is_stable() {
        let frame = r#"{"type":"start","#;
        assert_eq!(decode(frame), None);
        assert_eq!(decode(frame), None);
    }

    // === Encode ===

    #[test]
    fn test_encode_draw_without_modifier() {
        let json = encode(&ClientIntent::action(Decision::Draw, None)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, json!({"type": "action", "action": {"decision": "draw"}}));
    }

    #[test]
    fn test_encode_stand_with_modifier() {
        let intent = ClientIntent::action(Decision::Stand, Some(ModifierKey::Pc));
        let value: Value = serde_json::from_str(&encode(&intent).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "action", "action": {"decision": "stand", "modifier": "PC"}})
        );
    }

    #[test]
    fn test_encode_chat() {
        let value: Value =
            serde_json::from_str(&encode(&ClientIntent::chat("ana", "hola")).unwrap()).unwrap();
        assert_eq!(value, json!({"type": "chat", "user": "ana", "text": "hola"}));
    }

    #[test]
    fn test_intent_display() {
        let intent = ClientIntent::action(Decision::Draw, Some(ModifierKey::Sc));
        assert_eq!(intent.to_string(), "draw with SC");
    }
}
