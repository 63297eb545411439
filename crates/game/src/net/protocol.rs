use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Team;

pub const DEFAULT_PORT: u16 = 5556;
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

pub const ACTION_PLAY_CARD: &str = "play_card";
pub const ACTION_EMOTE: &str = "emote";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    QueueJoin,
    QueueLeave,
    MatchFound,
    GameAction,
    Disconnect,
    Heartbeat,
    Error,
}

/// One framed message on the wire: `{"type": .., "data": {..}, "timestamp": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid message json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Message {
    pub fn new<T: Serialize>(kind: MessageType, payload: &T) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind,
            data: serde_json::to_value(payload)?,
            timestamp: unix_time(),
        })
    }

    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        Ok(T::deserialize(&self.data)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn unix_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJoin {
    pub player_id: String,
    #[serde(default)]
    pub deck: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueLeave {
    pub player_id: String,
}

/// Sent to each half of a new pairing. `side` is the seat the receiver
/// plays from; the other peer gets the opposite one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFound {
    pub player_id: String,
    pub opponent_id: String,
    pub side: Team,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAction {
    pub player_id: String,
    pub action_type: String,
    #[serde(default)]
    pub action_data: Value,
}

/// `play_card` action data. Coordinates are in the sender's local frame
/// and `side` is the sender's seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayCardData {
    pub card_name: String,
    pub pos_x: f32,
    pub pos_y: f32,
    pub side: Team,
    pub is_spell: bool,
    pub network_ids: Vec<String>,
    pub target_tick: u64,
    /// Sender's hand slot, so their own echo settles the right card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmoteData {
    pub text: String,
    pub side: Team,
    pub target_tick: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disconnect {
    pub player_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let message = Message::new(
            MessageType::MatchFound,
            &MatchFound {
                player_id: "a".into(),
                opponent_id: "b".into(),
                side: Team::Enemy,
            },
        )
        .unwrap();
        let json: Value = serde_json::from_slice(&message.encode().unwrap()).unwrap();

        assert_eq!(json["type"], "MATCH_FOUND");
        assert_eq!(json["data"]["side"], "enemy");
        assert!(json["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn decodes_foreign_json() {
        let raw = br#"{"type": "GAME_ACTION", "data": {"player_id": "p1", "action_type": "play_card",
            "action_data": {"card_name": "knight", "pos_x": 152.0, "pos_y": 498.0, "side": "player",
            "is_spell": false, "network_ids": ["n1"], "target_tick": 42}}, "timestamp": 1.5}"#;
        let message = Message::decode(raw).unwrap();
        assert_eq!(message.kind, MessageType::GameAction);

        let action: GameAction = message.payload().unwrap();
        let play: PlayCardData = serde_json::from_value(action.action_data).unwrap();
        assert_eq!(play.card_name, "knight");
        assert_eq!(play.side, Team::Player);
        assert_eq!(play.target_tick, 42);
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(Message::decode(br#"{"type": "TELEPORT", "data": {}}"#).is_err());
        assert!(Message::decode(b"not json").is_err());
    }
}
