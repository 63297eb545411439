use glam::Vec2;
use serde_json::Value;

use crate::cards::CardId;
use crate::entity::{NetworkId, Team};
use crate::map::flip_pos;
use crate::simulation::{Battle, BattleAction, CardPlay, Outbound, PlayRequest, ScheduledAction};

use super::client::{ClientEvent, NetworkClient};
use super::protocol::{ACTION_EMOTE, ACTION_PLAY_CARD, EmoteData, GameAction, PlayCardData};

/// Bridges one battle to the relay: ships local plays out and schedules
/// every echoed action, mirroring the ones that came from the other seat.
pub struct NetworkController {
    client: NetworkClient,
    side: Team,
    status: Option<String>,
    actions_sent: u64,
    actions_received: u64,
}

impl NetworkController {
    pub fn new(client: NetworkClient, side: Team) -> Self {
        Self {
            client,
            side,
            status: None,
            actions_sent: 0,
            actions_received: 0,
        }
    }

    pub fn side(&self) -> Team {
        self.side
    }

    pub fn client(&self) -> &NetworkClient {
        &self.client
    }

    /// Last user-facing problem, e.g. a lost connection.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn actions_sent(&self) -> u64 {
        self.actions_sent
    }

    pub fn actions_received(&self) -> u64 {
        self.actions_received
    }

    /// Call once per frame before stepping the battle.
    pub fn update(&mut self, battle: &mut Battle) {
        for outbound in battle.drain_outbox() {
            self.send(outbound);
        }
        self.client.heartbeat();

        for event in self.client.poll() {
            match event {
                ClientEvent::Action(action) => {
                    self.actions_received += 1;
                    if let Some(scheduled) = schedule_remote(self.side, &action) {
                        battle.schedule(scheduled);
                    }
                }
                ClientEvent::Disconnected { reason } => {
                    log::warn!("lost relay: {}", reason);
                    self.status = Some(reason);
                    battle.go_offline();
                }
                ClientEvent::ServerError(message) => {
                    log::warn!("relay error: {}", message);
                    self.status = Some(message);
                }
                ClientEvent::MatchFound(found) => {
                    log::debug!("ignoring match offer from {} mid battle", found.opponent_id);
                }
            }
        }
    }

    pub fn disconnect(&mut self, reason: &str) {
        self.client.disconnect(reason);
    }

    fn send(&mut self, outbound: Outbound) {
        let (action_type, data) = match outbound {
            Outbound::Play(request) => (ACTION_PLAY_CARD, encode_play(&request, self.side)),
            Outbound::Emote { text, target_tick } => (
                ACTION_EMOTE,
                serde_json::to_value(EmoteData {
                    text,
                    side: self.side,
                    target_tick,
                }),
            ),
        };
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                log::warn!("could not encode {}: {}", action_type, e);
                return;
            }
        };
        if self.client.send_action(action_type, data) {
            self.actions_sent += 1;
        } else {
            self.status = Some("connection failed".to_owned());
        }
    }
}

pub fn encode_play(request: &PlayRequest, side: Team) -> serde_json::Result<Value> {
    serde_json::to_value(PlayCardData {
        card_name: request.card.name().to_owned(),
        pos_x: request.position.x,
        pos_y: request.position.y,
        side,
        is_spell: request.card.is_spell(),
        network_ids: request
            .network_ids
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect(),
        target_tick: request.target_tick,
        hand_index: Some(request.hand_index),
    })
}

/// Turns an echoed action into a scheduled one. Our own echoes run as the
/// local player in our frame; the opponent's are mirrored onto the enemy
/// team. Unknown or malformed actions are dropped.
pub fn schedule_remote(own_side: Team, action: &GameAction) -> Option<ScheduledAction> {
    let perspective = |side: Team, position: Vec2| {
        if side == own_side {
            (Team::Player, position)
        } else {
            (Team::Enemy, flip_pos(position))
        }
    };

    match action.action_type.as_str() {
        ACTION_PLAY_CARD => {
            let data: PlayCardData = decode(action)?;
            let Some(card) = CardId::from_name(&data.card_name) else {
                log::warn!("unknown card {} from {}", data.card_name, action.player_id);
                return None;
            };
            let (team, position) = perspective(data.side, Vec2::new(data.pos_x, data.pos_y));
            let hand_slot = if data.side == own_side { data.hand_index } else { None };
            Some(ScheduledAction {
                target_tick: data.target_tick,
                action: BattleAction::PlayCard(CardPlay {
                    card,
                    team,
                    position,
                    network_ids: data.network_ids.into_iter().map(NetworkId::from).collect(),
                    hand_slot,
                }),
            })
        }
        ACTION_EMOTE => {
            let data: EmoteData = decode(action)?;
            let (team, _) = perspective(data.side, Vec2::ZERO);
            Some(ScheduledAction {
                target_tick: data.target_tick,
                action: BattleAction::Emote {
                    team,
                    text: data.text,
                },
            })
        }
        other => {
            log::debug!("ignoring unknown action {} from {}", other, action.player_id);
            None
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(action: &GameAction) -> Option<T> {
    T::deserialize(&action.action_data)
        .map_err(|e| log::warn!("bad {} data from {}: {}", action.action_type, action.player_id, e))
        .ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cards::UnitKind;

    fn knight_action(side: Team) -> GameAction {
        GameAction {
            player_id: "p1".into(),
            action_type: ACTION_PLAY_CARD.into(),
            action_data: json!({
                "card_name": "knight",
                "pos_x": 152.0,
                "pos_y": 498.0,
                "side": side,
                "is_spell": false,
                "network_ids": ["abc"],
                "target_tick": 30,
                "hand_index": 2,
            }),
        }
    }

    fn play_of(scheduled: ScheduledAction) -> CardPlay {
        match scheduled.action {
            BattleAction::PlayCard(play) => play,
            other => panic!("expected a card play, got {:?}", other),
        }
    }

    #[test]
    fn own_echo_runs_unmirrored() {
        let scheduled = schedule_remote(Team::Player, &knight_action(Team::Player)).unwrap();
        assert_eq!(scheduled.target_tick, 30);
        let play = play_of(scheduled);
        assert_eq!(play.card, CardId::Unit(UnitKind::Knight));
        assert_eq!(play.team, Team::Player);
        assert_eq!(play.position, Vec2::new(152.0, 498.0));
        assert_eq!(play.network_ids, vec![NetworkId::from("abc")]);
        assert_eq!(play.hand_slot, Some(2));
    }

    #[test]
    fn opponent_action_is_mirrored() {
        let play = play_of(schedule_remote(Team::Enemy, &knight_action(Team::Player)).unwrap());
        assert_eq!(play.team, Team::Enemy);
        assert_eq!(play.position, Vec2::new(328.0, 194.0));
        assert_eq!(play.hand_slot, None);
    }

    #[test]
    fn echo_without_a_slot_still_schedules() {
        let mut action = knight_action(Team::Player);
        action.action_data.as_object_mut().unwrap().remove("hand_index");
        let play = play_of(schedule_remote(Team::Player, &action).unwrap());
        assert_eq!(play.hand_slot, None);
    }

    #[test]
    fn drops_unknown_actions() {
        let mut action = knight_action(Team::Player);
        action.action_type = "teleport".into();
        assert!(schedule_remote(Team::Player, &action).is_none());

        let mut action = knight_action(Team::Player);
        action.action_data = json!({"card_name": "dragon_king"});
        assert!(schedule_remote(Team::Player, &action).is_none());
    }

    #[test]
    fn play_round_trips_through_json() {
        let request = PlayRequest {
            card: CardId::Unit(UnitKind::Minions),
            position: Vec2::new(200.0, 450.0),
            network_ids: vec!["a".into(), "b".into(), "c".into()],
            target_tick: 77,
            hand_index: 3,
        };
        let action = GameAction {
            player_id: "p2".into(),
            action_type: ACTION_PLAY_CARD.into(),
            action_data: encode_play(&request, Team::Enemy).unwrap(),
        };
        let play = play_of(schedule_remote(Team::Enemy, &action).unwrap());
        assert_eq!(play.position, request.position);
        assert_eq!(play.network_ids, request.network_ids);
        assert_eq!(play.hand_slot, Some(3));
    }

    #[test]
    fn emotes_keep_their_side() {
        let action = GameAction {
            player_id: "p2".into(),
            action_type: ACTION_EMOTE.into(),
            action_data: json!({"text": "gg", "side": "enemy", "target_tick": 5}),
        };
        let scheduled = schedule_remote(Team::Player, &action).unwrap();
        assert_eq!(
            scheduled.action,
            BattleAction::Emote {
                team: Team::Enemy,
                text: "gg".into()
            }
        );
    }
}
