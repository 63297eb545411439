use std::collections::VecDeque;

use glam::Vec2;

use crate::cards::CardId;
use crate::entity::{NetworkId, Team};

#[derive(Debug, Clone, PartialEq)]
pub struct CardPlay {
    pub card: CardId,
    pub team: Team,
    /// Deploy point in the local frame.
    pub position: Vec2,
    pub network_ids: Vec<NetworkId>,
    /// Local hand slot the card was played from. Only set on our own plays.
    pub hand_slot: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BattleAction {
    PlayCard(CardPlay),
    Emote { team: Team, text: String },
}

impl BattleAction {
    fn order_key(&self) -> Option<&str> {
        match self {
            Self::PlayCard(play) => play.network_ids.first().map(NetworkId::as_str),
            Self::Emote { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAction {
    pub target_tick: u64,
    pub action: BattleAction,
}

/// Actions waiting for their tick. Kept sorted by target tick, then by the
/// first network id, so both peers run same-tick actions in the same order
/// whatever order they arrived in.
#[derive(Debug, Default)]
pub struct ActionScheduler {
    actions: VecDeque<ScheduledAction>,
}

impl ActionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scheduled: ScheduledAction) {
        let key = (scheduled.target_tick, scheduled.action.order_key());
        let index = self
            .actions
            .partition_point(|a| (a.target_tick, a.action.order_key()) <= key);
        self.actions.insert(index, scheduled);
    }

    /// Removes and returns every action due at or before `tick`. Late
    /// arrivals run at the first tick that drains them.
    pub fn drain_due(&mut self, tick: u64) -> Vec<ScheduledAction> {
        let due = self.actions.partition_point(|a| a.target_tick <= tick);
        self.actions.drain(..due).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
