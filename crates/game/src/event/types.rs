use glam::Vec2;

use crate::cards::{CardId, SpellKind, TowerKind, UnitKind};
use crate::entity::{NetworkId, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Team),
    Draw,
}

/// Things that happened during a tick, for presentation and logging.
/// Nothing in the simulation reads these back.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    CardPlayed {
        team: Team,
        card: CardId,
        position: Vec2,
    },
    UnitSpawned {
        id: NetworkId,
        team: Team,
        kind: UnitKind,
    },
    SpellCast {
        id: NetworkId,
        team: Team,
        kind: SpellKind,
        target: Vec2,
    },
    ProjectileLaunched {
        id: NetworkId,
        source: NetworkId,
        target: NetworkId,
    },
    MeleeHit {
        attacker: NetworkId,
        target: NetworkId,
        position: Vec2,
    },
    SpellImpact {
        id: NetworkId,
        position: Vec2,
        hits: usize,
    },
    EntityDestroyed {
        id: NetworkId,
        team: Team,
    },
    TowerDestroyed {
        id: NetworkId,
        team: Team,
        kind: TowerKind,
    },
    KingActivated {
        team: Team,
    },
    Emote {
        team: Team,
        text: String,
    },
    SuddenDeath,
    GameOver {
        outcome: Outcome,
    },
}

impl BattleEvent {
    /// Cosmetic events may be dropped when the queue overflows.
    pub fn is_cosmetic(&self) -> bool {
        matches!(
            self,
            Self::MeleeHit { .. } | Self::ProjectileLaunched { .. } | Self::SpellImpact { .. }
        )
    }
}
