use glam::Vec2;

use crate::event::BattleEvent;
use crate::map::Arena;
use crate::simulation::SimulationConfig;
use crate::world::World;

use super::{Entity, NetworkId, ProjectileIntent, SpellIntent, TowerIntent, UnitIntent};

/// Read-only view handed to every entity during the think pass.
pub struct ThinkContext<'a> {
    pub world: &'a World,
    pub arena: &'a Arena,
    pub config: &'a SimulationConfig,
    pub dt: f32,
}

pub struct ApplyContext<'a> {
    pub config: &'a SimulationConfig,
    pub dt: f32,
}

/// Decision produced by `think`, stored by `stage`.
#[derive(Debug, Clone, Default)]
pub enum Intent {
    #[default]
    Idle,
    Unit(UnitIntent),
    Tower(TowerIntent),
    Projectile(ProjectileIntent),
    Spell(SpellIntent),
}

/// A change an entity wants made to something other than itself.
/// Effects are resolved in emission order right after the emitter applies.
#[derive(Debug, Clone)]
pub enum Effect {
    Damage { target: NetworkId, amount: f32 },
    Push { target: NetworkId, offset: Vec2 },
    Nudge { target: NetworkId },
    Spawn(Box<Entity>),
    Event(BattleEvent),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    pub killed: bool,
    pub king_activated: bool,
}

/// The per-tick phases every entity takes part in. Each phase runs over
/// all entities in network id order before the next phase starts.
pub trait Lifecycle {
    /// Clears per-tick scratch state.
    fn prepare(&mut self);

    /// Decides this tick's move, attack and pushes against the unmodified
    /// world. No entity sees another's decision from the same tick.
    fn think(&self, ctx: &ThinkContext<'_>) -> Intent;

    fn stage(&mut self, intent: Intent);

    /// Commits staged actions. Changes to other entities go out as effects.
    fn apply(&mut self, ctx: &ApplyContext<'_>, effects: &mut Vec<Effect>);

    /// Presentation-only state.
    fn animate(&mut self, dt: f32);
}
