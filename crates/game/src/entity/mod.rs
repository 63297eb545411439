mod hitbox;
mod phase;
mod projectile;
mod spell;
mod tower;
mod unit;

use std::fmt;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use hitbox::Hitbox;
pub use phase::{ApplyContext, DamageOutcome, Effect, Intent, Lifecycle, ThinkContext};
pub use projectile::{Projectile, ProjectileIntent};
pub use spell::{Spell, SpellIntent, SpellPhase};
pub use tower::{Tower, TowerIntent};
pub use unit::{Deployment, Unit, UnitIntent};

/// Identifier shared by both peers for the same logical entity. Ordering
/// on this id fixes the iteration order of every simulation phase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Id for the `n`th thing this entity creates, such as a projectile.
    pub fn child(&self, n: u32) -> Self {
        Self(format!("{}#{n}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetworkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NetworkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Side relative to the local frame. `Player` is always the bottom half.
/// On the wire the same names describe the absolute side a peer was seated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Domains: u8 {
        const GROUND = 1 << 0;
        const AIR = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementDomain {
    Ground,
    Air,
}

impl MovementDomain {
    pub fn as_flag(self) -> Domains {
        match self {
            Self::Ground => Domains::GROUND,
            Self::Air => Domains::AIR,
        }
    }
}

/// Identity, placement and health of anything that can be attacked.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: NetworkId,
    pub team: Team,
    pub position: Vec2,
    pub hitbox: Hitbox,
    pub health: f32,
    pub max_health: f32,
}

impl Body {
    pub fn new(id: NetworkId, team: Team, position: Vec2, hitbox: Hitbox, health: f32) -> Self {
        Self {
            id,
            team,
            position,
            hitbox,
            health,
            max_health: health,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn edge_distance(&self, other: &Body) -> f32 {
        self.hitbox
            .edge_distance(self.position, &other.hitbox, other.position)
    }

    /// Returns true when this hit is the killing blow. Hits on an already
    /// dead body change nothing.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health -= amount;
        !self.is_alive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attack {
    pub damage: f32,
    pub range: f32,
    pub cooldown: f32,
    /// Seconds since the last attack.
    pub last_attack_time: f32,
}

impl Attack {
    pub fn new(damage: f32, range: f32, cooldown: f32) -> Self {
        Self {
            damage,
            range,
            cooldown,
            last_attack_time: 0.0,
        }
    }

    pub fn ready(&self) -> bool {
        self.last_attack_time >= self.cooldown
    }

    pub fn in_range(&self, edge_distance: f32, epsilon: f32) -> bool {
        edge_distance <= self.range + epsilon
    }
}

#[derive(Debug, Clone)]
pub enum Entity {
    Unit(Unit),
    Tower(Tower),
    Projectile(Projectile),
    Spell(Spell),
}

impl Entity {
    pub fn id(&self) -> &NetworkId {
        match self {
            Self::Unit(unit) => &unit.body.id,
            Self::Tower(tower) => &tower.body.id,
            Self::Projectile(projectile) => &projectile.id,
            Self::Spell(spell) => &spell.id,
        }
    }

    pub fn team(&self) -> Team {
        match self {
            Self::Unit(unit) => unit.body.team,
            Self::Tower(tower) => tower.body.team,
            Self::Projectile(projectile) => projectile.team,
            Self::Spell(spell) => spell.team,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            Self::Unit(unit) => unit.body.position,
            Self::Tower(tower) => tower.body.position,
            Self::Projectile(projectile) => projectile.position,
            Self::Spell(spell) => spell.position,
        }
    }

    pub fn body(&self) -> Option<&Body> {
        match self {
            Self::Unit(unit) => Some(&unit.body),
            Self::Tower(tower) => Some(&tower.body),
            Self::Projectile(_) | Self::Spell(_) => None,
        }
    }

    /// Projectiles and spells stay alive until their effect has finished.
    pub fn is_alive(&self) -> bool {
        match self {
            Self::Unit(unit) => unit.body.is_alive(),
            Self::Tower(tower) => tower.body.is_alive(),
            Self::Projectile(projectile) => !projectile.finished,
            Self::Spell(spell) => spell.phase != SpellPhase::Dead,
        }
    }

    /// Living units and towers can be attacked.
    pub fn is_targetable(&self) -> bool {
        self.body().is_some_and(Body::is_alive)
    }

    pub fn domain(&self) -> Option<MovementDomain> {
        match self {
            Self::Unit(unit) => Some(unit.domain),
            Self::Tower(_) => Some(MovementDomain::Ground),
            Self::Projectile(_) | Self::Spell(_) => None,
        }
    }

    pub fn as_unit(&self) -> Option<&Unit> {
        match self {
            Self::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_unit_mut(&mut self) -> Option<&mut Unit> {
        match self {
            Self::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_tower(&self) -> Option<&Tower> {
        match self {
            Self::Tower(tower) => Some(tower),
            _ => None,
        }
    }

    pub fn as_tower_mut(&mut self) -> Option<&mut Tower> {
        match self {
            Self::Tower(tower) => Some(tower),
            _ => None,
        }
    }

    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        match self {
            Self::Unit(unit) => DamageOutcome {
                killed: unit.body.take_damage(amount),
                king_activated: false,
            },
            Self::Tower(tower) => tower.take_damage(amount),
            Self::Projectile(_) | Self::Spell(_) => DamageOutcome::default(),
        }
    }
}

impl Lifecycle for Entity {
    fn prepare(&mut self) {
        match self {
            Self::Unit(unit) => unit.prepare(),
            Self::Tower(tower) => tower.prepare(),
            Self::Projectile(projectile) => projectile.prepare(),
            Self::Spell(spell) => spell.prepare(),
        }
    }

    fn think(&self, ctx: &ThinkContext<'_>) -> Intent {
        match self {
            Self::Unit(unit) => unit.think(ctx),
            Self::Tower(tower) => tower.think(ctx),
            Self::Projectile(projectile) => projectile.think(ctx),
            Self::Spell(spell) => spell.think(ctx),
        }
    }

    fn stage(&mut self, intent: Intent) {
        match self {
            Self::Unit(unit) => unit.stage(intent),
            Self::Tower(tower) => tower.stage(intent),
            Self::Projectile(projectile) => projectile.stage(intent),
            Self::Spell(spell) => spell.stage(intent),
        }
    }

    fn apply(&mut self, ctx: &ApplyContext<'_>, effects: &mut Vec<Effect>) {
        match self {
            Self::Unit(unit) => unit.apply(ctx, effects),
            Self::Tower(tower) => tower.apply(ctx, effects),
            Self::Projectile(projectile) => projectile.apply(ctx, effects),
            Self::Spell(spell) => spell.apply(ctx, effects),
        }
    }

    fn animate(&mut self, dt: f32) {
        match self {
            Self::Unit(unit) => unit.animate(dt),
            Self::Tower(tower) => tower.animate(dt),
            Self::Projectile(projectile) => projectile.animate(dt),
            Self::Spell(spell) => spell.animate(dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![NetworkId::new("b"), NetworkId::new("a#1"), NetworkId::new("a")];
        ids.sort();
        assert_eq!(ids, vec!["a".into(), "a#1".into(), NetworkId::new("b")]);
    }

    #[test]
    fn dead_bodies_ignore_damage() {
        let mut body = Body::new("t".into(), Team::Player, Vec2::ZERO, Hitbox::circle(10.0), 50.0);
        assert!(!body.take_damage(20.0));
        assert!(body.take_damage(40.0));
        assert!(!body.take_damage(40.0));
        assert_eq!(body.health, -10.0);
    }

    #[test]
    fn team_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Team::Enemy).unwrap(), "\"enemy\"");
    }
}
