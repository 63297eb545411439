use glam::Vec2;

use crate::cards::{ProjectileKind, TowerKind, TowerStats};
use crate::combat;
use crate::map::TowerSlot;

use super::{
    ApplyContext, Attack, Body, DamageOutcome, Effect, Hitbox, Intent, Lifecycle, NetworkId,
    Team, ThinkContext,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TowerIntent {
    pub target: Option<NetworkId>,
    pub attack: bool,
}

#[derive(Debug, Clone)]
pub struct Tower {
    pub body: Body,
    pub attack: Attack,
    pub kind: TowerKind,
    pub slot: TowerSlot,
    /// King towers sleep until hit or until a princess tower falls.
    pub active: bool,
    pub target: Option<NetworkId>,
    pub pending_attack: bool,
    shots_fired: u32,
}

impl Tower {
    pub fn new(
        id: NetworkId,
        team: Team,
        slot: TowerSlot,
        position: Vec2,
        stats: &TowerStats,
    ) -> Self {
        let kind = slot.kind();
        Self {
            body: Body::new(id, team, position, Hitbox::square(stats.size), stats.health),
            attack: Attack::new(stats.damage, stats.range, stats.attack_cooldown()),
            kind,
            slot,
            active: kind == TowerKind::Princess,
            target: None,
            pending_attack: false,
            shots_fired: 0,
        }
    }

    pub fn id(&self) -> &NetworkId {
        &self.body.id
    }

    pub fn team(&self) -> Team {
        self.body.team
    }

    pub fn size(&self) -> f32 {
        self.body.hitbox.radius() * 2.0
    }

    /// Returns true if this call woke the tower up.
    pub fn activate(&mut self) -> bool {
        let woke = !self.active;
        self.active = true;
        woke
    }

    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        let killed = self.body.take_damage(amount);
        let king_activated = self.kind == TowerKind::King && self.activate();
        DamageOutcome {
            killed,
            king_activated,
        }
    }
}

impl Lifecycle for Tower {
    fn prepare(&mut self) {
        self.pending_attack = false;
    }

    fn think(&self, ctx: &ThinkContext<'_>) -> Intent {
        if !self.active || !self.body.is_alive() {
            return Intent::Tower(TowerIntent::default());
        }
        let target = combat::plan_tower_target(self, ctx);
        let attack = target.is_some() && self.attack.ready();
        Intent::Tower(TowerIntent { target, attack })
    }

    fn stage(&mut self, intent: Intent) {
        if let Intent::Tower(intent) = intent {
            self.target = intent.target;
            self.pending_attack = intent.attack;
        }
    }

    fn apply(&mut self, ctx: &ApplyContext<'_>, effects: &mut Vec<Effect>) {
        self.attack.last_attack_time += ctx.dt;
        if !self.pending_attack {
            return;
        }
        if let Some(target) = self.target.clone() {
            combat::strike(
                &self.body,
                &self.attack,
                ProjectileKind::Basic,
                &mut self.shots_fired,
                target,
                ctx.config,
                effects,
            );
            self.attack.last_attack_time = 0.0;
        }
    }

    fn animate(&mut self, _dt: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;

    fn tower(slot: TowerSlot) -> Tower {
        let registry = CardRegistry::standard();
        Tower::new(
            "tower".into(),
            Team::Enemy,
            slot,
            Vec2::new(240.0, 114.0),
            registry.tower(slot.kind()),
        )
    }

    #[test]
    fn king_wakes_on_first_hit() {
        let mut king = tower(TowerSlot::King);
        assert!(!king.active);
        let outcome = king.take_damage(10.0);
        assert!(king.active);
        assert!(outcome.king_activated);
        assert!(!king.take_damage(10.0).king_activated);
    }

    #[test]
    fn princess_starts_active() {
        let princess = tower(TowerSlot::Left);
        assert!(princess.active);
        assert_eq!(princess.size(), 44.0);
        assert!(!princess.clone().take_damage(1.0).king_activated);
    }
}
