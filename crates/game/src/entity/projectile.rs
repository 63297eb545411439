use glam::Vec2;

use crate::cards::ProjectileKind;

use super::{ApplyContext, Effect, Intent, Lifecycle, NetworkId, Team, ThinkContext};

/// Distance at which a projectile counts as having reached its target.
const HIT_RADIUS: f32 = 10.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectileIntent {
    /// Where the target stands now, or `None` if it is gone.
    pub target_position: Option<Vec2>,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: NetworkId,
    pub source: NetworkId,
    pub team: Team,
    pub position: Vec2,
    pub target: NetworkId,
    pub damage: f32,
    pub kind: ProjectileKind,
    pub speed: f32,
    pub rotation: f32,
    pub has_dealt_damage: bool,
    pub finished: bool,
    pending_target: Option<Vec2>,
}

impl Projectile {
    pub fn launch(
        id: NetworkId,
        source: NetworkId,
        team: Team,
        position: Vec2,
        target: NetworkId,
        damage: f32,
        kind: ProjectileKind,
    ) -> Self {
        Self {
            id,
            source,
            team,
            position,
            target,
            damage,
            kind,
            speed: kind.speed(),
            rotation: 0.0,
            has_dealt_damage: false,
            finished: false,
            pending_target: None,
        }
    }

    fn hit(&mut self, effects: &mut Vec<Effect>) {
        if !self.has_dealt_damage {
            self.has_dealt_damage = true;
            effects.push(Effect::Damage {
                target: self.target.clone(),
                amount: self.damage,
            });
        }
        self.finished = true;
    }
}

impl Lifecycle for Projectile {
    fn prepare(&mut self) {
        self.pending_target = None;
    }

    fn think(&self, ctx: &ThinkContext<'_>) -> Intent {
        let target_position = ctx
            .world
            .get(&self.target)
            .filter(|target| target.is_targetable())
            .map(|target| target.position());
        Intent::Projectile(ProjectileIntent { target_position })
    }

    fn stage(&mut self, intent: Intent) {
        if let Intent::Projectile(intent) = intent {
            self.pending_target = intent.target_position;
        }
    }

    fn apply(&mut self, ctx: &ApplyContext<'_>, effects: &mut Vec<Effect>) {
        if self.finished {
            return;
        }
        let Some(goal) = self.pending_target else {
            // Target died before impact.
            self.finished = true;
            return;
        };

        let direction = (goal - self.position).normalize_or_zero();
        self.position += direction * self.speed * ctx.dt;
        if direction != Vec2::ZERO {
            self.rotation = direction.y.atan2(direction.x);
        }
        if self.position.distance(goal) < HIT_RADIUS {
            self.hit(effects);
        }
    }

    fn animate(&mut self, _dt: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimulationConfig;

    fn arrow() -> Projectile {
        Projectile::launch(
            "a#0".into(),
            "a".into(),
            Team::Player,
            Vec2::ZERO,
            "t".into(),
            50.0,
            ProjectileKind::Arrow,
        )
    }

    #[test]
    fn damages_once_on_arrival() {
        let config = SimulationConfig::default();
        let ctx = ApplyContext { config: &config, dt: 1.0 / 60.0 };
        let mut projectile = arrow();
        let mut effects = Vec::new();

        for _ in 0..30 {
            projectile.stage(Intent::Projectile(ProjectileIntent {
                target_position: Some(Vec2::new(20.0, 0.0)),
            }));
            projectile.apply(&ctx, &mut effects);
        }

        assert!(projectile.finished);
        let hits = effects
            .iter()
            .filter(|e| matches!(e, Effect::Damage { .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn vanishes_when_target_is_gone() {
        let config = SimulationConfig::default();
        let mut projectile = arrow();
        let mut effects = Vec::new();
        projectile.stage(Intent::Projectile(ProjectileIntent::default()));
        projectile.apply(&ApplyContext { config: &config, dt: 0.1 }, &mut effects);
        assert!(projectile.finished);
        assert!(effects.is_empty());
    }
}
