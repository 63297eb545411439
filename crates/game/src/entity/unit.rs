use glam::Vec2;

use crate::cards::{ProjectileKind, TargetPreference, UnitKind, UnitStats};
use crate::combat;
use crate::movement;
use crate::simulation::SimulationConfig;

use super::{
    ApplyContext, Attack, Body, Domains, Effect, Entity, Hitbox, Intent, Lifecycle,
    MovementDomain, NetworkId, Team, ThinkContext,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deployment {
    Deploying { remaining: f32 },
    Active,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitIntent {
    pub target: Option<NetworkId>,
    pub locked_target: bool,
    pub retarget_timer: f32,
    pub movement: Vec2,
    pub attack: bool,
    pub pushes: Vec<(NetworkId, Vec2)>,
    pub nudges: Vec<NetworkId>,
    pub collided: bool,
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub body: Body,
    pub attack: Attack,
    pub kind: UnitKind,
    pub speed: f32,
    pub mass: f32,
    pub domain: MovementDomain,
    pub targets: Domains,
    pub preference: TargetPreference,
    pub projectile: ProjectileKind,
    pub sight_range: f32,

    pub target: Option<NetworkId>,
    /// Set by a successful attack. A locked target is only given up for a
    /// strictly closer one.
    pub locked_target: bool,
    pub retarget_timer: f32,
    /// Set by a collision; forces a retarget on the next think.
    pub nudged: bool,
    pub deployment: Deployment,

    pub pending_move: Vec2,
    pub pending_attack: bool,
    pub pending_pushes: Vec<(NetworkId, Vec2)>,
    pub pending_nudges: Vec<NetworkId>,

    pub last_move_dir: Vec2,
    pub facing_angle: f32,
    pub is_moving: bool,
    pub anim_timer: f32,
    shots_fired: u32,
}

impl Unit {
    pub fn spawn(
        id: NetworkId,
        team: Team,
        position: Vec2,
        kind: UnitKind,
        stats: &UnitStats,
        config: &SimulationConfig,
    ) -> Self {
        let deployment = if config.deploy_time > 0.0 {
            Deployment::Deploying {
                remaining: config.deploy_time,
            }
        } else {
            Deployment::Active
        };
        Self {
            body: Body::new(id, team, position, Hitbox::circle(stats.size), stats.health),
            attack: Attack::new(stats.damage, stats.range, stats.attack_cooldown()),
            kind,
            speed: stats.speed,
            mass: stats.mass,
            domain: stats.domain,
            targets: stats.targets,
            preference: stats.preference,
            projectile: stats.projectile,
            sight_range: config.sight_range(stats.range),
            target: None,
            locked_target: false,
            retarget_timer: 0.0,
            nudged: false,
            deployment,
            pending_move: Vec2::ZERO,
            pending_attack: false,
            pending_pushes: Vec::new(),
            pending_nudges: Vec::new(),
            last_move_dir: Vec2::ZERO,
            facing_angle: match team {
                Team::Player => 270.0,
                Team::Enemy => 90.0,
            },
            is_moving: false,
            anim_timer: 0.0,
            shots_fired: 0,
        }
    }

    pub fn id(&self) -> &NetworkId {
        &self.body.id
    }

    pub fn team(&self) -> Team {
        self.body.team
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn radius(&self) -> f32 {
        self.body.hitbox.radius()
    }

    pub fn is_deploying(&self) -> bool {
        matches!(self.deployment, Deployment::Deploying { .. })
    }

    pub fn can_target(&self, other: &Entity) -> bool {
        other
            .domain()
            .is_some_and(|domain| self.targets.contains(domain.as_flag()))
    }
}

impl Lifecycle for Unit {
    fn prepare(&mut self) {
        self.pending_move = Vec2::ZERO;
        self.pending_attack = false;
        self.pending_pushes.clear();
        self.pending_nudges.clear();
    }

    fn think(&self, ctx: &ThinkContext<'_>) -> Intent {
        if self.is_deploying() {
            return Intent::Idle;
        }

        let mut intent = combat::plan_unit_targeting(self, ctx);
        let target = intent
            .target
            .as_ref()
            .and_then(|id| ctx.world.get(id))
            .and_then(Entity::body);

        match target {
            Some(target) => {
                let distance = self.body.edge_distance(target);
                if self.attack.in_range(distance, ctx.config.range_epsilon) {
                    intent.attack = self.attack.ready();
                } else {
                    let plan = movement::plan_movement(self, target, ctx);
                    intent.movement = plan.movement;
                    intent.pushes = plan.pushes;
                    intent.nudges = plan.nudges;
                    intent.collided = plan.collided;
                }
            }
            None => {
                intent.movement = movement::march_on_king(self, ctx);
            }
        }
        Intent::Unit(intent)
    }

    fn stage(&mut self, intent: Intent) {
        let Intent::Unit(intent) = intent else {
            return;
        };
        self.target = intent.target;
        self.locked_target = intent.locked_target;
        self.retarget_timer = intent.retarget_timer;
        self.nudged = intent.collided;
        self.pending_move = intent.movement;
        self.pending_attack = intent.attack;
        self.pending_pushes = intent.pushes;
        self.pending_nudges = intent.nudges;
    }

    fn apply(&mut self, ctx: &ApplyContext<'_>, effects: &mut Vec<Effect>) {
        if let Deployment::Deploying { remaining } = self.deployment {
            let remaining = remaining - ctx.dt;
            self.deployment = if remaining <= 0.0 {
                Deployment::Active
            } else {
                Deployment::Deploying { remaining }
            };
            return;
        }

        self.attack.last_attack_time += ctx.dt;
        self.is_moving = false;

        if self.pending_attack {
            if let Some(target) = self.target.clone() {
                combat::strike(
                    &self.body,
                    &self.attack,
                    self.projectile,
                    &mut self.shots_fired,
                    target,
                    ctx.config,
                    effects,
                );
                self.attack.last_attack_time = 0.0;
                self.locked_target = true;
            }
        }

        for (target, offset) in self.pending_pushes.drain(..) {
            effects.push(Effect::Push { target, offset });
        }
        for target in self.pending_nudges.drain(..) {
            effects.push(Effect::Nudge { target });
        }

        if self.pending_move.length_squared() > 0.0 {
            self.body.position += self.pending_move;
            self.is_moving = true;
            let direction = self.pending_move.normalize_or_zero();
            self.last_move_dir = direction;
            self.facing_angle = direction.y.atan2(direction.x).to_degrees().rem_euclid(360.0);
        } else {
            self.last_move_dir = Vec2::ZERO;
        }
    }

    fn animate(&mut self, dt: f32) {
        self.anim_timer += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;

    fn knight(id: &str, position: Vec2) -> Unit {
        let registry = CardRegistry::standard();
        Unit::spawn(
            id.into(),
            Team::Player,
            position,
            UnitKind::Knight,
            registry.unit(UnitKind::Knight),
            &SimulationConfig::default(),
        )
    }

    #[test]
    fn spawn_derives_stats() {
        let unit = knight("k", Vec2::new(200.0, 400.0));
        assert_eq!(unit.radius(), 12.0);
        assert_eq!(unit.sight_range, 250.0);
        assert!((unit.attack.cooldown - 1.0 / 1.2).abs() < 1e-6);
        assert!(!unit.is_deploying());
    }

    #[test]
    fn attack_locks_target_and_resets_cooldown() {
        let config = SimulationConfig::default();
        let mut unit = knight("k", Vec2::ZERO);
        unit.stage(Intent::Unit(UnitIntent {
            target: Some("victim".into()),
            attack: true,
            ..UnitIntent::default()
        }));

        let mut effects = Vec::new();
        unit.apply(&ApplyContext { config: &config, dt: 0.1 }, &mut effects);

        assert!(unit.locked_target);
        assert_eq!(unit.attack.last_attack_time, 0.0);
        assert!(matches!(
            &effects[0],
            Effect::Damage { target, amount } if target.as_str() == "victim" && *amount == 100.0
        ));
    }

    #[test]
    fn deploying_unit_does_nothing_until_ready() {
        let config = SimulationConfig {
            deploy_time: 0.05,
            ..SimulationConfig::default()
        };
        let registry = CardRegistry::standard();
        let mut unit = Unit::spawn(
            "g".into(),
            Team::Enemy,
            Vec2::ZERO,
            UnitKind::Goblin,
            registry.unit(UnitKind::Goblin),
            &config,
        );
        unit.pending_move = Vec2::new(5.0, 0.0);

        let mut effects = Vec::new();
        let ctx = ApplyContext { config: &config, dt: 0.03 };
        unit.apply(&ctx, &mut effects);
        assert!(unit.is_deploying());
        unit.apply(&ctx, &mut effects);
        assert!(!unit.is_deploying());
        assert_eq!(unit.position(), Vec2::ZERO);
    }
}
