use glam::Vec2;

use crate::cards::{SpellKind, SpellStats};
use crate::event::BattleEvent;

use super::{ApplyContext, Effect, Intent, Lifecycle, NetworkId, Team, ThinkContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpellPhase {
    Flying {
        origin: Vec2,
        elapsed: f32,
        flight_time: f32,
    },
    Active {
        elapsed: f32,
    },
    Dead,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpellIntent {
    /// Enemies inside the blast radius right now.
    pub victims: Vec<NetworkId>,
}

/// Area effect. Deals its damage exactly once, then lingers until its
/// duration has run out.
#[derive(Debug, Clone)]
pub struct Spell {
    pub id: NetworkId,
    pub team: Team,
    pub kind: SpellKind,
    pub target: Vec2,
    pub position: Vec2,
    pub damage: f32,
    pub radius: f32,
    pub delay: f32,
    pub duration: f32,
    pub phase: SpellPhase,
    pub has_dealt_damage: bool,
    pending_victims: Vec<NetworkId>,
}

impl Spell {
    /// `origin` is where a travelling spell starts from, usually the
    /// caster's king tower. Spells without a flight speed land instantly.
    pub fn cast(
        id: NetworkId,
        team: Team,
        kind: SpellKind,
        stats: &SpellStats,
        target: Vec2,
        origin: Option<Vec2>,
    ) -> Self {
        let (phase, position) = match (stats.flight_speed, origin) {
            (Some(speed), Some(origin)) if speed > 0.0 => (
                SpellPhase::Flying {
                    origin,
                    elapsed: 0.0,
                    flight_time: origin.distance(target) / speed,
                },
                origin,
            ),
            _ => (SpellPhase::Active { elapsed: 0.0 }, target),
        };
        Self {
            id,
            team,
            kind,
            target,
            position,
            damage: stats.damage,
            radius: stats.radius,
            delay: stats.delay,
            duration: stats.duration,
            phase,
            has_dealt_damage: false,
            pending_victims: Vec::new(),
        }
    }

    fn deal_damage(&mut self, effects: &mut Vec<Effect>) {
        if self.has_dealt_damage {
            return;
        }
        self.has_dealt_damage = true;
        for target in &self.pending_victims {
            effects.push(Effect::Damage {
                target: target.clone(),
                amount: self.damage,
            });
        }
        effects.push(Effect::Event(BattleEvent::SpellImpact {
            id: self.id.clone(),
            position: self.target,
            hits: self.pending_victims.len(),
        }));
    }
}

impl Lifecycle for Spell {
    fn prepare(&mut self) {
        self.pending_victims.clear();
    }

    fn think(&self, ctx: &ThinkContext<'_>) -> Intent {
        if self.phase == SpellPhase::Dead || self.has_dealt_damage {
            return Intent::Spell(SpellIntent::default());
        }
        let victims = ctx
            .world
            .entities()
            .filter(|e| e.is_targetable() && e.team() != self.team)
            .filter(|e| e.position().distance(self.target) <= self.radius)
            .map(|e| e.id().clone())
            .collect();
        Intent::Spell(SpellIntent { victims })
    }

    fn stage(&mut self, intent: Intent) {
        if let Intent::Spell(intent) = intent {
            self.pending_victims = intent.victims;
        }
    }

    fn apply(&mut self, ctx: &ApplyContext<'_>, effects: &mut Vec<Effect>) {
        match self.phase {
            SpellPhase::Flying {
                origin,
                elapsed,
                flight_time,
            } => {
                let elapsed = elapsed + ctx.dt;
                let progress = if flight_time > 0.0 {
                    (elapsed / flight_time).min(1.0)
                } else {
                    1.0
                };
                if progress >= 1.0 {
                    self.position = self.target;
                    self.phase = SpellPhase::Active { elapsed: 0.0 };
                    self.deal_damage(effects);
                } else {
                    self.position = origin.lerp(self.target, progress);
                    self.phase = SpellPhase::Flying {
                        origin,
                        elapsed,
                        flight_time,
                    };
                }
            }
            SpellPhase::Active { elapsed } => {
                if elapsed >= self.delay {
                    self.deal_damage(effects);
                }
                let elapsed = elapsed + ctx.dt;
                self.phase = if elapsed >= self.duration && self.has_dealt_damage {
                    SpellPhase::Dead
                } else {
                    SpellPhase::Active { elapsed }
                };
            }
            SpellPhase::Dead => {}
        }
    }

    fn animate(&mut self, _dt: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRegistry;
    use crate::simulation::SimulationConfig;

    fn damage_count(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Damage { .. }))
            .count()
    }

    fn run(spell: &mut Spell, ticks: usize, victims: &[&str]) -> Vec<Effect> {
        let config = SimulationConfig::default();
        let ctx = ApplyContext { config: &config, dt: 1.0 / 60.0 };
        let mut effects = Vec::new();
        for _ in 0..ticks {
            spell.prepare();
            spell.stage(Intent::Spell(SpellIntent {
                victims: victims.iter().map(|v| NetworkId::new(*v)).collect(),
            }));
            spell.apply(&ctx, &mut effects);
        }
        effects
    }

    #[test]
    fn zap_strikes_on_first_tick_only() {
        let registry = CardRegistry::standard();
        let mut zap = Spell::cast(
            "z".into(),
            Team::Player,
            SpellKind::Zap,
            registry.spell(SpellKind::Zap),
            Vec2::new(240.0, 200.0),
            None,
        );
        let effects = run(&mut zap, 1, &["a", "b"]);
        assert_eq!(damage_count(&effects), 2);

        let effects = run(&mut zap, 30, &["a", "b"]);
        assert_eq!(damage_count(&effects), 0);
        assert_eq!(zap.phase, SpellPhase::Dead);
    }

    #[test]
    fn arrows_wait_for_delay() {
        let registry = CardRegistry::standard();
        let mut arrows = Spell::cast(
            "a".into(),
            Team::Enemy,
            SpellKind::Arrows,
            registry.spell(SpellKind::Arrows),
            Vec2::new(240.0, 500.0),
            None,
        );
        assert_eq!(damage_count(&run(&mut arrows, 6, &["x"])), 0);
        assert_eq!(damage_count(&run(&mut arrows, 60, &["x"])), 1);
    }

    #[test]
    fn fireball_flies_then_explodes_once() {
        let registry = CardRegistry::standard();
        let mut fireball = Spell::cast(
            "f".into(),
            Team::Player,
            SpellKind::Fireball,
            registry.spell(SpellKind::Fireball),
            Vec2::new(240.0, 178.0),
            Some(Vec2::new(240.0, 578.0)),
        );
        assert!(matches!(fireball.phase, SpellPhase::Flying { .. }));

        let effects = run(&mut fireball, 120, &["x"]);
        assert_eq!(damage_count(&effects), 1);
        assert_eq!(fireball.position, Vec2::new(240.0, 178.0));
        assert_eq!(fireball.phase, SpellPhase::Dead);
    }
}
