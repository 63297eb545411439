use crate::cards::ProjectileKind;
use crate::entity::{Attack, Body, Effect, Entity, NetworkId, Projectile};
use crate::event::BattleEvent;
use crate::simulation::SimulationConfig;

/// Resolves one attack. Melee hits land immediately; anything with a
/// longer reach fires a projectile that deals the damage on arrival.
pub fn strike(
    attacker: &Body,
    attack: &Attack,
    projectile: ProjectileKind,
    shots_fired: &mut u32,
    target: NetworkId,
    config: &SimulationConfig,
    effects: &mut Vec<Effect>,
) {
    if attack.range < config.melee_range_threshold {
        effects.push(Effect::Damage {
            target: target.clone(),
            amount: attack.damage,
        });
        effects.push(Effect::Event(BattleEvent::MeleeHit {
            attacker: attacker.id.clone(),
            target,
            position: attacker.position,
        }));
        return;
    }

    let id = attacker.id.child(*shots_fired);
    *shots_fired += 1;
    effects.push(Effect::Event(BattleEvent::ProjectileLaunched {
        id: id.clone(),
        source: attacker.id.clone(),
        target: target.clone(),
    }));
    effects.push(Effect::Spawn(Box::new(Entity::Projectile(Projectile::launch(
        id,
        attacker.id.clone(),
        attacker.team,
        attacker.position,
        target,
        attack.damage,
        projectile,
    )))));
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::entity::{Hitbox, Team};

    fn body() -> Body {
        Body::new("m".into(), Team::Player, Vec2::ZERO, Hitbox::circle(24.0), 600.0)
    }

    #[test]
    fn ranged_attack_spawns_numbered_projectiles() {
        let config = SimulationConfig::default();
        let attack = Attack::new(120.0, 144.0, 0.9);
        let mut shots = 0;
        let mut effects = Vec::new();

        strike(&body(), &attack, ProjectileKind::Basic, &mut shots, "t".into(), &config, &mut effects);
        strike(&body(), &attack, ProjectileKind::Basic, &mut shots, "t".into(), &config, &mut effects);

        let spawned: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Spawn(entity) => Some(entity.id().as_str().to_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec!["m#0", "m#1"]);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Damage { .. })));
    }

    #[test]
    fn melee_attack_damages_directly() {
        let config = SimulationConfig::default();
        let attack = Attack::new(400.0, 9.6, 1.0 / 1.8);
        let mut shots = 0;
        let mut effects = Vec::new();

        strike(&body(), &attack, ProjectileKind::Basic, &mut shots, "t".into(), &config, &mut effects);

        assert_eq!(shots, 0);
        assert!(matches!(effects[0], Effect::Damage { amount, .. } if amount == 400.0));
    }
}
